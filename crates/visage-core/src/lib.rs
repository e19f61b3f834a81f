//! VISAGE Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout the avatar engine:
//! - Identifiers (Generation, VisemeId, EmotionId, AssetId)
//! - Time primitives (MediaTime, FrameTime)
//! - Inbound/outbound payloads
//! - Error taxonomy

pub mod id;
pub mod time;
pub mod payload;
pub mod error;

pub use id::*;
pub use time::*;
pub use payload::*;
pub use error::*;
