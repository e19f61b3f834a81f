//! VISAGE Test Harness - lip-sync simulation and validation
//!
//! This crate provides:
//! - Recording render sink and scripted audio player
//! - Payload builders for backend messages
//! - Frame-stepped scenario runner with display refresh jitter
//! - End-to-end lip-sync scenarios (tests/)

pub mod payload;
pub mod recorder;
pub mod scenario;

pub use payload::*;
pub use recorder::*;
pub use scenario::*;
