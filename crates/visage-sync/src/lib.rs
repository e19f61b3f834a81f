//! VISAGE Sync - keeping the mouth on the audio
//!
//! - Session manager: one current playback session, invalidated by
//!   generation when a newer response arrives
//! - Sync scheduler: per-frame state machine that samples the session clock,
//!   throttles to a visual rate, resolves the timeline and emits at most one
//!   mouth update per change
//!
//! Stale work is rejected by comparing generations at the top of every
//! tick; there is no other cancellation mechanism.

pub mod session;
pub mod scheduler;

pub use session::*;
pub use scheduler::*;
