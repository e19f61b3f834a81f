//! VISAGE Time - playback clocks and frame pacing
//!
//! This crate implements the clock side of lip-sync:
//! - Media clock: position written by the audio collaborator
//! - Simulated clock: wall time since a synthetic start, for text-only replies
//! - Frame throttle: caps visual updates to a target rate by elapsed wall time

pub mod clock;
pub mod throttle;

pub use clock::*;
pub use throttle::*;
