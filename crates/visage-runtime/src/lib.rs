//! VISAGE Runtime - Engine orchestration and host loop
//!
//! The engine runs one frame at a time:
//! 1. Tick the sync scheduler (generation check, completion, throttle)
//! 2. Apply the mouth update, if any
//! 3. Advance idle motion, trigger a due blink
//! 4. Advance fades and the blink pulse
//! 5. Composite and push layers to the render sink
//!
//! Inbound payloads and audio callbacks are handled between frames. The
//! tokio driver multiplexes both on a single task.

pub mod audio;
pub mod config;
pub mod driver;
pub mod engine;
pub mod log;
pub mod telemetry;

pub use audio::*;
pub use config::*;
pub use driver::*;
pub use engine::*;
pub use log::*;
pub use telemetry::*;
