//! VISAGE Timeline - viseme intervals and resolution
//!
//! A timeline is the precomputed list of mouth shapes that accompanies a
//! spoken response. The resolver maps a playback position onto it without
//! keeping any state, so it can be sampled at any rate and in any order.

pub mod timeline;
pub mod resolver;

pub use timeline::*;
pub use resolver::*;
