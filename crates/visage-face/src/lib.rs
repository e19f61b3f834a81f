//! VISAGE Face - the avatar's visible state
//!
//! The face is four image layers painted in a fixed order:
//!
//! - base: static head
//! - emotion: current expression, faded in on change
//! - viseme: current mouth shape, always above the expression
//! - blink: transient eyelid pulse, always on top
//!
//! Layers mutate independently. The idle motion generator produces one
//! shared transform that moves all four layers as a rigid unit.

pub mod asset;
pub mod blink;
pub mod compositor;
pub mod idle;
pub mod layer;

pub use asset::*;
pub use blink::*;
pub use compositor::*;
pub use idle::*;
pub use layer::*;
