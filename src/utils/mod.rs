//! # Utilities Module
//!
//! Grid geometry, weighted sampling, and tile pathfinding.

pub mod math;
pub mod pathfinding;
pub mod sampler;

pub use math::*;
pub use self::pathfinding::*;
pub use sampler::*;
