//! # Rendering Module
//!
//! Text output of generated levels for terminals and logs.

pub mod display;

pub use display::*;
