//! # Cryptgen
//!
//! Procedural dungeon topology: room-and-corridor layouts on a tile grid,
//! tile and room pathfinding, and level planning on top of them.
//!
//! ## Architecture Overview
//!
//! The crate is data only. It produces a level description that scene or
//! game code turns into geometry and behaviour:
//!
//! - **Grid Model**: [`TileMap`] owns tiles, rooms and corridors in an index arena
//! - **Layout Generation**: [`RoomCorridorGenerator`] places rooms and carves corridors
//! - **Pathfinding**: [`AStarPathFinder`] over any [`PathGrid`], breadth-first room paths
//! - **Level Planning**: [`LevelPlanner`] picks entrance, exit and locked room
//! - **Placement**: torches and enemy spawns chosen with a [`WeightedSampler`]
//! - **Rendering**: [`AsciiRenderer`] draws a text minimap for inspection
//!
//! Every random choice draws from an explicit RNG seeded by
//! [`GenerationConfig::seed`], so a seed always reproduces its level.

pub mod generation;
pub mod rendering;
pub mod utils;

pub use generation::*;
pub use rendering::*;
pub use utils::*;

/// Core error type for dungeon generation.
#[derive(thiserror::Error, Debug)]
pub enum CryptError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration cannot be generated from
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Too few connected rooms to plan a level
    #[error("Insufficient topology: {0}")]
    InsufficientTopology(String),

    /// Random choice from an empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the crate.
pub type CryptResult<T> = Result<T, CryptError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generation constants.
pub mod config {
    /// Longest exit-to-entrance tile journey before the start room moves closer
    pub const MAX_JOURNEY_TILES: usize = 50;

    /// Empty tiles between neighbouring room slots in the layout grid
    pub const ROOM_GAP: u32 = 3;

    /// Cost of carving a corridor through untouched ground
    pub const FRESH_GROUND_COST: u32 = 2;

    /// Largest room floor size a configuration may ask for
    pub const MAX_ROOM_SIZE: u32 = 256;

    /// Largest number of rooms a configuration may ask for
    pub const MAX_ROOM_COUNT: u32 = 1024;
}
