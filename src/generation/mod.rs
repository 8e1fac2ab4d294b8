//! # Generation Module
//!
//! Procedural construction of a dungeon level: the tile map, its room and
//! corridor layout, the level plan (entrance, exit, locked room), and the
//! data-only decoration and encounter placement that scene code consumes.

pub mod decor;
pub mod dungeon;
pub mod encounters;
pub mod level;
pub mod tilemap;
pub mod world;

pub use decor::*;
pub use dungeon::*;
pub use encounters::*;
pub use level::*;
pub use tilemap::*;
pub use world::*;

use crate::{config, CryptError, CryptResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Configuration for procedural generation.
///
/// Room sizes are floor interior sizes; every room rectangle adds a one-tile
/// wall ring around them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed; 0 means "derive one from the clock".
    pub seed: u64,
    /// Number of rooms to place
    pub room_count: u32,
    /// Minimum floor width/height of a room
    pub min_room_size: u32,
    /// Maximum floor width/height of a room
    pub max_room_size: u32,
    /// Probability (0.0 to 1.0) that a room gets one extra loop-forming corridor
    pub extra_connection_chance: f64,
    /// Longest tile journey from exit to entrance before the entrance is moved closer
    pub max_journey_tiles: usize,
    /// Whether to pick a locked room
    pub lock_room: bool,
    /// Number of enemy spawn tiles
    pub enemy_count: u32,
    /// Wall tiles per torch along room faces
    pub torch_spacing: u32,
}

impl GenerationConfig {
    /// Creates a default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptgen::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert!(config.max_room_size >= config.min_room_size);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            room_count: 10,
            min_room_size: 3,
            max_room_size: 7,
            extra_connection_chance: 0.15,
            max_journey_tiles: config::MAX_JOURNEY_TILES,
            lock_room: true,
            enemy_count: 9,
            torch_spacing: 3,
        }
    }

    /// Creates a configuration for testing with smaller, simpler levels.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            room_count: 5,
            min_room_size: 3,
            max_room_size: 5,
            extra_connection_chance: 0.0,
            max_journey_tiles: config::MAX_JOURNEY_TILES,
            lock_room: true,
            enemy_count: 2,
            torch_spacing: 3,
        }
    }

    /// Rejects configurations generation cannot honour. Nothing is clamped.
    pub fn validate(&self) -> CryptResult<()> {
        if self.room_count < 1 {
            return Err(CryptError::InvalidConfiguration(
                "room_count must be at least 1".to_string(),
            ));
        }

        if self.room_count > config::MAX_ROOM_COUNT {
            return Err(CryptError::InvalidConfiguration(format!(
                "room_count {} exceeds {}",
                self.room_count,
                config::MAX_ROOM_COUNT
            )));
        }

        if self.min_room_size == 0 {
            return Err(CryptError::InvalidConfiguration(
                "min_room_size must be positive".to_string(),
            ));
        }

        if self.min_room_size > self.max_room_size {
            return Err(CryptError::InvalidConfiguration(format!(
                "min_room_size {} exceeds max_room_size {}",
                self.min_room_size, self.max_room_size
            )));
        }

        if self.max_room_size > config::MAX_ROOM_SIZE {
            return Err(CryptError::InvalidConfiguration(format!(
                "max_room_size {} exceeds {}",
                self.max_room_size,
                config::MAX_ROOM_SIZE
            )));
        }

        if !(0.0..=1.0).contains(&self.extra_connection_chance) {
            return Err(CryptError::InvalidConfiguration(format!(
                "extra_connection_chance {} is outside [0, 1]",
                self.extra_connection_chance
            )));
        }

        if self.max_journey_tiles == 0 {
            return Err(CryptError::InvalidConfiguration(
                "max_journey_tiles must be positive".to_string(),
            ));
        }

        if self.torch_spacing == 0 {
            return Err(CryptError::InvalidConfiguration(
                "torch_spacing must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// The configured seed, or a clock-derived one when it is 0.
    pub fn resolved_seed(&self) -> u64 {
        if self.seed != 0 {
            return self.seed;
        }

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(1)
            .max(1)
    }

    pub fn from_json_str(json: &str) -> CryptResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration file; missing fields take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> CryptResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> CryptResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for procedural generators.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> CryptResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> CryptResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Creates the generator RNG for an already resolved seed.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
