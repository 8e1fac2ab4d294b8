//! # World Generation
//!
//! Runs the whole pipeline for one level: layout, validation, level
//! planning, torches and enemies, all drawing from a single seeded RNG.

use crate::{
    create_rng, CryptResult, Decor, EncounterPlacer, Encounters, GenerationConfig, Generator,
    LevelPlan, LevelPlanner, Position, RoomCorridorGenerator, TileMap, TorchPlacer,
};
use log::info;
use serde::{Deserialize, Serialize};

/// A fully generated dungeon level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonLevel {
    /// Seed the level was generated from, after resolving a clock seed
    pub seed: u64,
    pub tile_map: TileMap,
    pub plan: LevelPlan,
    pub decor: Decor,
    pub encounters: Encounters,
}

impl DungeonLevel {
    fn position_of(&self, index: usize) -> Option<Position> {
        self.tile_map.tile(index).map(|tile| tile.position())
    }

    pub fn entrance_position(&self) -> Option<Position> {
        self.position_of(self.plan.start_tile)
    }

    pub fn exit_position(&self) -> Option<Position> {
        self.position_of(self.plan.end_tile)
    }

    pub fn spawn_position(&self) -> Option<Position> {
        self.position_of(self.plan.spawn_tile)
    }

    pub fn to_json_string(&self) -> CryptResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Produces [`DungeonLevel`]s from a [`GenerationConfig`].
#[derive(Debug, Clone, Default)]
pub struct WorldGenerator {
    layout: RoomCorridorGenerator,
}

impl WorldGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: RoomCorridorGenerator) -> Self {
        Self { layout }
    }

    /// Generates one level.
    ///
    /// The same configuration with a non-zero seed always yields the same
    /// level.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptgen::{GenerationConfig, WorldGenerator};
    ///
    /// let config = GenerationConfig::for_testing(42);
    /// let level = WorldGenerator::new().generate(&config).unwrap();
    ///
    /// assert_eq!(level.seed, 42);
    /// assert_eq!(level.tile_map.rooms().len(), 5);
    /// assert_ne!(level.plan.start_room, level.plan.end_room);
    /// assert_eq!(level, WorldGenerator::new().generate(&config).unwrap());
    /// ```
    pub fn generate(&self, config: &GenerationConfig) -> CryptResult<DungeonLevel> {
        config.validate()?;

        let seed = config.resolved_seed();
        let mut rng = create_rng(seed);
        info!(
            "Generating level with seed {} ({} rooms, sizes {}..={})",
            seed, config.room_count, config.min_room_size, config.max_room_size
        );

        let mut tile_map = self.layout.generate(config, &mut rng)?;
        self.layout.validate(&tile_map, config)?;

        let plan = LevelPlanner::from_config(config).plan(&mut tile_map, &mut rng)?;
        let decor = TorchPlacer::from_config(config).place(&tile_map, &mut rng)?;
        let encounters = EncounterPlacer::from_config(config).place(&tile_map, &plan, &mut rng)?;

        info!(
            "Level ready: {}x{} tiles, {} corridors, {} torches, {} enemies",
            tile_map.width(),
            tile_map.height(),
            tile_map.corridors().len(),
            decor.torches.len(),
            encounters.enemies.len()
        );

        Ok(DungeonLevel {
            seed,
            tile_map,
            plan,
            decor,
            encounters,
        })
    }
}
