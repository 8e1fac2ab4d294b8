//! # Encounter Generation
//!
//! Enemy spawn placement. Bigger rooms draw more enemies; the start room
//! stays empty so the player never spawns next to one.

use crate::{
    CryptResult, GenerationConfig, LevelPlan, RoomIndex, TileIndex, TileMap, WeightedSampler,
};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Where one enemy appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub tile: TileIndex,
    pub room: RoomIndex,
}

/// Enemy spawns of one level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounters {
    pub enemies: Vec<EnemySpawn>,
}

impl Encounters {
    pub fn has_enemy(&self, tile: TileIndex) -> bool {
        self.enemies.iter().any(|enemy| enemy.tile == tile)
    }
}

/// Chooses enemy spawn tiles, rooms weighted by floor area.
#[derive(Debug, Clone)]
pub struct EncounterPlacer {
    pub enemy_count: u32,
}

impl EncounterPlacer {
    pub fn new(enemy_count: u32) -> Self {
        Self { enemy_count }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.enemy_count)
    }

    /// Places up to `enemy_count` enemies on distinct floor tiles.
    ///
    /// The start room is never chosen and the exit tile is never used. A
    /// draw that lands in a room with no free tile left is skipped, so the
    /// result can hold fewer spawns than requested.
    pub fn place<R: Rng + ?Sized>(
        &self,
        map: &TileMap,
        plan: &LevelPlan,
        rng: &mut R,
    ) -> CryptResult<Encounters> {
        let mut encounters = Encounters::default();
        if self.enemy_count == 0 {
            return Ok(encounters);
        }

        let sampler: WeightedSampler<RoomIndex> = map
            .rooms()
            .iter()
            .filter(|room| room.index() != plan.start_room)
            .map(|room| (room.floor_rect().area() as i64, room.index()))
            .collect();

        let mut taken: HashSet<TileIndex> = HashSet::new();
        taken.insert(plan.end_tile);

        for _ in 0..self.enemy_count {
            let room = *sampler.sample(rng)?;
            let free: Vec<TileIndex> = map
                .floor_tiles(room)
                .into_iter()
                .filter(|tile| !taken.contains(tile))
                .collect();

            let Some(&tile) = free.choose(rng) else {
                debug!("Room {} has no free floor for another enemy", room);
                continue;
            };

            taken.insert(tile);
            encounters.enemies.push(EnemySpawn { tile, room });
        }

        debug!(
            "Placed {} of {} enemies",
            encounters.enemies.len(),
            self.enemy_count
        );
        Ok(encounters)
    }
}
