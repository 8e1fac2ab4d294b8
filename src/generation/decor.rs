//! # Decor Placement
//!
//! Picks wall tiles that carry torches. Only the tile and the direction the
//! torch faces are produced; turning them into scene objects is left to the
//! consumer.

use crate::{
    CryptResult, Direction, GenerationConfig, RoomIndex, TileIndex, TileMap, WeightedSampler,
};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A torch mounted on a room wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Torch {
    pub tile: TileIndex,
    pub room: RoomIndex,
    /// Direction the torch faces, pointing into the room
    pub facing: Direction,
}

/// Decorations of one level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decor {
    pub torches: Vec<Torch>,
}

impl Decor {
    pub fn has_torch(&self, tile: TileIndex) -> bool {
        self.torches.iter().any(|torch| torch.tile == tile)
    }
}

/// Consecutive non-door tiles of one wall face.
#[derive(Debug, Clone)]
struct WallRun {
    facing: Direction,
    tiles: Vec<TileIndex>,
}

/// Places torches along room walls, roughly one per `spacing` wall tiles.
#[derive(Debug, Clone)]
pub struct TorchPlacer {
    pub spacing: u32,
}

impl TorchPlacer {
    pub fn new(spacing: u32) -> Self {
        Self {
            spacing: spacing.max(1),
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.torch_spacing)
    }

    /// Places torches in every room of `map`.
    ///
    /// Must run after the entrance is registered, so the entrance is skipped
    /// like any other door.
    pub fn place<R: Rng + ?Sized>(&self, map: &TileMap, rng: &mut R) -> CryptResult<Decor> {
        let mut decor = Decor::default();

        for room in map.rooms() {
            let torches = self.place_in_room(map, room.index(), rng)?;
            debug!("Room {}: {} torches", room.index(), torches.len());
            decor.torches.extend(torches);
        }

        Ok(decor)
    }

    fn place_in_room<R: Rng + ?Sized>(
        &self,
        map: &TileMap,
        room: RoomIndex,
        rng: &mut R,
    ) -> CryptResult<Vec<Torch>> {
        let mut runs = wall_runs(map, room);
        let wall_tiles: usize = runs.iter().map(|run| run.tiles.len()).sum();
        if wall_tiles == 0 {
            return Ok(Vec::new());
        }

        let wanted = wall_tiles / self.spacing as usize + 1;
        let mut torches = Vec::with_capacity(wanted);

        while torches.len() < wanted {
            let sampler: WeightedSampler<usize> = runs
                .iter()
                .enumerate()
                .map(|(index, run)| (run.tiles.len() as i64, index))
                .collect();
            if sampler.is_empty() {
                break;
            }

            let run_index = *sampler.sample(rng)?;
            let run = runs.swap_remove(run_index);
            let at = rng.gen_range(0..run.tiles.len());

            torches.push(Torch {
                tile: run.tiles[at],
                room,
                facing: run.facing.opposite(),
            });

            // The chosen tile and its neighbours along the wall are used up.
            let before = &run.tiles[..at.saturating_sub(1)];
            let after = run.tiles.get(at + 2..).unwrap_or(&[]);
            for part in [before, after] {
                if !part.is_empty() {
                    runs.push(WallRun {
                        facing: run.facing,
                        tiles: part.to_vec(),
                    });
                }
            }
        }

        Ok(torches)
    }
}

/// Splits each wall face of `room` at its doors.
fn wall_runs(map: &TileMap, room: RoomIndex) -> Vec<WallRun> {
    let Some(room_ref) = map.room(room) else {
        return Vec::new();
    };

    let mut runs = Vec::new();
    for facing in Direction::ALL {
        let mut current = Vec::new();
        for index in room_ref
            .face(facing)
            .into_iter()
            .filter_map(|pos| map.index_of(pos))
        {
            if room_ref.has_door(index) {
                if !current.is_empty() {
                    runs.push(WallRun {
                        facing,
                        tiles: std::mem::take(&mut current),
                    });
                }
            } else {
                current.push(index);
            }
        }
        if !current.is_empty() {
            runs.push(WallRun {
                facing,
                tiles: current,
            });
        }
    }

    runs
}
