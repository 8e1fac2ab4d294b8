//! # Level Planning
//!
//! Assigns gameplay roles to a generated [`TileMap`]: which room the player
//! enters, which room holds the exit, where exactly the entrance and exit
//! tiles are, and optionally which room is locked behind a key.

use crate::{
    CryptError, CryptResult, Direction, GenerationConfig, RoomIndex, TileIndex, TileMap,
};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Room paths for every ordered pair of distinct rooms.
///
/// Iteration is in `(from, to)` key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomPathTable {
    paths: BTreeMap<(RoomIndex, RoomIndex), Vec<RoomIndex>>,
}

impl RoomPathTable {
    /// Computes both directions for every room pair.
    pub fn build(map: &TileMap) -> Self {
        let mut paths = BTreeMap::new();
        let room_count = map.rooms().len();

        for from in 0..room_count {
            for to in (from + 1)..room_count {
                paths.insert((from, to), map.find_room_path(from, to));
                paths.insert((to, from), map.find_room_path(to, from));
            }
        }

        Self { paths }
    }

    pub fn get(&self, from: RoomIndex, to: RoomIndex) -> Option<&[RoomIndex]> {
        self.paths.get(&(from, to)).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(RoomIndex, RoomIndex), &Vec<RoomIndex>)> {
        self.paths.iter()
    }

    /// The first path of maximal room count in iteration order.
    pub fn longest(&self) -> Option<&[RoomIndex]> {
        let mut longest: Option<&Vec<RoomIndex>> = None;
        for path in self.paths.values() {
            if path.len() > longest.map_or(0, Vec::len) {
                longest = Some(path);
            }
        }
        longest.map(Vec::as_slice)
    }

    /// Rooms with a non-empty path from `room`, `room` itself excluded.
    pub fn reachable_from(&self, room: RoomIndex) -> Vec<RoomIndex> {
        self.paths
            .iter()
            .filter(|((from, to), path)| *from == room && *to != room && !path.is_empty())
            .map(|((_, to), _)| *to)
            .collect()
    }
}

/// Roles assigned to a tile map by the [`LevelPlanner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelPlan {
    /// Room the player enters through
    pub start_room: RoomIndex,
    /// Room holding the exit
    pub end_room: RoomIndex,
    /// Entrance tile on the start room's wall ring
    pub start_tile: TileIndex,
    /// Exit tile inside the end room's floor
    pub end_tile: TileIndex,
    /// Floor tile just inside the entrance, where the player appears
    pub spawn_tile: TileIndex,
    /// Direction from the entrance into the room
    pub spawn_facing: Direction,
    /// Room whose doors stay shut until unlocked
    pub locked_room: Option<RoomIndex>,
    /// Tile length of the exit-to-entrance route measured before any bound
    pub critical_path_tiles: usize,
    /// Whether the journey bound moved the start room closer to the exit
    pub journey_bounded: bool,
}

/// Picks start/end rooms, entrance/exit tiles and the locked room.
#[derive(Debug, Clone)]
pub struct LevelPlanner {
    /// Longest tile journey from exit to entrance before the start room moves
    pub max_journey_tiles: usize,
    /// Whether to choose a locked room
    pub lock_room: bool,
}

impl LevelPlanner {
    pub fn new(max_journey_tiles: usize, lock_room: bool) -> Self {
        Self {
            max_journey_tiles,
            lock_room,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.max_journey_tiles, config.lock_room)
    }

    /// Plans the level and registers the entrance as a door of its room.
    ///
    /// Fails with [`CryptError::InsufficientTopology`] when fewer than two
    /// rooms exist or no two rooms are connected.
    pub fn plan<R: Rng + ?Sized>(&self, map: &mut TileMap, rng: &mut R) -> CryptResult<LevelPlan> {
        if map.rooms().len() < 2 {
            return Err(CryptError::InsufficientTopology(format!(
                "level planning needs at least 2 rooms, found {}",
                map.rooms().len()
            )));
        }

        let table = RoomPathTable::build(map);
        let (start_room, end_room) = self.select_endpoints(map, &table)?;
        let (start_room, critical_path_tiles, journey_bounded) =
            self.bound_journey(map, start_room, end_room, rng);

        let start_tile = choose_entrance(map, start_room, rng)?;
        map.add_door(start_room, start_tile);

        let (spawn_tile, spawn_facing) = spawn_point(map, start_room, start_tile)?;
        let end_tile = choose_exit(map, end_room, rng)?;

        let locked_room = if self.lock_room {
            choose_locked_room(&table, start_room, end_room, rng)
        } else {
            None
        };

        info!(
            "Planned level: start room {} (entrance tile {}), end room {} (exit tile {}), locked room {:?}",
            start_room, start_tile, end_room, end_tile, locked_room
        );

        Ok(LevelPlan {
            start_room,
            end_room,
            start_tile,
            end_tile,
            spawn_tile,
            spawn_facing,
            locked_room,
            critical_path_tiles,
            journey_bounded,
        })
    }

    /// Ends of the longest room path; the end with fewer doors becomes the start.
    fn select_endpoints(
        &self,
        map: &TileMap,
        table: &RoomPathTable,
    ) -> CryptResult<(RoomIndex, RoomIndex)> {
        let path = table
            .longest()
            .filter(|path| path.len() >= 2)
            .ok_or_else(|| {
                CryptError::InsufficientTopology("no two rooms are connected".to_string())
            })?;

        let (mut start, mut end) = (path[0], path[path.len() - 1]);
        let doors = |room: RoomIndex| map.room(room).map_or(0, |room| room.doors().len());
        if doors(start) > doors(end) {
            std::mem::swap(&mut start, &mut end);
        }

        debug!(
            "Longest room path {:?}: start room {}, end room {}",
            path, start, end
        );
        Ok((start, end))
    }

    /// Moves the start room closer when the exit-to-entrance walk is too long.
    ///
    /// Returns the (possibly new) start room, the measured tile length, and
    /// whether the bound was applied.
    fn bound_journey<R: Rng + ?Sized>(
        &self,
        map: &TileMap,
        start: RoomIndex,
        end: RoomIndex,
        rng: &mut R,
    ) -> (RoomIndex, usize, bool) {
        let center = |room: RoomIndex| {
            map.room(room)
                .and_then(|room| map.index_of(room.center()))
        };
        let (Some(start_center), Some(end_center)) = (center(start), center(end)) else {
            return (start, 0, false);
        };

        let path = map.find_tile_path(end_center, start_center, rng);
        if path.is_empty() {
            warn!("No tile route from room {} to room {}", end, start);
            return (start, 0, false);
        }

        if path.len() <= self.max_journey_tiles {
            return (start, path.len(), false);
        }

        let bounded = path[self.max_journey_tiles..]
            .iter()
            .filter_map(|&index| map.tile(index).and_then(|tile| tile.room()))
            .find(|&room| room != end)
            .unwrap_or(start);

        warn!(
            "Journey of {} tiles exceeds {}; start room {} -> {}",
            path.len(),
            self.max_journey_tiles,
            start,
            bounded
        );
        (bounded, path.len(), true)
    }
}

/// Chooses an entrance tile on the wall ring of `room`.
///
/// In order of preference: any tile of a face without doors; a tile on a
/// random face that is neither a door nor next to one; any non-door tile on
/// that face; any non-door tile on any face. Corners are never used.
pub fn choose_entrance<R: Rng + ?Sized>(
    map: &TileMap,
    room: RoomIndex,
    rng: &mut R,
) -> CryptResult<TileIndex> {
    let room_ref = map
        .room(room)
        .ok_or_else(|| CryptError::GenerationFailed(format!("unknown room {}", room)))?;

    let faces: Vec<Vec<TileIndex>> = [Direction::Top, Direction::Bottom, Direction::Left, Direction::Right]
        .into_iter()
        .map(|direction| {
            room_ref
                .face(direction)
                .into_iter()
                .filter_map(|pos| map.index_of(pos))
                .collect::<Vec<_>>()
        })
        .filter(|face: &Vec<TileIndex>| !face.is_empty())
        .collect();

    let open_faces: Vec<&Vec<TileIndex>> = faces
        .iter()
        .filter(|face| !face.iter().any(|&tile| room_ref.has_door(tile)))
        .collect();

    if let Some(face) = open_faces.choose(rng) {
        debug!(
            "Room {}: {} wall faces without doors",
            room,
            open_faces.len()
        );
        if let Some(&tile) = face.choose(rng) {
            return Ok(tile);
        }
    }

    let face = faces.choose(rng).ok_or_else(|| {
        CryptError::GenerationFailed(format!("room {} has no wall faces", room))
    })?;

    let isolated: Vec<TileIndex> = face
        .iter()
        .copied()
        .filter(|&tile| !room_ref.has_door(tile))
        .filter(|&tile| {
            map.tile(tile).map_or(true, |tile| {
                !tile
                    .neighbors()
                    .iter()
                    .flatten()
                    .any(|&next| room_ref.has_door(next))
            })
        })
        .collect();

    if let Some(&tile) = isolated.choose(rng) {
        debug!("Room {}: entrance placed away from existing doors", room);
        return Ok(tile);
    }

    let free: Vec<TileIndex> = face
        .iter()
        .copied()
        .filter(|&tile| !room_ref.has_door(tile))
        .collect();

    if let Some(&tile) = free.choose(rng) {
        warn!("Room {}: entrance placed next to an existing door", room);
        return Ok(tile);
    }

    let anywhere: Vec<TileIndex> = faces
        .iter()
        .flatten()
        .copied()
        .filter(|&tile| !room_ref.has_door(tile))
        .collect();

    if let Some(&tile) = anywhere.choose(rng) {
        warn!("Room {}: chosen face is all doors, entrance moved to another face", room);
        return Ok(tile);
    }

    Err(CryptError::GenerationFailed(format!(
        "every wall tile of room {} is already a door",
        room
    )))
}

/// Chooses a random floor tile strictly inside `room`.
pub fn choose_exit<R: Rng + ?Sized>(
    map: &TileMap,
    room: RoomIndex,
    rng: &mut R,
) -> CryptResult<TileIndex> {
    map.floor_tiles(room)
        .choose(rng)
        .copied()
        .ok_or_else(|| CryptError::GenerationFailed(format!("room {} has no floor", room)))
}

/// Picks a room reachable from `start`, other than `start` and `end`.
pub fn choose_locked_room<R: Rng + ?Sized>(
    table: &RoomPathTable,
    start: RoomIndex,
    end: RoomIndex,
    rng: &mut R,
) -> Option<RoomIndex> {
    let candidates: Vec<RoomIndex> = table
        .reachable_from(start)
        .into_iter()
        .filter(|&room| room != end)
        .collect();

    candidates.choose(rng).copied()
}

/// The floor tile one step inward from the entrance, and that direction.
fn spawn_point(
    map: &TileMap,
    room: RoomIndex,
    entrance: TileIndex,
) -> CryptResult<(TileIndex, Direction)> {
    let room_ref = map
        .room(room)
        .ok_or_else(|| CryptError::GenerationFailed(format!("unknown room {}", room)))?;
    let position = map
        .tile(entrance)
        .map(|tile| tile.position())
        .ok_or_else(|| CryptError::GenerationFailed(format!("unknown tile {}", entrance)))?;
    let face = room_ref.face_of(position).ok_or_else(|| {
        CryptError::GenerationFailed(format!("entrance {:?} is not on a wall face", position))
    })?;

    let inward = face.opposite();
    let spawn = map.index_of(position.step(inward)).ok_or_else(|| {
        CryptError::GenerationFailed(format!("entrance {:?} has no inner tile", position))
    })?;

    Ok((spawn, inward))
}
