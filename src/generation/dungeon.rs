//! # Dungeon Generation
//!
//! Room-and-corridor layout generation.
//!
//! Rooms are dropped into a shuffled grid of slots, each slot wide enough for
//! the largest room plus a gap, so rectangles never overlap and their wall
//! rings never touch. Rooms are then linked: every room to its nearest
//! neighbour, then the nearest pair across disconnected components until one
//! component remains, then optional extra loops. Each link is carved with the
//! tile pathfinder through the empty ground between rooms, which prefers
//! reusing corridor floor over breaking new ground. A route that would lay new
//! floor beside old floor closely enough to fill a 2x2 block is searched again
//! with the offending ground blocked, so corridors stay one tile wide.

use crate::{
    config, AStarPathFinder, CryptError, CryptResult, Direction, GenerationConfig, Generator,
    PathGrid, Position, Rect, Room, RoomIndex, TileIndex, TileKind, TileMap,
};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Primary dungeon generator using the room-and-corridor algorithm.
#[derive(Debug, Clone)]
pub struct RoomCorridorGenerator {
    /// Empty tiles kept between room slots and around the map edge
    pub room_gap: u32,
    /// Carving cost of untouched ground; existing corridor floor costs 1
    pub fresh_ground_cost: u32,
}

impl RoomCorridorGenerator {
    /// Creates a new dungeon generator with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptgen::RoomCorridorGenerator;
    ///
    /// let generator = RoomCorridorGenerator::new();
    /// assert!(generator.room_gap >= 1);
    /// ```
    pub fn new() -> Self {
        Self {
            room_gap: config::ROOM_GAP,
            fresh_ground_cost: config::FRESH_GROUND_COST,
        }
    }

    /// Places room rectangles and returns them with the grid size that holds them.
    fn layout_rooms(
        &self,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> (usize, usize, Vec<Rect>) {
        let room_count = config.room_count as usize;
        let cols = (room_count as f64).sqrt().ceil() as usize;
        let rows = room_count.div_ceil(cols);

        let gap = self.room_gap as i32;
        let slot = config.max_room_size as i32 + 2;
        let cell = slot + gap;
        let width = gap + cols as i32 * cell;
        let height = gap + rows as i32 * cell;

        let mut cells: Vec<usize> = (0..cols * rows).collect();
        cells.shuffle(rng);

        let rects = cells
            .into_iter()
            .take(room_count)
            .map(|cell_index| {
                let room_width = rng.gen_range(config.min_room_size..=config.max_room_size) as i32 + 2;
                let room_height =
                    rng.gen_range(config.min_room_size..=config.max_room_size) as i32 + 2;

                let slot_x = gap + (cell_index % cols) as i32 * cell;
                let slot_y = gap + (cell_index / cols) as i32 * cell;
                let x = slot_x + rng.gen_range(0..=slot - room_width);
                let y = slot_y + rng.gen_range(0..=slot - room_height);

                Rect::new(x, y, room_width, room_height)
            })
            .collect();

        (width as usize, height as usize, rects)
    }

    /// Chooses which room pairs get a corridor, in carving order.
    fn plan_connections(
        &self,
        centers: &[Position],
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> Vec<(RoomIndex, RoomIndex)> {
        let mut links: Vec<(RoomIndex, RoomIndex)> = Vec::new();
        let mut components = Components::new(centers.len());
        let linked = |links: &[(RoomIndex, RoomIndex)], a: RoomIndex, b: RoomIndex| {
            links
                .iter()
                .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
        };

        // Every room reaches for its nearest neighbour.
        for room in 0..centers.len() {
            if let Some(nearest) = nearest_room(centers, room, |_| true) {
                if !linked(&links, room, nearest) {
                    links.push((room, nearest));
                    components.union(room, nearest);
                }
            }
        }

        // Bridge the closest pair of separate components until one remains.
        while components.count() > 1 {
            let mut best: Option<(u32, RoomIndex, RoomIndex)> = None;
            for a in 0..centers.len() {
                for b in (a + 1)..centers.len() {
                    if components.find(a) == components.find(b) {
                        continue;
                    }
                    let candidate = (centers[a].manhattan_distance(centers[b]), a, b);
                    if best.map_or(true, |current| candidate < current) {
                        best = Some(candidate);
                    }
                }
            }

            let Some((_, a, b)) = best else {
                break;
            };
            debug!("Bridging components with corridor {} -> {}", a, b);
            links.push((a, b));
            components.union(a, b);
        }

        if config.extra_connection_chance > 0.0 {
            for room in 0..centers.len() {
                if !rng.gen_bool(config.extra_connection_chance) {
                    continue;
                }
                let unlinked = nearest_room(centers, room, |other| !linked(&links, room, other));
                if let Some(other) = unlinked {
                    debug!("Adding loop corridor {} -> {}", room, other);
                    links.push((room, other));
                }
            }
        }

        links
    }

    /// Carves one corridor from a door on `from` to a door on `to`.
    fn carve_corridor(
        &self,
        map: &mut TileMap,
        from: RoomIndex,
        to: RoomIndex,
        rng: &mut StdRng,
    ) -> CryptResult<()> {
        let (Some(room_from), Some(room_to)) = (map.room(from), map.room(to)) else {
            return Err(CryptError::GenerationFailed(format!(
                "corridor between unknown rooms {} and {}",
                from, to
            )));
        };

        let (door_from, face_from) = choose_door(map, room_from, room_to.center(), rng)?;
        let (door_to, face_to) = choose_door(map, room_to, room_from.center(), rng)?;
        let start = door_from.step(face_from);
        let goal = door_to.step(face_to);

        let mut blocked = HashSet::new();
        let route = loop {
            let grid = CarvingGrid {
                map,
                fresh_ground_cost: self.fresh_ground_cost,
                blocked: &blocked,
            };
            let route = AStarPathFinder::full(&grid).find_path(start, goal, rng);

            if route.is_empty() {
                return Err(CryptError::GenerationFailed(format!(
                    "no room to carve a corridor from room {} to room {}",
                    from, to
                )));
            }

            let widening = widening_tiles(map, &route);
            if widening.is_empty() {
                break route;
            }
            debug!(
                "Rerouting corridor {} -> {} around {} tiles that would widen it",
                from,
                to,
                widening.len()
            );
            blocked.extend(widening);
        };

        let tiles: Vec<TileIndex> = std::iter::once(door_from)
            .chain(route)
            .chain(std::iter::once(door_to))
            .filter_map(|pos| map.index_of(pos))
            .collect();

        debug!(
            "Carved corridor {} -> {} ({} tiles, doors at {:?} and {:?})",
            from,
            to,
            tiles.len(),
            door_from,
            door_to
        );
        map.add_corridor((from, to), tiles);
        Ok(())
    }

    /// Validates that all rooms are reachable from each other.
    fn validate_connectivity(&self, map: &TileMap) -> CryptResult<()> {
        if map.rooms().is_empty() {
            return Ok(());
        }

        let reached = pathfinding::prelude::bfs_reach(0, |&room| map.room_neighbors(room)).count();
        if reached != map.rooms().len() {
            return Err(CryptError::GenerationFailed(format!(
                "only {} of {} rooms are connected",
                reached,
                map.rooms().len()
            )));
        }

        Ok(())
    }

    fn validate_rooms(&self, map: &TileMap) -> CryptResult<()> {
        for (i, room) in map.rooms().iter().enumerate() {
            for other in &map.rooms()[i + 1..] {
                if room.rect().inflate(1).overlaps(&other.rect()) {
                    return Err(CryptError::GenerationFailed(format!(
                        "rooms {} and {} overlap or touch",
                        room.index(),
                        other.index()
                    )));
                }
            }

            for pos in room.rect().positions() {
                let tile = map.get_tile_at(pos).ok_or_else(|| {
                    CryptError::GenerationFailed(format!("room {} leaves the grid", room.index()))
                })?;
                // Doors are floor when carved, but the planner's entrance stays wall.
                let kind_ok = if room.floor_rect().contains(pos) {
                    tile.kind() == TileKind::Floor
                } else {
                    room.has_door(tile.index()) || tile.kind() == TileKind::Wall
                };
                if tile.room() != Some(room.index()) || !kind_ok {
                    return Err(CryptError::GenerationFailed(format!(
                        "tile {:?} of room {} is {:?} owned by {:?}",
                        pos,
                        room.index(),
                        tile.kind(),
                        tile.room()
                    )));
                }
            }
        }

        Ok(())
    }

    fn validate_corridors(&self, map: &TileMap) -> CryptResult<()> {
        for corridor in map.corridors() {
            let tiles = corridor.tiles();
            let (from, to) = corridor.rooms();
            let ends_are_doors = match (tiles.first(), tiles.last()) {
                (Some(&first), Some(&last)) => {
                    map.room(from).is_some_and(|room| room.has_door(first))
                        && map.room(to).is_some_and(|room| room.has_door(last))
                }
                _ => false,
            };
            if !ends_are_doors {
                return Err(CryptError::GenerationFailed(format!(
                    "corridor {} -> {} does not end on doors",
                    from, to
                )));
            }

            let positions: Vec<Position> = tiles
                .iter()
                .filter_map(|&index| map.tile(index).map(|tile| tile.position()))
                .collect();
            let contiguous = positions.len() == tiles.len()
                && positions
                    .windows(2)
                    .all(|pair| pair[0].manhattan_distance(pair[1]) == 1);
            if !contiguous {
                return Err(CryptError::GenerationFailed(format!(
                    "corridor {} -> {} is not contiguous",
                    from, to
                )));
            }
        }

        Ok(())
    }
}

impl Generator<TileMap> for RoomCorridorGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> CryptResult<TileMap> {
        config.validate()?;

        if self.room_gap < 1 || self.fresh_ground_cost < 1 {
            return Err(CryptError::InvalidConfiguration(
                "room_gap and fresh_ground_cost must be positive".to_string(),
            ));
        }

        let (width, height, rects) = self.layout_rooms(config, rng);
        let mut map = TileMap::blank(width, height);
        for rect in rects {
            map.add_room(rect);
        }

        let centers: Vec<Position> = map.rooms().iter().map(|room| room.center()).collect();
        for (from, to) in self.plan_connections(&centers, config, rng) {
            self.carve_corridor(&mut map, from, to, rng)?;
        }

        map.materialize_walls();

        info!(
            "Generated {} rooms and {} corridors on a {}x{} grid",
            map.rooms().len(),
            map.corridors().len(),
            width,
            height
        );

        Ok(map)
    }

    fn validate(&self, map: &TileMap, config: &GenerationConfig) -> CryptResult<()> {
        if map.rooms().len() != config.room_count as usize {
            return Err(CryptError::GenerationFailed(format!(
                "expected {} rooms, found {}",
                config.room_count,
                map.rooms().len()
            )));
        }

        self.validate_rooms(map)?;
        self.validate_corridors(map)?;
        self.validate_connectivity(map)
    }

    fn generator_type(&self) -> &'static str {
        "RoomCorridorGenerator"
    }
}

impl Default for RoomCorridorGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// The map as seen while carving: room rectangles are solid, open ground is
/// walkable, and corridors already carved are cheaper to follow.
struct CarvingGrid<'a> {
    map: &'a TileMap,
    fresh_ground_cost: u32,
    blocked: &'a HashSet<Position>,
}

impl PathGrid for CarvingGrid<'_> {
    fn width(&self) -> usize {
        self.map.width()
    }

    fn height(&self) -> usize {
        self.map.height()
    }

    fn step_cost(&self, pos: Position) -> Option<u32> {
        if self.blocked.contains(&pos) {
            return None;
        }

        match self.map.get_tile_at(pos) {
            Some(tile) if tile.room().is_some() => None,
            Some(tile) if tile.kind() == TileKind::Floor => Some(1),
            _ if self.map.bounds().contains(pos) => Some(self.fresh_ground_cost),
            _ => None,
        }
    }
}

/// Disjoint sets over room indices.
struct Components {
    parent: Vec<usize>,
    count: usize,
}

impl Components {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            count: size,
        }
    }

    fn find(&mut self, mut item: usize) -> usize {
        while self.parent[item] != item {
            self.parent[item] = self.parent[self.parent[item]];
            item = self.parent[item];
        }
        item
    }

    fn union(&mut self, a: usize, b: usize) {
        let (root_a, root_b) = (self.find(a), self.find(b));
        if root_a != root_b {
            self.parent[root_b] = root_a;
            self.count -= 1;
        }
    }

    fn count(&self) -> usize {
        self.count
    }
}

/// Closest other room by center distance, lowest index on ties.
fn nearest_room(
    centers: &[Position],
    room: RoomIndex,
    mut allowed: impl FnMut(RoomIndex) -> bool,
) -> Option<RoomIndex> {
    (0..centers.len())
        .filter(|&other| other != room && allowed(other))
        .min_by_key(|&other| (centers[room].manhattan_distance(centers[other]), other))
}

/// Face of a room at `from` that looks towards `to`.
fn facing(from: Position, to: Position) -> Direction {
    let delta = to - from;
    if delta.x.abs() >= delta.y.abs() {
        if delta.x >= 0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if delta.y > 0 {
        Direction::Top
    } else {
        Direction::Bottom
    }
}

/// Picks a door on `room` and the face it opens through.
///
/// The face looking towards `target` is preferred, but only wall tiles whose
/// outside tile can be carved without filling a 2x2 block of corridor floor
/// qualify. When that face has none, any face with such a tile is used.
fn choose_door(
    map: &TileMap,
    room: &Room,
    target: Position,
    rng: &mut StdRng,
) -> CryptResult<(Position, Direction)> {
    let toward = facing(room.center(), target);
    let opens_cleanly = |door: Position, face: Direction| {
        let outside = door.step(face);
        is_corridor_floor(map, outside)
            || !closes_block(outside, |pos| is_corridor_floor(map, pos))
    };

    let preferred: Vec<Position> = room
        .face(toward)
        .into_iter()
        .filter(|&door| opens_cleanly(door, toward))
        .collect();
    if let Some(&door) = preferred.choose(rng) {
        return Ok((door, toward));
    }

    let elsewhere: Vec<(Position, Direction)> = Direction::ALL
        .iter()
        .flat_map(|&face| room.face(face).into_iter().map(move |door| (door, face)))
        .filter(|&(door, face)| opens_cleanly(door, face))
        .collect();
    if let Some(&choice) = elsewhere.choose(rng) {
        return Ok(choice);
    }

    room.face(toward)
        .choose(rng)
        .map(|&door| (door, toward))
        .ok_or_else(|| CryptError::GenerationFailed("room face has no wall tiles".to_string()))
}

/// Floor that belongs to a corridor rather than a room.
fn is_corridor_floor(map: &TileMap, pos: Position) -> bool {
    map.get_tile_at(pos)
        .is_some_and(|tile| tile.room().is_none() && tile.kind() == TileKind::Floor)
}

/// Whether turning `pos` into floor completes a 2x2 block of corridor floor.
fn closes_block(pos: Position, is_corridor: impl Fn(Position) -> bool) -> bool {
    [(0, 0), (-1, 0), (0, -1), (-1, -1)].iter().any(|&(dx, dy)| {
        [(0, 0), (1, 0), (0, 1), (1, 1)].iter().all(|&(ox, oy)| {
            let cell = Position::new(pos.x + dx + ox, pos.y + dy + oy);
            cell == pos || is_corridor(cell)
        })
    })
}

/// New ground on `route` that would sit inside a 2x2 block of corridor floor
/// once the route is carved. The route's end tiles are never reported.
fn widening_tiles(map: &TileMap, route: &[Position]) -> Vec<Position> {
    let (Some(&first), Some(&last)) = (route.first(), route.last()) else {
        return Vec::new();
    };
    let carved: HashSet<Position> = route.iter().copied().collect();
    let is_corridor = |pos: Position| carved.contains(&pos) || is_corridor_floor(map, pos);

    route
        .iter()
        .copied()
        .filter(|&pos| pos != first && pos != last && !is_corridor_floor(map, pos))
        .filter(|&pos| closes_block(pos, &is_corridor))
        .collect()
}
