//! # Tile Map
//!
//! The grid model shared by generation, pathfinding and level planning.
//!
//! Tiles live in a single arena indexed by `y * width + x`. Rooms, corridors
//! and tiles refer to each other by index only, so the whole map is plain
//! data: cheap to clone, trivially serializable, and free of ownership cycles.
//! A map is mutated only while it is being generated, plus door-set updates
//! made by the level planner; readers treat it as immutable afterwards.

use crate::{AStarPathFinder, CryptError, CryptResult, Direction, PathGrid, Position, Rect};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Linear index of a tile in its map.
pub type TileIndex = usize;

/// Creation-order index of a room in its map.
pub type RoomIndex = usize;

/// Physical content of a tile.
///
/// Being a door is not a kind: it is membership in a room's door set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Nothing was built here; impassable and hidden from tile queries.
    Empty,
    Floor,
    Wall,
}

impl TileKind {
    pub fn is_passable(self) -> bool {
        self == TileKind::Floor
    }
}

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    position: Position,
    index: TileIndex,
    kind: TileKind,
    movement_cost: u32,
    room: Option<RoomIndex>,
    neighbors: [Option<TileIndex>; 4],
}

impl Tile {
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn x(&self) -> i32 {
        self.position.x
    }

    pub fn y(&self) -> i32 {
        self.position.y
    }

    pub fn index(&self) -> TileIndex {
        self.index
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn movement_cost(&self) -> u32 {
        self.movement_cost
    }

    /// Owning room; `None` for corridor tiles and the walls around them.
    pub fn room(&self) -> Option<RoomIndex> {
        self.room
    }

    /// Index of the adjacent cell in `direction`, `None` at the grid edge.
    ///
    /// The cell may be [`TileKind::Empty`]; use [`TileMap::neighbor`] to get
    /// only tiles that [`TileMap::get_tile`] would return.
    pub fn neighbor(&self, direction: Direction) -> Option<TileIndex> {
        self.neighbors[direction.index()]
    }

    /// Adjacent cell indices in [`Direction::ALL`] order.
    pub fn neighbors(&self) -> &[Option<TileIndex>; 4] {
        &self.neighbors
    }
}

/// Rectangular room, walls included.
///
/// # Examples
///
/// ```
/// use cryptgen::{Rect, Room};
///
/// let room = Room::new(0, Rect::new(2, 2, 6, 5));
/// assert_eq!(room.floor_rect(), Rect::new(3, 3, 4, 3));
/// assert_eq!(room.center().x, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    index: RoomIndex,
    rect: Rect,
    doors: BTreeSet<TileIndex>,
}

impl Room {
    pub fn new(index: RoomIndex, rect: Rect) -> Self {
        Self {
            index,
            rect,
            doors: BTreeSet::new(),
        }
    }

    pub fn index(&self) -> RoomIndex {
        self.index
    }

    /// Full rectangle including the one-tile wall ring.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Interior rectangle, excluding the wall ring.
    pub fn floor_rect(&self) -> Rect {
        self.rect.inflate(-1)
    }

    pub fn center(&self) -> Position {
        self.rect.center()
    }

    pub fn doors(&self) -> &BTreeSet<TileIndex> {
        &self.doors
    }

    pub fn has_door(&self, tile: TileIndex) -> bool {
        self.doors.contains(&tile)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.rect.contains(pos)
    }

    /// Checks if `pos` lies on the wall ring.
    pub fn is_border(&self, pos: Position) -> bool {
        self.contains(pos) && !self.floor_rect().contains(pos)
    }

    /// Wall tiles of one face, corners excluded, in increasing coordinate order.
    pub fn face(&self, direction: Direction) -> Vec<Position> {
        let r = self.rect;
        match direction {
            Direction::Top => ((r.x_min() + 1)..(r.x_max() - 1))
                .map(|x| Position::new(x, r.y_max() - 1))
                .collect(),
            Direction::Bottom => ((r.x_min() + 1)..(r.x_max() - 1))
                .map(|x| Position::new(x, r.y_min()))
                .collect(),
            Direction::Left => ((r.y_min() + 1)..(r.y_max() - 1))
                .map(|y| Position::new(r.x_min(), y))
                .collect(),
            Direction::Right => ((r.y_min() + 1)..(r.y_max() - 1))
                .map(|y| Position::new(r.x_max() - 1, y))
                .collect(),
        }
    }

    /// The face `pos` lies on, if it is a non-corner wall tile.
    pub fn face_of(&self, pos: Position) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&direction| self.face(direction).contains(&pos))
    }
}

/// One-tile-wide passage between two rooms.
///
/// The first tile is a door of `rooms().0`, the last a door of `rooms().1`,
/// and consecutive tiles are 4-adjacent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corridor {
    rooms: (RoomIndex, RoomIndex),
    tiles: Vec<TileIndex>,
}

impl Corridor {
    pub fn rooms(&self) -> (RoomIndex, RoomIndex) {
        self.rooms
    }

    pub fn tiles(&self) -> &[TileIndex] {
        &self.tiles
    }

    pub fn connects(&self, room: RoomIndex) -> bool {
        self.rooms.0 == room || self.rooms.1 == room
    }

    /// The room at the other end, if `room` is one of the two ends.
    pub fn other_end(&self, room: RoomIndex) -> Option<RoomIndex> {
        if self.rooms.0 == room {
            Some(self.rooms.1)
        } else if self.rooms.1 == room {
            Some(self.rooms.0)
        } else {
            None
        }
    }
}

/// Owns every tile, room and corridor of one dungeon level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
    rooms: Vec<Room>,
    corridors: Vec<Corridor>,
}

impl TileMap {
    /// Creates a map of `Empty` tiles with neighbour links in place.
    pub(crate) fn blank(width: usize, height: usize) -> Self {
        let mut tiles = Vec::with_capacity(width * height);

        for y in 0..height {
            for x in 0..width {
                let position = Position::new(x as i32, y as i32);
                let neighbors = position.cardinal_adjacent_positions().map(|next| {
                    (next.x >= 0 && next.y >= 0 && (next.x as usize) < width && (next.y as usize) < height)
                        .then(|| next.y as usize * width + next.x as usize)
                });

                tiles.push(Tile {
                    position,
                    index: y * width + x,
                    kind: TileKind::Empty,
                    movement_cost: 1,
                    room: None,
                    neighbors,
                });
            }
        }

        Self {
            width,
            height,
            tiles,
            rooms: Vec::new(),
            corridors: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, index: RoomIndex) -> Option<&Room> {
        self.rooms.get(index)
    }

    pub fn corridors(&self) -> &[Corridor] {
        &self.corridors
    }

    /// Linear index of an in-bounds position, whatever its kind.
    pub fn index_of(&self, pos: Position) -> Option<TileIndex> {
        self.bounds()
            .contains(pos)
            .then(|| pos.y as usize * self.width + pos.x as usize)
    }

    /// Tile at `(x, y)`; `None` outside the grid or on an `Empty` cell.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptgen::{GenerationConfig, Generator, RoomCorridorGenerator, TileKind};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = GenerationConfig::for_testing(5);
    /// let map = RoomCorridorGenerator::new()
    ///     .generate(&config, &mut StdRng::seed_from_u64(5))
    ///     .unwrap();
    /// let center = map.rooms()[0].center();
    ///
    /// assert_eq!(map.get_tile(center.x, center.y).unwrap().kind(), TileKind::Floor);
    /// assert!(map.get_tile(-1, 0).is_none());
    /// ```
    pub fn get_tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.get_tile_at(Position::new(x, y))
    }

    pub fn get_tile_at(&self, pos: Position) -> Option<&Tile> {
        self.index_of(pos).and_then(|index| self.tile(index))
    }

    /// Tile by linear index; `None` out of range or on an `Empty` cell.
    pub fn tile(&self, index: TileIndex) -> Option<&Tile> {
        self.tiles
            .get(index)
            .filter(|tile| tile.kind != TileKind::Empty)
    }

    /// Every non-empty tile, in index order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|tile| tile.kind != TileKind::Empty)
    }

    /// Kind of any in-bounds cell, `Empty` included.
    pub fn kind_at(&self, pos: Position) -> Option<TileKind> {
        self.index_of(pos).map(|index| self.tiles[index].kind)
    }

    /// Adjacent tile in `direction`, with the same visibility as [`TileMap::tile`].
    pub fn neighbor(&self, index: TileIndex, direction: Direction) -> Option<&Tile> {
        self.tiles
            .get(index)
            .and_then(|tile| tile.neighbor(direction))
            .and_then(|next| self.tile(next))
    }

    /// Checks if `index` is a door of any room.
    pub fn is_door(&self, index: TileIndex) -> bool {
        self.rooms.iter().any(|room| room.has_door(index))
    }

    /// Interior floor tiles of a room, row by row.
    pub fn floor_tiles(&self, room: RoomIndex) -> Vec<TileIndex> {
        self.room(room)
            .map(|room| {
                room.floor_rect()
                    .positions()
                    .filter_map(|pos| self.index_of(pos))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rooms directly joined to `room` by a corridor, in creation order.
    pub fn room_neighbors(&self, room: RoomIndex) -> Vec<RoomIndex> {
        self.corridors
            .iter()
            .filter_map(|corridor| corridor.other_end(room))
            .filter(|&other| other != room)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Rooms traversed from `from` to `to` along the corridor graph, both inclusive.
    ///
    /// Breadth-first, expanding neighbours in creation order, so among several
    /// shortest room paths the result is deterministic. Returns an empty vector
    /// when either room does not exist or no path connects them.
    pub fn find_room_path(&self, from: RoomIndex, to: RoomIndex) -> Vec<RoomIndex> {
        if from >= self.rooms.len() || to >= self.rooms.len() {
            return Vec::new();
        }

        pathfinding::prelude::bfs(&from, |&room| self.room_neighbors(room), |&room| room == to)
            .unwrap_or_default()
    }

    /// Cheapest tile route between two tiles over the whole map.
    pub fn find_tile_path<R: Rng + ?Sized>(
        &self,
        from: TileIndex,
        to: TileIndex,
        rng: &mut R,
    ) -> Vec<TileIndex> {
        self.find_tile_path_within(from, to, self.bounds(), rng)
    }

    /// Cheapest tile route between two tiles that never leaves `boundary`.
    pub fn find_tile_path_within<R: Rng + ?Sized>(
        &self,
        from: TileIndex,
        to: TileIndex,
        boundary: Rect,
        rng: &mut R,
    ) -> Vec<TileIndex> {
        let (Some(from), Some(to)) = (self.tiles.get(from), self.tiles.get(to)) else {
            return Vec::new();
        };

        AStarPathFinder::new(self, boundary)
            .find_path(from.position, to.position, rng)
            .into_iter()
            .filter_map(|pos| self.index_of(pos))
            .collect()
    }

    /// Sets the pathfinding cost of entering a tile.
    pub fn set_movement_cost(&mut self, index: TileIndex, cost: u32) -> CryptResult<()> {
        if cost == 0 {
            return Err(CryptError::InvalidConfiguration(
                "movement cost must be positive".to_string(),
            ));
        }

        let tile = self.tiles.get_mut(index).ok_or_else(|| {
            CryptError::InvalidConfiguration(format!("tile {} is outside the map", index))
        })?;
        tile.movement_cost = cost;
        Ok(())
    }

    /// Stamps a room: wall ring on the border, owned floor inside.
    pub(crate) fn add_room(&mut self, rect: Rect) -> RoomIndex {
        let index = self.rooms.len();
        let room = Room::new(index, rect);

        for pos in rect.positions() {
            if let Some(tile_index) = self.index_of(pos) {
                let tile = &mut self.tiles[tile_index];
                tile.room = Some(index);
                tile.kind = if room.is_border(pos) {
                    TileKind::Wall
                } else {
                    TileKind::Floor
                };
            }
        }

        self.rooms.push(room);
        index
    }

    /// Registers `tile` as a door of `room` without touching its kind.
    pub(crate) fn add_door(&mut self, room: RoomIndex, tile: TileIndex) {
        if let Some(room) = self.rooms.get_mut(room) {
            room.doors.insert(tile);
        }
    }

    /// Records a carved corridor: every tile becomes floor and both ends
    /// become doors of their rooms.
    pub(crate) fn add_corridor(&mut self, rooms: (RoomIndex, RoomIndex), tiles: Vec<TileIndex>) {
        debug_assert!(tiles.windows(2).all(|pair| {
            self.tiles[pair[0]]
                .position
                .manhattan_distance(self.tiles[pair[1]].position)
                == 1
        }));

        for &tile in &tiles {
            self.tiles[tile].kind = TileKind::Floor;
        }

        if let (Some(&first), Some(&last)) = (tiles.first(), tiles.last()) {
            self.add_door(rooms.0, first);
            self.add_door(rooms.1, last);
        }

        self.corridors.push(Corridor { rooms, tiles });
    }

    /// Turns every `Empty` cell touching floor (diagonals included) into wall.
    pub(crate) fn materialize_walls(&mut self) {
        let walls: Vec<TileIndex> = self
            .tiles
            .iter()
            .filter(|tile| tile.kind == TileKind::Empty)
            .filter(|tile| {
                tile.position
                    .adjacent_positions()
                    .iter()
                    .any(|&pos| self.kind_at(pos) == Some(TileKind::Floor))
            })
            .map(|tile| tile.index)
            .collect();

        for index in walls {
            self.tiles[index].kind = TileKind::Wall;
        }
    }
}

impl PathGrid for TileMap {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn step_cost(&self, pos: Position) -> Option<u32> {
        self.get_tile_at(pos)
            .filter(|tile| tile.kind.is_passable())
            .map(|tile| tile.movement_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    /// Two rooms joined by a straight corridor, plus an isolated third room.
    fn sample_map() -> TileMap {
        let mut map = TileMap::blank(20, 16);
        let left = map.add_room(Rect::new(1, 1, 5, 5));
        let right = map.add_room(Rect::new(12, 1, 5, 5));
        map.add_room(Rect::new(1, 9, 5, 5));

        let corridor: Vec<TileIndex> = (5..=12)
            .filter_map(|x| map.index_of(Position::new(x, 3)))
            .collect();
        map.add_corridor((left, right), corridor);
        map.materialize_walls();
        map
    }

    #[test]
    fn test_tile_indexing() {
        let map = sample_map();
        let tile = map.get_tile(3, 2).unwrap();
        assert_eq!(tile.index(), 2 * 20 + 3);
        assert_eq!(tile.position(), Position::new(3, 2));
        assert_eq!(map.tile(tile.index()), Some(tile));
        assert_eq!(tile.movement_cost(), 1);

        assert!(map.get_tile(-1, 0).is_none());
        assert!(map.get_tile(20, 0).is_none());
        // Far from anything built.
        assert_eq!(map.kind_at(Position::new(10, 12)), Some(TileKind::Empty));
        assert!(map.get_tile(10, 12).is_none());
    }

    #[test]
    fn test_room_stamping() {
        let map = sample_map();
        let room = &map.rooms()[0];

        for pos in room.rect().positions() {
            let tile = map.get_tile_at(pos).unwrap();
            assert_eq!(tile.room(), Some(0));
            if room.floor_rect().contains(pos) {
                assert_eq!(tile.kind(), TileKind::Floor);
            } else if !room.has_door(tile.index()) {
                assert_eq!(tile.kind(), TileKind::Wall);
            }
        }
        assert_eq!(map.floor_tiles(0).len(), 9);
    }

    #[test]
    fn test_faces_exclude_corners() {
        let room = Room::new(0, Rect::new(1, 1, 5, 4));
        assert_eq!(
            room.face(Direction::Top),
            vec![Position::new(2, 4), Position::new(3, 4), Position::new(4, 4)]
        );
        assert_eq!(
            room.face(Direction::Left),
            vec![Position::new(1, 2), Position::new(1, 3)]
        );
        assert_eq!(room.face_of(Position::new(5, 3)), Some(Direction::Right));
        assert_eq!(room.face_of(Position::new(1, 1)), None);
        assert_eq!(room.face_of(Position::new(3, 2)), None);
    }

    #[test]
    fn test_corridor_doors_and_walls() {
        let map = sample_map();
        let corridor = &map.corridors()[0];
        let first = corridor.tiles()[0];
        let last = *corridor.tiles().last().unwrap();

        assert!(map.rooms()[0].has_door(first));
        assert!(map.rooms()[1].has_door(last));
        assert!(map.is_door(first));
        assert_eq!(map.tile(first).unwrap().kind(), TileKind::Floor);

        for &index in &corridor.tiles()[1..corridor.tiles().len() - 1] {
            let tile = map.tile(index).unwrap();
            assert_eq!(tile.room(), None);
            assert_eq!(tile.kind(), TileKind::Floor);
            assert_eq!(map.neighbor(index, Direction::Top).unwrap().kind(), TileKind::Wall);
            assert_eq!(map.neighbor(index, Direction::Bottom).unwrap().kind(), TileKind::Wall);
        }

        assert_eq!(corridor.other_end(0), Some(1));
        assert_eq!(corridor.other_end(2), None);
    }

    #[test]
    fn test_neighbor_links() {
        let map = sample_map();
        let corner = map.tiles.first().unwrap();
        assert_eq!(corner.neighbor(Direction::Left), None);
        assert_eq!(corner.neighbor(Direction::Bottom), None);
        assert_eq!(corner.neighbor(Direction::Right), Some(1));
        assert_eq!(corner.neighbor(Direction::Top), Some(20));
        // (0, 0) itself is empty, so it is hidden from map.neighbor too.
        assert!(map.neighbor(1, Direction::Left).is_none());
    }

    #[test]
    fn test_room_paths() {
        let map = sample_map();
        assert_eq!(map.find_room_path(0, 1), vec![0, 1]);
        assert_eq!(map.find_room_path(1, 0), vec![1, 0]);
        assert_eq!(map.find_room_path(0, 0), vec![0]);
        assert!(map.find_room_path(0, 2).is_empty());
        assert!(map.find_room_path(0, 9).is_empty());
        assert_eq!(map.room_neighbors(0), vec![1]);
        assert!(map.room_neighbors(2).is_empty());
    }

    #[test]
    fn test_tile_path_between_room_centers() {
        let map = sample_map();
        let from = map.index_of(map.rooms()[0].center()).unwrap();
        let to = map.index_of(map.rooms()[1].center()).unwrap();
        let mut rng = StdRng::seed_from_u64(4);

        let path = map.find_tile_path(from, to, &mut rng);
        assert_eq!(path.len(), 12);
        assert_eq!(path[0], from);
        assert_eq!(*path.last().unwrap(), to);

        let isolated = map.index_of(map.rooms()[2].center()).unwrap();
        assert!(map.find_tile_path(from, isolated, &mut rng).is_empty());
    }

    #[test]
    fn test_tile_path_never_starts_on_wall() {
        let map = sample_map();
        let wall = map.index_of(Position::new(3, 5)).unwrap();
        let center = map.index_of(map.rooms()[1].center()).unwrap();
        let mut rng = StdRng::seed_from_u64(6);

        assert_eq!(map.tile(wall).unwrap().kind(), TileKind::Wall);
        assert!(map.find_tile_path(wall, center, &mut rng).is_empty());
        assert!(map.find_tile_path(wall, wall, &mut rng).is_empty());
        assert_eq!(map.find_tile_path(center, center, &mut rng), vec![center]);
    }

    #[test]
    fn test_movement_cost_validation() {
        let mut map = sample_map();
        assert!(map.set_movement_cost(0, 0).is_err());
        assert!(map.set_movement_cost(usize::MAX, 2).is_err());
        map.set_movement_cost(45, 3).unwrap();
        assert_eq!(map.tiles[45].movement_cost(), 3);
    }
}
