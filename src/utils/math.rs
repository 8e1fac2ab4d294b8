//! # Grid Mathematics
//!
//! Integer geometry shared by the generator, the pathfinder and the planner.
//!
//! The grid uses `+y` as "up": a room's top wall is its row with the largest
//! `y`, and [`Direction::Top`] moves towards larger `y`.

use serde::{Deserialize, Serialize};

/// Represents a 2D tile coordinate.
///
/// # Examples
///
/// ```
/// use cryptgen::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
/// assert_eq!(pos.manhattan_distance(Position::new(7, 9)), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Calculates the Manhattan distance to another position.
    pub fn manhattan_distance(self, other: Position) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    /// Returns the position one step away in `direction`.
    pub fn step(self, direction: Direction) -> Position {
        self + direction.to_delta()
    }

    /// Returns the 4 cardinal neighbours in [`Direction::ALL`] order.
    pub fn cardinal_adjacent_positions(self) -> [Position; 4] {
        Direction::ALL.map(|direction| self.step(direction))
    }

    /// Returns all 8 surrounding positions.
    pub fn adjacent_positions(self) -> [Position; 8] {
        [
            Position::new(self.x - 1, self.y - 1),
            Position::new(self.x, self.y - 1),
            Position::new(self.x + 1, self.y - 1),
            Position::new(self.x - 1, self.y),
            Position::new(self.x + 1, self.y),
            Position::new(self.x - 1, self.y + 1),
            Position::new(self.x, self.y + 1),
            Position::new(self.x + 1, self.y + 1),
        ]
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// Orthogonal directions, in the order tiles store their neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Top,
    Right,
    Bottom,
    Left,
}

impl Direction {
    /// All four directions, indexed by [`Direction::index`].
    pub const ALL: [Direction; 4] = [
        Direction::Top,
        Direction::Right,
        Direction::Bottom,
        Direction::Left,
    ];

    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptgen::{Direction, Position};
    ///
    /// assert_eq!(Direction::Top.to_delta(), Position::new(0, 1));
    /// assert_eq!(Direction::Left.to_delta(), Position::new(-1, 0));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::Top => Position::new(0, 1),
            Direction::Right => Position::new(1, 0),
            Direction::Bottom => Position::new(0, -1),
            Direction::Left => Position::new(-1, 0),
        }
    }

    /// Converts a unit delta back to a direction.
    pub fn from_delta(delta: Position) -> Option<Direction> {
        match (delta.x, delta.y) {
            (0, 1) => Some(Direction::Top),
            (1, 0) => Some(Direction::Right),
            (0, -1) => Some(Direction::Bottom),
            (-1, 0) => Some(Direction::Left),
            _ => None,
        }
    }

    /// Slot of this direction in a tile's neighbour array.
    pub fn index(self) -> usize {
        match self {
            Direction::Top => 0,
            Direction::Right => 1,
            Direction::Bottom => 2,
            Direction::Left => 3,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Top => Direction::Bottom,
            Direction::Right => Direction::Left,
            Direction::Bottom => Direction::Top,
            Direction::Left => Direction::Right,
        }
    }
}

/// Axis-aligned rectangle in tile units, half-open on the max side.
///
/// # Examples
///
/// ```
/// use cryptgen::{Position, Rect};
///
/// let rect = Rect::new(2, 3, 4, 5);
/// assert_eq!(rect.x_max(), 6);
/// assert!(rect.contains(Position::new(5, 7)));
/// assert!(!rect.contains(Position::new(6, 7)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn x_min(&self) -> i32 {
        self.x
    }

    pub fn y_min(&self) -> i32 {
        self.y
    }

    /// Exclusive upper bound on `x`.
    pub fn x_max(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive upper bound on `y`.
    pub fn y_max(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> u32 {
        (self.width.max(0) * self.height.max(0)) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Center tile, rounding towards the max side on even extents.
    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x && pos.y >= self.y && pos.x < self.x_max() && pos.y < self.y_max()
    }

    /// Checks if this rectangle shares at least one tile with another.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.x >= other.x_max()
            || other.x >= self.x_max()
            || self.y >= other.y_max()
            || other.y >= self.y_max())
    }

    /// Grows (or shrinks, for negative `amount`) the rectangle on every side.
    pub fn inflate(&self, amount: i32) -> Rect {
        Rect::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2,
            self.height + amount * 2,
        )
    }

    /// Iterates all positions row by row, from `y_min` upwards.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (self.y..self.y_max()).flat_map(move |y| (self.x..self.x_max()).map(move |x| Position::new(x, y)))
    }
}
