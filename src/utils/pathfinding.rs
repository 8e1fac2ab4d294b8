//! # Pathfinding Algorithms
//!
//! A* search over any 4-connected grid that implements [`PathGrid`].
//!
//! The open set is a binary min-heap ordered by `(f, h)` whose nodes remember
//! their own heap slot, so a cheaper route to an already open node is applied
//! with an in-place decrease-key instead of a duplicate push. Each
//! [`AStarPathFinder`] owns its heap and its open/closed sets; share the grid,
//! not the finder.

use crate::{Direction, Position, Rect};
use rand::Rng;
use std::collections::{HashMap, HashSet};

/// A grid the pathfinder can walk.
pub trait PathGrid {
    /// Number of columns.
    fn width(&self) -> usize;

    /// Number of rows.
    fn height(&self) -> usize;

    /// Cost of stepping onto `pos`, or `None` when the cell cannot be entered.
    fn step_cost(&self, pos: Position) -> Option<u32>;

    /// Rectangle covering the whole grid.
    fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width() as i32, self.height() as i32)
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    position: Position,
    parent: Option<usize>,
    path_cost: u32,
    expect_cost: u32,
    heap_index: Option<usize>,
}

impl Node {
    fn cost(&self) -> u32 {
        self.path_cost + self.expect_cost
    }

    fn key(&self) -> (u32, u32) {
        (self.cost(), self.expect_cost)
    }
}

/// Min-heap of node ids. The node arena is passed in so the heap can keep
/// every node's `heap_index` in sync with its slot.
#[derive(Debug, Default)]
struct OpenHeap {
    heap: Vec<usize>,
}

impl OpenHeap {
    #[cfg(test)]
    fn len(&self) -> usize {
        self.heap.len()
    }

    fn clear(&mut self) {
        self.heap.clear();
    }

    fn push(&mut self, nodes: &mut [Node], id: usize) {
        nodes[id].heap_index = Some(self.heap.len());
        self.heap.push(id);
        self.sift_up(nodes, self.heap.len() - 1);
    }

    fn pop(&mut self, nodes: &mut [Node]) -> Option<usize> {
        if self.heap.is_empty() {
            return None;
        }

        let root = self.heap.swap_remove(0);
        nodes[root].heap_index = None;

        if !self.heap.is_empty() {
            let moved = self.heap[0];
            nodes[moved].heap_index = Some(0);
            self.sift_down(nodes, 0);
        }

        Some(root)
    }

    /// Restores heap order after the key of `id` changed.
    fn update(&mut self, nodes: &mut [Node], id: usize) {
        let Some(index) = nodes[id].heap_index else {
            return;
        };

        if index > 0 && Self::precedes(nodes, id, self.heap[(index - 1) / 2]) {
            self.sift_up(nodes, index);
        } else {
            self.sift_down(nodes, index);
        }
    }

    fn precedes(nodes: &[Node], a: usize, b: usize) -> bool {
        nodes[a].key() < nodes[b].key()
    }

    fn sift_up(&mut self, nodes: &mut [Node], mut index: usize) {
        let id = self.heap[index];

        while index > 0 {
            let parent = (index - 1) / 2;
            let parent_id = self.heap[parent];
            if !Self::precedes(nodes, id, parent_id) {
                break;
            }

            self.heap[index] = parent_id;
            nodes[parent_id].heap_index = Some(index);
            index = parent;
        }

        self.heap[index] = id;
        nodes[id].heap_index = Some(index);
    }

    fn sift_down(&mut self, nodes: &mut [Node], mut index: usize) {
        let id = self.heap[index];
        let len = self.heap.len();

        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut best = index;
            let mut best_id = id;

            if left < len && Self::precedes(nodes, self.heap[left], best_id) {
                best = left;
                best_id = self.heap[left];
            }
            if right < len && Self::precedes(nodes, self.heap[right], best_id) {
                best = right;
                best_id = self.heap[right];
            }
            if best == index {
                break;
            }

            self.heap[index] = best_id;
            nodes[best_id].heap_index = Some(index);
            index = best;
        }

        self.heap[index] = id;
        nodes[id].heap_index = Some(index);
    }
}

/// A* pathfinder restricted to a rectangular region of a grid.
///
/// Among several equally cheap routes, the one returned depends on the
/// neighbour expansion order, which starts at an offset drawn from the
/// caller's RNG once per search. A seeded RNG therefore reproduces the route.
///
/// # Examples
///
/// ```
/// use cryptgen::{AStarPathFinder, PathGrid, Position};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// struct Open;
///
/// impl PathGrid for Open {
///     fn width(&self) -> usize { 8 }
///     fn height(&self) -> usize { 8 }
///     fn step_cost(&self, _pos: Position) -> Option<u32> { Some(1) }
/// }
///
/// let mut finder = AStarPathFinder::new(&Open, Open.bounds());
/// let mut rng = StdRng::seed_from_u64(3);
/// let path = finder.find_path(Position::new(0, 0), Position::new(3, 4), &mut rng);
/// assert_eq!(path.len(), 8);
/// ```
pub struct AStarPathFinder<'a, G: PathGrid + ?Sized> {
    grid: &'a G,
    boundary: Rect,
    nodes: Vec<Node>,
    open: OpenHeap,
    open_nodes: HashMap<usize, usize>,
    closed: HashSet<usize>,
}

impl<'a, G: PathGrid + ?Sized> AStarPathFinder<'a, G> {
    /// Creates a pathfinder that never leaves `boundary` (clipped to the grid).
    pub fn new(grid: &'a G, boundary: Rect) -> Self {
        let bounds = grid.bounds();
        let x = boundary.x_min().max(0);
        let y = boundary.y_min().max(0);
        let x_max = boundary.x_max().min(bounds.x_max());
        let y_max = boundary.y_max().min(bounds.y_max());

        Self {
            grid,
            boundary: Rect::new(x, y, (x_max - x).max(0), (y_max - y).max(0)),
            nodes: Vec::new(),
            open: OpenHeap::default(),
            open_nodes: HashMap::new(),
            closed: HashSet::new(),
        }
    }

    /// Creates a pathfinder over the whole grid.
    pub fn full(grid: &'a G) -> Self {
        Self::new(grid, grid.bounds())
    }

    pub fn boundary(&self) -> Rect {
        self.boundary
    }

    /// Finds the cheapest route from `from` to `to`, both inclusive.
    ///
    /// Returns an empty vector when either end lies outside the boundary, when
    /// `from` cannot be stood on, or when the open set runs dry before `to` is
    /// reached.
    pub fn find_path<R: Rng + ?Sized>(
        &mut self,
        from: Position,
        to: Position,
        rng: &mut R,
    ) -> Vec<Position> {
        self.reset();

        if !self.boundary.contains(from) || !self.boundary.contains(to) {
            return Vec::new();
        }
        if self.grid.step_cost(from).is_none() {
            return Vec::new();
        }

        let origin = self.add_node(from, None, 0, from.manhattan_distance(to));
        self.open.push(&mut self.nodes, origin);
        self.open_nodes.insert(self.key(from), origin);

        let offset = rng.gen_range(0..Direction::ALL.len());

        while let Some(current) = self.open.pop(&mut self.nodes) {
            let position = self.nodes[current].position;
            self.open_nodes.remove(&self.key(position));
            self.closed.insert(self.key(position));

            if position == to {
                return self.reconstruct(current);
            }

            for i in 0..Direction::ALL.len() {
                let direction = Direction::ALL[(offset + i) % Direction::ALL.len()];
                let next = position.step(direction);

                if !self.boundary.contains(next) {
                    continue;
                }

                let Some(step_cost) = self.grid.step_cost(next) else {
                    continue;
                };

                let key = self.key(next);
                if self.closed.contains(&key) {
                    continue;
                }

                let path_cost = self.nodes[current].path_cost + step_cost;

                match self.open_nodes.get(&key).copied() {
                    Some(open) => {
                        if path_cost < self.nodes[open].path_cost {
                            self.nodes[open].path_cost = path_cost;
                            self.nodes[open].parent = Some(current);
                            self.open.update(&mut self.nodes, open);
                        }
                    }
                    None => {
                        let child =
                            self.add_node(next, Some(current), path_cost, next.manhattan_distance(to));
                        self.open.push(&mut self.nodes, child);
                        self.open_nodes.insert(key, child);
                    }
                }
            }
        }

        Vec::new()
    }

    fn reset(&mut self) {
        self.nodes.clear();
        self.open.clear();
        self.open_nodes.clear();
        self.closed.clear();
    }

    fn add_node(
        &mut self,
        position: Position,
        parent: Option<usize>,
        path_cost: u32,
        expect_cost: u32,
    ) -> usize {
        self.nodes.push(Node {
            position,
            parent,
            path_cost,
            expect_cost,
            heap_index: None,
        });
        self.nodes.len() - 1
    }

    fn key(&self, pos: Position) -> usize {
        pos.y as usize * self.grid.width() + pos.x as usize
    }

    fn reconstruct(&self, end: usize) -> Vec<Position> {
        let mut path = Vec::new();
        let mut current = Some(end);

        while let Some(id) = current {
            path.push(self.nodes[id].position);
            current = self.nodes[id].parent;
        }

        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    /// `#` blocks, digits are step costs, anything else costs 1.
    /// The first string is the top row (largest y).
    struct CharGrid {
        rows: Vec<Vec<u8>>,
    }

    impl CharGrid {
        fn parse(lines: &[&str]) -> Self {
            let mut rows: Vec<Vec<u8>> = lines.iter().map(|line| line.bytes().collect()).collect();
            rows.reverse();
            Self { rows }
        }
    }

    impl PathGrid for CharGrid {
        fn width(&self) -> usize {
            self.rows[0].len()
        }

        fn height(&self) -> usize {
            self.rows.len()
        }

        fn step_cost(&self, pos: Position) -> Option<u32> {
            match self.rows[pos.y as usize][pos.x as usize] {
                b'#' => None,
                digit @ b'1'..=b'9' => Some((digit - b'0') as u32),
                _ => Some(1),
            }
        }
    }

    fn assert_connected(path: &[Position]) {
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1, "{:?}", path);
        }
    }

    #[test]
    fn test_heap_pops_in_key_order() {
        let mut nodes: Vec<Node> = [(5, 1), (3, 4), (3, 2), (9, 0), (1, 7)]
            .iter()
            .map(|&(path_cost, expect_cost)| Node {
                position: Position::new(0, 0),
                parent: None,
                path_cost,
                expect_cost,
                heap_index: None,
            })
            .collect();
        let mut heap = OpenHeap::default();
        for id in 0..nodes.len() {
            heap.push(&mut nodes, id);
        }
        assert_eq!(heap.len(), 5);

        // Decrease the key of the worst node so it comes out first.
        nodes[3].path_cost = 0;
        heap.update(&mut nodes, 3);

        let mut order = Vec::new();
        while let Some(id) = heap.pop(&mut nodes) {
            assert_eq!(nodes[id].heap_index, None);
            order.push(id);
        }
        // keys: 0 -> (6,1), 1 -> (7,4), 2 -> (5,2), 3 -> (0,0), 4 -> (8,7)
        assert_eq!(order, vec![3, 2, 0, 1, 4]);
    }

    #[test]
    fn test_heap_breaks_ties_on_heuristic() {
        let mut nodes: Vec<Node> = [(2, 4), (4, 2), (3, 3)]
            .iter()
            .map(|&(path_cost, expect_cost)| Node {
                position: Position::new(0, 0),
                parent: None,
                path_cost,
                expect_cost,
                heap_index: None,
            })
            .collect();
        let mut heap = OpenHeap::default();
        for id in 0..nodes.len() {
            heap.push(&mut nodes, id);
        }
        assert_eq!(heap.pop(&mut nodes), Some(1));
        assert_eq!(heap.pop(&mut nodes), Some(2));
        assert_eq!(heap.pop(&mut nodes), Some(0));
        assert_eq!(heap.pop(&mut nodes), None);
    }

    #[test]
    fn test_straight_path() {
        let grid = CharGrid::parse(&["......"]);
        let mut finder = AStarPathFinder::full(&grid);
        let mut rng = StdRng::seed_from_u64(1);

        let path = finder.find_path(Position::new(0, 0), Position::new(5, 0), &mut rng);
        assert_eq!(path.len(), 6);
        assert_eq!(path[0], Position::new(0, 0));
        assert_eq!(path[5], Position::new(5, 0));
        assert_connected(&path);
    }

    #[test]
    fn test_same_start_and_end() {
        let grid = CharGrid::parse(&["..", ".."]);
        let mut finder = AStarPathFinder::full(&grid);
        let mut rng = StdRng::seed_from_u64(1);

        let path = finder.find_path(Position::new(1, 1), Position::new(1, 1), &mut rng);
        assert_eq!(path, vec![Position::new(1, 1)]);
    }

    #[test]
    fn test_detours_around_walls() {
        let grid = CharGrid::parse(&[
            ".......", //
            ".#####.",
            "...#...",
        ]);
        let mut finder = AStarPathFinder::full(&grid);
        let mut rng = StdRng::seed_from_u64(9);

        let path = finder.find_path(Position::new(0, 0), Position::new(6, 0), &mut rng);
        // Up two rows, across six columns, down two rows.
        assert_eq!(path.len(), 11);
        assert_connected(&path);
        assert!(path.iter().all(|pos| grid.step_cost(*pos).is_some()));
    }

    #[test]
    fn test_unreachable_target_returns_empty() {
        let grid = CharGrid::parse(&[
            ".....", //
            "..###",
            "..#.#",
            "..###",
        ]);
        let mut finder = AStarPathFinder::full(&grid);
        let mut rng = StdRng::seed_from_u64(5);

        assert!(finder
            .find_path(Position::new(0, 0), Position::new(3, 1), &mut rng)
            .is_empty());
        // Wall target is never entered either.
        assert!(finder
            .find_path(Position::new(0, 0), Position::new(2, 1), &mut rng)
            .is_empty());
    }

    #[test]
    fn test_blocked_origin_returns_empty() {
        let grid = CharGrid::parse(&[
            "....", //
            ".#..",
            "....",
        ]);
        let mut finder = AStarPathFinder::full(&grid);
        let mut rng = StdRng::seed_from_u64(5);

        let wall = Position::new(1, 1);
        assert!(finder.find_path(wall, Position::new(3, 0), &mut rng).is_empty());
        assert!(finder.find_path(wall, wall, &mut rng).is_empty());
        assert_eq!(
            finder
                .find_path(Position::new(0, 1), Position::new(2, 1), &mut rng)
                .len(),
            5
        );
    }

    #[test]
    fn test_boundary_restricts_search() {
        let grid = CharGrid::parse(&[
            ".....", //
            ".###.",
            ".....",
        ]);
        let mut rng = StdRng::seed_from_u64(2);

        let mut whole = AStarPathFinder::full(&grid);
        assert_eq!(
            whole
                .find_path(Position::new(0, 1), Position::new(4, 1), &mut rng)
                .len(),
            7
        );

        // Only the bottom two rows: the top detour is out of reach.
        let mut bounded = AStarPathFinder::new(&grid, Rect::new(0, 0, 5, 2));
        let path = bounded.find_path(Position::new(0, 1), Position::new(4, 1), &mut rng);
        assert_eq!(path.len(), 7);
        assert!(path.iter().all(|pos| pos.y < 2));

        // A region that separates the two ends.
        let mut split = AStarPathFinder::new(&grid, Rect::new(0, 1, 5, 1));
        assert!(split
            .find_path(Position::new(0, 1), Position::new(4, 1), &mut rng)
            .is_empty());

        // Ends outside the region.
        assert!(split
            .find_path(Position::new(0, 0), Position::new(4, 1), &mut rng)
            .is_empty());
    }

    #[test]
    fn test_boundary_is_clipped_to_grid() {
        let grid = CharGrid::parse(&["...", "..."]);
        let finder = AStarPathFinder::new(&grid, Rect::new(-4, -4, 100, 100));
        assert_eq!(finder.boundary(), Rect::new(0, 0, 3, 2));
    }

    #[test]
    fn test_prefers_cheaper_tiles() {
        let grid = CharGrid::parse(&[
            ".....", //
            ".999.",
            ".....",
        ]);
        let mut finder = AStarPathFinder::full(&grid);

        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let path = finder.find_path(Position::new(0, 1), Position::new(4, 1), &mut rng);
            assert_eq!(path.len(), 7);
            assert!(!path.contains(&Position::new(2, 1)));
        }
    }

    #[test]
    fn test_same_seed_same_route() {
        let grid = CharGrid::parse(&[".........", ".........", ".........", "........."]);
        let mut finder = AStarPathFinder::full(&grid);

        let first = finder.find_path(
            Position::new(0, 0),
            Position::new(8, 3),
            &mut StdRng::seed_from_u64(77),
        );
        let second = finder.find_path(
            Position::new(0, 0),
            Position::new(8, 3),
            &mut StdRng::seed_from_u64(77),
        );
        assert_eq!(first, second);
        assert_eq!(first.len(), 12);
    }
}
