//! # ASCII Display
//!
//! Text minimap of a generated level, one character per tile.

use crate::{DungeonLevel, LevelPlan, Position, TileKind, TileMap};
use std::collections::HashSet;

/// Characters used by the minimap.
pub mod glyphs {
    pub const EMPTY: char = ' ';
    pub const WALL: char = '#';
    pub const ROOM_FLOOR: char = '.';
    pub const CORRIDOR_FLOOR: char = ',';
    pub const DOOR: char = '+';
    pub const ENTRANCE: char = '<';
    pub const EXIT: char = '>';
    pub const SPAWN: char = '@';
    pub const LOCKED_FLOOR: char = 'L';
    pub const ENEMY: char = 'e';
    pub const TORCH: char = '*';
}

/// Renders levels as text, top row first so that `Direction::Top` points up.
///
/// # Examples
///
/// ```
/// use cryptgen::{AsciiRenderer, GenerationConfig, WorldGenerator};
///
/// let level = WorldGenerator::new()
///     .generate(&GenerationConfig::for_testing(42))
///     .unwrap();
/// let text = AsciiRenderer::new().render(&level);
///
/// assert_eq!(text.lines().count(), level.tile_map.height());
/// assert_eq!(text.matches('<').count(), 1);
/// assert_eq!(text.matches('>').count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AsciiRenderer;

impl AsciiRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Full minimap with the plan, torches and enemies marked.
    pub fn render(&self, level: &DungeonLevel) -> String {
        let torches: HashSet<usize> = level.decor.torches.iter().map(|torch| torch.tile).collect();
        let enemies: HashSet<usize> = level
            .encounters
            .enemies
            .iter()
            .map(|enemy| enemy.tile)
            .collect();

        let overlay = |index: usize| {
            placement_glyph(&level.plan, index).or_else(|| {
                if enemies.contains(&index) {
                    Some(glyphs::ENEMY)
                } else if torches.contains(&index) {
                    Some(glyphs::TORCH)
                } else {
                    None
                }
            })
        };

        self.render_with(&level.tile_map, level.plan.locked_room, overlay)
    }

    /// Topology only: walls, floors and doors.
    pub fn render_map(&self, map: &TileMap) -> String {
        self.render_with(map, None, |_| None)
    }

    fn render_with(
        &self,
        map: &TileMap,
        locked_room: Option<usize>,
        overlay: impl Fn(usize) -> Option<char>,
    ) -> String {
        let mut output = String::with_capacity((map.width() + 1) * map.height());

        for y in (0..map.height() as i32).rev() {
            let mut row = String::with_capacity(map.width());
            for x in 0..map.width() as i32 {
                let glyph = map
                    .index_of(Position::new(x, y))
                    .and_then(&overlay)
                    .unwrap_or_else(|| tile_glyph(map, Position::new(x, y), locked_room));
                row.push(glyph);
            }
            output.push_str(row.trim_end());
            output.push('\n');
        }

        output
    }
}

fn placement_glyph(plan: &LevelPlan, index: usize) -> Option<char> {
    if index == plan.start_tile {
        Some(glyphs::ENTRANCE)
    } else if index == plan.end_tile {
        Some(glyphs::EXIT)
    } else if index == plan.spawn_tile {
        Some(glyphs::SPAWN)
    } else {
        None
    }
}

fn tile_glyph(map: &TileMap, pos: Position, locked_room: Option<usize>) -> char {
    let Some(tile) = map.get_tile_at(pos) else {
        return glyphs::EMPTY;
    };

    if map.is_door(tile.index()) {
        return glyphs::DOOR;
    }

    match (tile.kind(), tile.room()) {
        (TileKind::Wall, _) => glyphs::WALL,
        (TileKind::Floor, Some(room)) if Some(room) == locked_room => glyphs::LOCKED_FLOOR,
        (TileKind::Floor, Some(_)) => glyphs::ROOM_FLOOR,
        (TileKind::Floor, None) => glyphs::CORRIDOR_FLOOR,
        (TileKind::Empty, _) => glyphs::EMPTY,
    }
}
