//! Integration tests for room-and-corridor layout generation.

use cryptgen::{
    create_rng, CryptResult, GenerationConfig, Generator, Position, RoomCorridorGenerator,
    TileKind, TileMap,
};
use proptest::prelude::*;

fn generate(config: &GenerationConfig) -> CryptResult<TileMap> {
    RoomCorridorGenerator::new().generate(config, &mut create_rng(config.seed))
}

fn config_strategy() -> impl Strategy<Value = GenerationConfig> {
    (1u64..10_000, 1u32..12, 1u32..5, 0u32..4, 0.0f64..=1.0).prop_map(
        |(seed, room_count, min_room_size, extra, chance)| GenerationConfig {
            seed,
            room_count,
            min_room_size,
            max_room_size: min_room_size + extra,
            extra_connection_chance: chance,
            ..GenerationConfig::for_testing(seed)
        },
    )
}

fn assert_interior_invariants(map: &TileMap) {
    for room in map.rooms() {
        for pos in room.floor_rect().positions() {
            let tile = map.get_tile_at(pos).expect("interior tile exists");
            assert_eq!(tile.kind(), TileKind::Floor, "room {} at {:?}", room.index(), pos);
            assert_eq!(tile.room(), Some(room.index()));
        }

        for &door in room.doors() {
            let pos = map.tile(door).expect("door tile exists").position();
            assert!(room.is_border(pos), "door {:?} off the wall ring", pos);
            assert!(room.face_of(pos).is_some(), "door {:?} on a corner", pos);
        }
    }
}

/// Lowest corner of every 2x2 block made only of corridor floor.
fn corridor_blocks(map: &TileMap) -> Vec<Position> {
    let corridor = |pos: Position| {
        map.get_tile_at(pos)
            .is_some_and(|tile| tile.room().is_none() && tile.kind() == TileKind::Floor)
    };

    map.bounds()
        .positions()
        .filter(|&pos| {
            [(0, 0), (1, 0), (0, 1), (1, 1)]
                .iter()
                .all(|&(dx, dy)| corridor(Position::new(pos.x + dx, pos.y + dy)))
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_every_room_pair_is_connected(config in config_strategy()) {
        let map = generate(&config).unwrap();
        let rooms = map.rooms().len();
        prop_assert_eq!(rooms, config.room_count as usize);

        for from in 0..rooms {
            for to in 0..rooms {
                let path = map.find_room_path(from, to);
                prop_assert!(!path.is_empty(), "no path {} -> {}", from, to);
                prop_assert_eq!(path.first(), Some(&from));
                prop_assert_eq!(path.last(), Some(&to));
            }
        }
    }

    #[test]
    fn prop_rooms_never_overlap(config in config_strategy()) {
        let map = generate(&config).unwrap();
        let rooms = map.rooms();

        for (i, a) in rooms.iter().enumerate() {
            for b in &rooms[i + 1..] {
                prop_assert!(!a.rect().overlaps(&b.rect()), "{:?} overlaps {:?}", a.rect(), b.rect());
            }
        }
    }

    #[test]
    fn prop_interiors_and_doors_are_consistent(config in config_strategy()) {
        let map = generate(&config).unwrap();
        assert_interior_invariants(&map);
        prop_assert!(RoomCorridorGenerator::new().validate(&map, &config).is_ok());
    }

    #[test]
    fn prop_room_paths_are_symmetric_in_length(config in config_strategy()) {
        let map = generate(&config).unwrap();
        let rooms = map.rooms().len();

        for from in 0..rooms {
            for to in (from + 1)..rooms {
                prop_assert_eq!(
                    map.find_room_path(from, to).len(),
                    map.find_room_path(to, from).len()
                );
            }
        }
    }

    #[test]
    fn prop_corridors_are_contiguous_floor(config in config_strategy()) {
        let map = generate(&config).unwrap();

        for corridor in map.corridors() {
            let (from, to) = corridor.rooms();
            let tiles = corridor.tiles();
            prop_assert!(tiles.len() >= 2);
            prop_assert!(map.rooms()[from].has_door(tiles[0]));
            prop_assert!(map.rooms()[to].has_door(tiles[tiles.len() - 1]));

            for pair in tiles.windows(2) {
                let a = map.tile(pair[0]).unwrap();
                let b = map.tile(pair[1]).unwrap();
                prop_assert_eq!(a.position().manhattan_distance(b.position()), 1);
            }
            for &tile in tiles {
                prop_assert_eq!(map.tile(tile).unwrap().kind(), TileKind::Floor);
            }
        }
    }

    #[test]
    fn prop_corridors_are_one_tile_wide(config in config_strategy()) {
        let map = generate(&config).unwrap();
        let blocks = corridor_blocks(&map);
        prop_assert!(blocks.is_empty(), "2x2 corridor floor at {:?}", blocks);
    }
}

#[test]
fn test_default_levels_have_no_wide_corridors() {
    for seed in 1..200 {
        let map = generate(&GenerationConfig::new(seed)).expect("generation succeeds");
        assert_eq!(corridor_blocks(&map), Vec::new(), "seed {}", seed);
    }
}

#[test]
fn test_seed_42_is_deterministic() {
    let config = GenerationConfig {
        room_count: 5,
        min_room_size: 3,
        max_room_size: 5,
        ..GenerationConfig::for_testing(42)
    };

    let first = generate(&config).expect("generation succeeds");
    let second = generate(&config).expect("generation succeeds");
    assert_eq!(first, second);
    assert_eq!(first.rooms().len(), 5);
}

#[test]
fn test_unknown_rooms_have_no_path() {
    let map = generate(&GenerationConfig::for_testing(3)).expect("generation succeeds");
    let rooms = map.rooms().len();

    assert!(map.find_room_path(0, rooms).is_empty());
    assert!(map.find_room_path(rooms + 4, 0).is_empty());
    assert_eq!(map.find_room_path(1, 1), vec![1]);
}

#[test]
fn test_room_sizes_respect_bounds() {
    let config = GenerationConfig {
        room_count: 9,
        min_room_size: 2,
        max_room_size: 6,
        ..GenerationConfig::for_testing(77)
    };
    let map = generate(&config).expect("generation succeeds");

    for room in map.rooms() {
        let floor = room.floor_rect();
        assert!((2..=6).contains(&floor.width), "{:?}", floor);
        assert!((2..=6).contains(&floor.height), "{:?}", floor);
    }
}

#[test]
fn test_single_room_layout() {
    let config = GenerationConfig {
        room_count: 1,
        ..GenerationConfig::for_testing(11)
    };
    let map = generate(&config).expect("generation succeeds");

    assert_eq!(map.rooms().len(), 1);
    assert!(map.corridors().is_empty());
    assert_interior_invariants(&map);
}
