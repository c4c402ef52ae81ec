//! Property tests over the core algorithms.
//!
//! These exercise the public API with random inputs: coordinates, neighbour
//! run counting, shadowcasting, the turn queue and whole generated levels.

use std::collections::BTreeSet;

use hex_core::config::{GameConfig, LevelConfig};
use hex_core::error::GameError;
use hex_core::fov::visible_set;
use hex_core::grid::HexGrid;
use hex_core::hex::{count_groups, floodfill_set, Direction, HexShape, Pos};
use hex_core::map_generation::generate_level;
use hex_core::schedule::Schedule;
use hex_core::tile::Tile;
use hex_test_utils::determinism::{apply_input, strategies::*};
use hex_test_utils::fixtures::small_level_config;
use proptest::prelude::*;

/// Count cyclic runs of set bits by walking the ring once.
fn brute_force_runs(mask: u8) -> u32 {
    let bits: Vec<bool> = (0..6).map(|i| mask & (1 << i) != 0).collect();
    if bits.iter().all(|&b| b) {
        return 1;
    }
    let gap = bits.iter().position(|&b| !b).unwrap_or(0);
    let mut runs = 0;
    let mut inside = false;
    for step in 1..=6 {
        let bit = bits[(gap + step) % 6];
        if bit && !inside {
            runs += 1;
        }
        inside = bit;
    }
    runs
}

fn small_open_shape() -> impl Strategy<Value = HexShape> {
    (5u32..10, 0u32..6).prop_map(|(h, extra)| HexShape::new(h + h / 2 + extra, h))
}

// ============================================================================
// Coordinates
// ============================================================================

proptest! {
    #[test]
    fn prop_index_round_trip(shape in arb_shape(), pick in any::<prop::sample::Index>()) {
        let cells: Vec<Pos> = shape.positions().collect();
        let pos = cells[pick.index(cells.len())];
        prop_assert_eq!(shape.index(pos), Some(shape.xy2pos(pos.x, pos.y)));
        prop_assert_eq!(shape.pos2xy(shape.xy2pos(pos.x, pos.y)), pos);
    }

    #[test]
    fn prop_neighbors_at_distance_one(pos in arb_pos(), dir in arb_direction()) {
        prop_assert_eq!(pos.distance(pos + dir), 1);
        prop_assert_eq!(pos + dir + dir.opposite(), pos);
    }

    #[test]
    fn prop_distance_symmetric(a in arb_pos(), b in arb_pos()) {
        prop_assert_eq!(a.distance(b), b.distance(a));
        prop_assert_eq!(a.distance(b) == 0, a == b);
    }

    #[test]
    fn prop_count_groups_matches_brute_force(mask in arb_neighbor_mask()) {
        let origin = Pos::new(3, 4);
        let set: BTreeSet<Pos> = Direction::ALL
            .iter()
            .enumerate()
            .filter(|&(i, _)| mask & (1 << i) != 0)
            .map(|(_, &d)| origin + d)
            .collect();
        prop_assert_eq!(count_groups(origin, |p| set.contains(&p)), brute_force_runs(mask));
    }
}

// ============================================================================
// Field of view
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_open_room_fully_visible(shape in small_open_shape(), pick in any::<prop::sample::Index>()) {
        let tiles = HexGrid::new(shape, Tile::Floor);
        let cells: Vec<Pos> = shape.positions().collect();
        let center = cells[pick.index(cells.len())];

        let seen = visible_set(center, &tiles, Tile::is_clear);
        prop_assert_eq!(seen.len(), cells.len());
    }

    #[test]
    fn prop_open_room_symmetric(
        shape in small_open_shape(),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let tiles = HexGrid::new(shape, Tile::Floor);
        let cells: Vec<Pos> = shape.positions().collect();
        let a = cells[a.index(cells.len())];
        let b = cells[b.index(cells.len())];

        let from_a = visible_set(a, &tiles, Tile::is_clear);
        let from_b = visible_set(b, &tiles, Tile::is_clear);
        prop_assert_eq!(from_a.contains(&b), from_b.contains(&a));
    }

    #[test]
    fn prop_walled_cell_sees_only_ring(shape in small_open_shape()) {
        let mut tiles = HexGrid::new(shape, Tile::Floor);
        let center = shape.center();
        for dir in Direction::ALL {
            tiles.set(center + dir, Tile::Wall);
        }

        let seen = visible_set(center, &tiles, Tile::is_clear);
        let expected: BTreeSet<Pos> = std::iter::once(center)
            .chain(Direction::ALL.iter().map(|&d| center + d))
            .collect();
        prop_assert_eq!(seen, expected);
    }
}

// ============================================================================
// Scheduler
// ============================================================================

proptest! {
    #[test]
    fn prop_schedule_pops_in_order(delays in prop::collection::vec(0u32..50, 1..40)) {
        let mut schedule = Schedule::new();
        for (id, &delay) in delays.iter().enumerate() {
            schedule.push(id as u64, delay);
        }

        let mut popped = Vec::new();
        while let Some(entry) = schedule.pop() {
            prop_assert_eq!(schedule.time(), entry.0);
            popped.push(entry);
        }

        let mut expected: Vec<(u64, u64)> = delays
            .iter()
            .enumerate()
            .map(|(id, &d)| (u64::from(d), id as u64))
            .collect();
        expected.sort_unstable();
        prop_assert_eq!(popped, expected);
    }

    #[test]
    fn prop_clock_never_runs_backwards(delays in prop::collection::vec(0u32..10, 1..60)) {
        let mut schedule = Schedule::new();
        for id in 0..4 {
            schedule.push(id, 0);
        }
        let mut last = 0;
        for delay in delays {
            let (time, id) = schedule.pop_next().unwrap();
            prop_assert!(time >= last);
            last = time;
            schedule.push(id, delay);
        }
    }
}

// ============================================================================
// Generation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_generated_level_invariants(seed in arb_seed(), shape in arb_shape()) {
        let config = LevelConfig::default().with_size(shape.width(), shape.height());
        let level = match generate_level(&config, seed, shape.center()) {
            Ok(level) => level,
            Err(GameError::GenerationExhausted { .. }) => return Ok(()),
            Err(e) => return Err(TestCaseError::fail(e.to_string())),
        };

        // Outer ring is solid.
        for pos in shape.positions().filter(|&p| !shape.contains_inner(p)) {
            prop_assert_eq!(level.tiles.get(pos), Some(&Tile::Wall));
        }

        // Every walkable cell is reachable from the start.
        prop_assert!(level.tiles.get(level.start).is_some_and(|t| t.can_walk()));
        let reachable = floodfill_set(level.start, |p| {
            level.tiles.get(p).is_some_and(|t| t.can_walk())
        });
        prop_assert_eq!(reachable.len(), level.floor_count);

        // Snakes stand on distinct walkable cells away from the start.
        let snakes: BTreeSet<Pos> = level.snakes.iter().copied().collect();
        prop_assert_eq!(snakes.len(), level.snakes.len());
        prop_assert!(!snakes.contains(&level.start));
        for pos in &snakes {
            prop_assert!(level.tiles.get(*pos).is_some_and(|t| t.can_walk()));
        }
    }

    #[test]
    fn prop_play_keeps_player_on_floor(seed in arb_seed(), inputs in arb_input_sequence(30)) {
        let config = GameConfig::default().with_level(small_level_config());
        let mut game = hex_core::game::Game::new(config, seed).unwrap();
        let mut last_time = game.time();

        for input in inputs {
            apply_input(&mut game, input).unwrap();
            prop_assert!(game.is_awaiting_input());
            prop_assert!(game.time() >= last_time);
            last_time = game.time();

            let pos = game.player_position().unwrap();
            prop_assert!(game.level().tile(pos).is_some_and(|t| t.can_walk()));
            prop_assert_eq!(game.level().occupant(pos), Some(game.player()));
        }
    }
}
