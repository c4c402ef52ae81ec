//! Procedural cave generation on a hexagon.
//!
//! Each attempt runs these passes in order, all driven by one seeded
//! [`Alea`] stream:
//!
//! 1. Start from solid wall with the player's cell dug out.
//! 2. Carve: visit inner cells in shuffled order and dig out any wall
//!    whose floor neighbours do not form exactly one contiguous run.
//! 3. Remove wall specks smaller than [`LevelConfig::min_wall_group`].
//! 4. Wall over every floor cell the player cannot reach.
//! 5. If the remaining cave is under a quarter of the board, start over
//!    with a seed drawn from the stream.
//! 6. Fill dead ends and two- or three-cell nooks.
//! 7. Dress open areas with grass using visibility counts and noise.
//!
//! The carve and the cleanup passes read the grid as they mutate it, so
//! visiting order changes the result and is fixed here.

use noise::{NoiseFn, OpenSimplex};
use serde::{Deserialize, Serialize};

use crate::config::LevelConfig;
use crate::error::{GameError, Result};
use crate::fov::visible_set;
use crate::grid::HexGrid;
use crate::hex::{count_groups, floodfill, floodfill_set, surrounded, Direction, HexShape, Pos};
use crate::random::Alea;
use crate::tile::Tile;

/// A finished level layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedLevel {
    /// Terrain.
    pub tiles: HexGrid<Tile>,
    /// Where the player starts. May differ from the requested start if
    /// cleanup walled that cell.
    pub start: Pos,
    /// Seed the level was requested with.
    pub seed: u64,
    /// Attempts used, counting the successful one.
    pub attempts: u32,
    /// Size of the main cave when the attempt was accepted.
    pub cave_size: usize,
    /// Walkable cells after cleanup and dressing.
    pub floor_count: usize,
    /// Cells visible from each floor cell, zero for walls.
    pub visibility: HexGrid<u32>,
    /// Snake spawn cells.
    pub snakes: Vec<Pos>,
    /// Generator state after population, for continuing the stream.
    pub rng: Alea,
}

/// Generate a level for `config` from `seed`, digging out `start` first.
///
/// # Errors
///
/// [`GameError::InvalidStart`] if `start` is not an inner cell, and
/// [`GameError::GenerationExhausted`] if no attempt within
/// [`LevelConfig::max_attempts`] produced a large enough cave.
pub fn generate_level(config: &LevelConfig, seed: u64, start: Pos) -> Result<GeneratedLevel> {
    let shape = config.shape();
    if !shape.contains_inner(start) {
        return Err(GameError::InvalidStart {
            x: start.x,
            y: start.y,
        });
    }

    let threshold = config.min_cave_size();
    let mut rng = Alea::from_seed_u64(seed);
    for attempt in 1..=config.max_attempts {
        let rand_seed = rng.random();

        let mut builder = CaveBuilder::new(config, shape, start);
        builder.carve_caves(&mut rng);
        builder.remove_small_walls();
        let cave_size = builder.remove_other_caves();

        if cave_size < threshold {
            tracing::warn!(
                seed,
                attempt,
                cave_size,
                threshold,
                "Cave too small, regenerating"
            );
            rng = Alea::from_seed_f64(rand_seed);
            continue;
        }

        builder.fill_small_caves();
        let visibility = builder.count_visibility();
        if config.grass {
            builder.place_grass(&visibility, rand_seed);
        }
        let snakes = builder.place_snakes(&mut rng);
        let floor_count = builder.tiles.iter().filter(|(_, t)| t.can_walk()).count();

        tracing::info!(
            seed,
            attempts = attempt,
            cave_size,
            floor_count,
            snakes = snakes.len(),
            "Level generated"
        );

        return Ok(GeneratedLevel {
            tiles: builder.tiles,
            start: builder.player,
            seed,
            attempts: attempt,
            cave_size,
            floor_count,
            visibility,
            snakes,
            rng,
        });
    }

    tracing::warn!(seed, attempts = config.max_attempts, "Level generation exhausted");
    Err(GameError::GenerationExhausted {
        attempts: config.max_attempts,
    })
}

struct WallFlood {
    seen: HexGrid<bool>,
    members: Vec<Pos>,
}

/// Mutable state of one generation attempt.
struct CaveBuilder<'a> {
    config: &'a LevelConfig,
    shape: HexShape,
    tiles: HexGrid<Tile>,
    player: Pos,
}

impl<'a> CaveBuilder<'a> {
    fn new(config: &'a LevelConfig, shape: HexShape, start: Pos) -> Self {
        let mut tiles = HexGrid::new(shape, Tile::Wall);
        tiles.set(start, Tile::Floor);
        Self {
            config,
            shape,
            tiles,
            player: start,
        }
    }

    fn is_floor(&self, pos: Pos) -> bool {
        self.tiles.get(pos) == Some(&Tile::Floor)
    }

    fn is_wall(&self, pos: Pos) -> bool {
        self.tiles.get(pos) == Some(&Tile::Wall)
    }

    fn floor_groups(&self, pos: Pos) -> u32 {
        count_groups(pos, |p| self.is_floor(p))
    }

    /// A floor cell whose floor neighbours form a single run.
    fn is_cave(&self, pos: Pos) -> bool {
        self.is_floor(pos) && self.floor_groups(pos) == 1
    }

    fn is_not_cave(&self, pos: Pos) -> bool {
        self.is_wall(pos) || self.floor_groups(pos) != 1
    }

    fn is_dead_end(&self, pos: Pos) -> bool {
        self.is_cave(pos) && surrounded(pos, |p| self.is_not_cave(p))
    }

    fn carve_caves(&mut self, rng: &mut Alea) {
        let mut order: Vec<Pos> = self.shape.inner_positions().collect();
        rng.shuffle(&mut order);
        for pos in order {
            if self.is_wall(pos) && self.floor_groups(pos) != 1 {
                self.tiles.set(pos, Tile::Floor);
            }
        }
    }

    fn remove_small_walls(&mut self) {
        let shape = self.shape;
        let mut flood = WallFlood {
            seen: HexGrid::new(shape, false),
            members: Vec::new(),
        };
        for pos in shape.inner_positions() {
            flood.members.clear();
            let tiles = &self.tiles;
            floodfill(
                pos,
                &mut flood,
                |f, p| tiles.get(p) == Some(&Tile::Wall) && !f.seen.get_or(p, true),
                |f, p| {
                    f.seen.set(p, true);
                    f.members.push(p);
                },
            );
            if flood.members.len() < self.config.min_wall_group {
                for &p in &flood.members {
                    self.tiles.set(p, Tile::Floor);
                }
            }
        }
    }

    /// Wall over floor the player cannot reach. Returns the main cave size.
    fn remove_other_caves(&mut self) -> usize {
        let main = floodfill_set(self.player, |p| self.is_floor(p));
        let mut reached = HexGrid::new(self.shape, false);
        for &pos in &main {
            reached.set(pos, true);
        }
        let shape = self.shape;
        for pos in shape.inner_positions() {
            if self.is_floor(pos) && !reached.get_or(pos, false) {
                self.tiles.set(pos, Tile::Wall);
            }
        }
        main.len()
    }

    /// Wall over `pos` and move the player off it if needed.
    fn wall_over(&mut self, pos: Pos) {
        self.tiles.set(pos, Tile::Wall);
        if pos == self.player {
            if let Some(next) = pos.neighbors().into_iter().find(|&n| self.is_floor(n)) {
                self.player = next;
            }
        }
    }

    /// Fill a dead end at `pos` and cascade into its neighbours.
    ///
    /// Runs on an explicit stack in the same order as the recursive
    /// definition. Returns whether anything was filled.
    fn fill_dead_end(&mut self, pos: Pos) -> bool {
        if !self.is_dead_end(pos) {
            return false;
        }
        self.tiles.set(pos, Tile::Wall);

        let mut stack: Vec<(Pos, usize)> = vec![(pos, 0)];
        while let Some(frame) = stack.last_mut() {
            if frame.1 >= Direction::ALL.len() {
                stack.pop();
                continue;
            }
            let (current, dir) = (frame.0, Direction::from_index(frame.1));
            frame.1 += 1;

            let neighbor = current + dir;
            if current == self.player && self.is_floor(neighbor) {
                self.player = neighbor;
            }
            if self.is_dead_end(neighbor) {
                self.tiles.set(neighbor, Tile::Wall);
                stack.push((neighbor, 0));
            }
        }
        true
    }

    /// One sweep over inner cells. Returns whether anything changed.
    fn fill_small_caves_pass(&mut self) -> bool {
        let mut changed = false;
        let shape = self.shape;
        for pos in shape.inner_positions() {
            changed |= self.fill_dead_end(pos);

            let cave = floodfill_set(pos, |p| self.is_cave(p));
            if cave.len() == 2 || cave.len() == 3 {
                self.wall_over(pos);
                changed = true;
                for member in cave {
                    self.fill_dead_end(member);
                }
            }
        }
        changed
    }

    /// Sweep until a pass leaves the grid unchanged.
    fn fill_small_caves(&mut self) {
        let mut passes = 1;
        while self.fill_small_caves_pass() {
            passes += 1;
        }
        tracing::trace!(passes, "Small caves filled");
    }

    fn count_visibility(&self) -> HexGrid<u32> {
        let mut visibility = HexGrid::new(self.shape, 0u32);
        for pos in self.shape.inner_positions() {
            if self.is_floor(pos) {
                let seen = visible_set(pos, &self.tiles, |t| t == Tile::Floor);
                visibility.set(pos, u32::try_from(seen.len()).unwrap_or(u32::MAX));
            }
        }
        visibility
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn place_grass(&mut self, visibility: &HexGrid<u32>, rand_seed: f64) {
        let noise = OpenSimplex::new((rand_seed * 65_536.0).floor() as u32);
        let zoom = self.config.noise_zoom;
        let shape = self.shape;
        for pos in shape.inner_positions() {
            if self.is_wall(pos) {
                continue;
            }
            let (x, y) = (f64::from(pos.x), f64::from(pos.y));
            let z = -x - y;
            let density = noise.get([x / zoom, y / zoom, z / zoom]) + 1.0;
            let seen = f64::from(visibility.get_or(pos, 0));
            if seen < self.config.tall_grass_threshold * density {
                self.tiles.set(pos, Tile::TallGrass);
            } else if seen < self.config.short_grass_threshold * density {
                self.tiles.set(pos, Tile::ShortGrass);
            }
        }
    }

    fn place_snakes(&self, rng: &mut Alea) -> Vec<Pos> {
        let mut floors: Vec<Pos> = self
            .tiles
            .iter()
            .filter(|&(pos, tile)| tile.can_walk() && pos != self.player)
            .map(|(pos, _)| pos)
            .collect();
        rng.shuffle(&mut floors);
        floors.truncate(self.config.snakes as usize);
        floors
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;

    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;

    fn default_level(seed: u64) -> GeneratedLevel {
        let config = LevelConfig::default();
        generate_level(&config, seed, config.shape().center()).unwrap()
    }

    fn walkable(level: &GeneratedLevel) -> HashSet<Pos> {
        level
            .tiles
            .iter()
            .filter(|(_, t)| t.can_walk())
            .map(|(p, _)| p)
            .collect()
    }

    #[test]
    fn test_seed_42_scenario() {
        let level = default_level(42);
        assert!(level.attempts <= 4, "took {} attempts", level.attempts);
        assert!(level.cave_size >= 48 * 31 / 4);
        assert_eq!(level.tiles.get(level.start).map(|t| t.can_walk()), Some(true));
    }

    #[test]
    fn test_deterministic() {
        let a = default_level(7);
        let b = default_level(7);
        assert_eq!(a.tiles, b.tiles);
        assert_eq!(a.start, b.start);
        assert_eq!(a.snakes, b.snakes);
    }

    #[test]
    fn test_different_seeds_differ() {
        assert_ne!(default_level(1).tiles, default_level(2).tiles);
    }

    #[test]
    fn test_connected_from_start() {
        for seed in [3, 11, 42] {
            let level = default_level(seed);
            let floors = walkable(&level);
            let reached: HashSet<Pos> = floodfill_set(level.start, |p| floors.contains(&p))
                .into_iter()
                .collect();
            assert_eq!(reached, floors, "seed {seed} has disconnected floor");
        }
    }

    #[test]
    fn test_outer_ring_is_wall() {
        let level = default_level(5);
        let shape = level.tiles.shape();
        for (pos, &tile) in level.tiles.iter() {
            if !shape.contains_inner(pos) {
                assert_eq!(tile, Tile::Wall, "{pos:?}");
            }
        }
    }

    #[test]
    fn test_no_small_nooks() {
        let config = LevelConfig::default().with_grass(false);
        for seed in [8, 42, 99] {
            let level = generate_level(&config, seed, config.shape().center()).unwrap();
            let floor = |p: Pos| level.tiles.get(p) == Some(&Tile::Floor);
            let is_cave = |p: Pos| floor(p) && count_groups(p, floor) == 1;
            let mut seen = HashSet::new();
            for pos in level.tiles.shape().inner_positions() {
                if seen.contains(&pos) || !is_cave(pos) {
                    continue;
                }
                let cave = floodfill_set(pos, is_cave);
                seen.extend(cave.iter().copied());
                assert!(
                    !(2..=3).contains(&cave.len()),
                    "seed {seed}: nook of {} at {pos:?}",
                    cave.len()
                );
            }
        }
    }

    #[test]
    fn test_snakes_on_distinct_floor() {
        let level = default_level(13);
        assert_eq!(level.snakes.len(), 3);
        let unique: HashSet<Pos> = level.snakes.iter().copied().collect();
        assert_eq!(unique.len(), 3);
        for &snake in &level.snakes {
            assert_ne!(snake, level.start);
            assert!(level.tiles.get(snake).is_some_and(|t| t.can_walk()));
        }
    }

    #[test]
    fn test_grass_disabled() {
        let config = LevelConfig::default().with_grass(false);
        let level = generate_level(&config, 42, config.shape().center()).unwrap();
        assert!(level
            .tiles
            .iter()
            .all(|(_, &t)| t == Tile::Wall || t == Tile::Floor));
    }

    #[test]
    fn test_visibility_zero_on_walls() {
        let level = default_level(21);
        for (pos, &seen) in level.visibility.iter() {
            if level.tiles.get(pos) == Some(&Tile::Wall) {
                assert_eq!(seen, 0);
            }
        }
    }

    #[test]
    fn test_invalid_start() {
        let config = LevelConfig::default();
        let err = generate_level(&config, 1, Pos::new(0, 0)).unwrap_err();
        assert!(matches!(err, GameError::InvalidStart { x: 0, y: 0 }));
    }

    #[test]
    fn test_exhaustion() {
        let config = LevelConfig::default().with_size(7, 7).with_max_attempts(2);
        let start = config.shape().center();
        match generate_level(&config, 1, start) {
            Err(GameError::GenerationExhausted { attempts }) => assert_eq!(attempts, 2),
            Ok(level) => assert!(level.cave_size >= config.min_cave_size()),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[derive(Clone, Default)]
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, AtomicOrdering::SeqCst);
            }
        }
    }

    #[test]
    fn test_retries_warn() {
        let config = LevelConfig::default().with_size(20, 13).with_grass(false);
        let start = config.shape().center();
        for seed in 0..20 {
            let counter = WarnCounter::default();
            let subscriber = tracing_subscriber::registry().with(counter.clone());
            let result = tracing::subscriber::with_default(subscriber, || {
                generate_level(&config, seed, start)
            });
            let warnings = counter.0.load(AtomicOrdering::SeqCst);
            match result {
                Ok(level) => assert_eq!(warnings, level.attempts as usize - 1),
                Err(GameError::GenerationExhausted { attempts }) => {
                    assert_eq!(warnings, attempts as usize + 1);
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
    }
}
