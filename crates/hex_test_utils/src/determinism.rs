//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a game produces identical results
//! given an identical seed and identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Game state is kept in `BTreeMap`s and iterated in key order.
//!
//! - **System randomness**: Every random choice is drawn from the game's
//!   seeded [`hex_core::random::Alea`] stream.
//!
//! - **Float formatting**: retry seeds are hashed through their decimal
//!   form, so formatting must match bit for bit.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Level generation and scheduling from a fixed seed
//! 2. **Property tests**: Random seeds and input sequences replay exactly
//! 3. **Snapshot tests**: A restored game continues identically
//! 4. **Parallel tests**: Running N games on separate threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use serde::{Deserialize, Serialize};

use hex_core::config::GameConfig;
use hex_core::error::Result;
use hex_core::game::Game;
use hex_core::hex::Direction;

/// One player action, as recorded in input scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", content = "direction", rename_all = "snake_case")]
pub enum Input {
    /// Step one cell.
    Move(Direction),
    /// Pass the turn.
    Rest,
    /// Throw a spike.
    Cast(Direction),
}

/// Run the game up to the player's turn, then apply `input`.
pub fn apply_input(game: &mut Game, input: Input) -> Result<()> {
    game.run_until_input()?;
    match input {
        Input::Move(direction) => {
            game.move_player(direction)?;
        }
        Input::Rest => game.rest()?,
        Input::Cast(direction) => {
            game.cast(direction)?;
        }
    }
    game.run_until_input()?;
    Ok(())
}

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps applied per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic game).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the game was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Game is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Play the same inputs on `runs` fresh games from `seed` and compare.
///
/// A run whose game fails to build or rejects an input hashes as 0.
pub fn verify_game_determinism(
    config: &GameConfig,
    seed: u64,
    inputs: &[Input],
    runs: usize,
) -> DeterminismResult {
    let hashes: Vec<u64> = (0..runs)
        .map(|_| play(config, seed, inputs).map_or(0, |game| game.state_hash()))
        .collect();
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps: inputs.len() as u64,
    }
}

/// Build a game from `seed` and apply every input.
pub fn play(config: &GameConfig, seed: u64, inputs: &[Input]) -> Result<Game> {
    let mut game = Game::new(config.clone(), seed)?;
    for &input in inputs {
        apply_input(&mut game, input)?;
    }
    Ok(game)
}

/// Play the same inputs on `num_games` threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_games(
    config: &GameConfig,
    seed: u64,
    inputs: &[Input],
    num_games: usize,
) -> DeterminismResult {
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_games)
            .map(|_| s.spawn(|| play(config, seed, inputs).map_or(0, |game| game.state_hash())))
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps: inputs.len() as u64,
    }
}

/// Play two games side by side, finding the first input after which they
/// differ.
///
/// # Returns
///
/// `None` if the games stay identical, `Some(0)` if they differ before any
/// input, `Some(n)` if they diverge after the n-th input.
pub fn find_first_divergence<F>(setup_fn: F, inputs: &[Input]) -> Option<usize>
where
    F: Fn() -> Game,
{
    let mut game1 = setup_fn();
    let mut game2 = setup_fn();

    if game1.state_hash() != game2.state_hash() {
        return Some(0);
    }

    for (i, &input) in inputs.iter().enumerate() {
        let ok1 = apply_input(&mut game1, input).is_ok();
        let ok2 = apply_input(&mut game2, input).is_ok();

        if ok1 != ok2 || game1.state_hash() != game2.state_hash() {
            tracing::warn!(input = i + 1, ?input, "Games diverged");
            return Some(i + 1);
        }
    }

    None
}

/// Verify that a snapshot taken mid-game restores to a game that hashes
/// the same and keeps hashing the same under further inputs.
pub fn verify_snapshot_determinism(game: &Game, inputs: &[Input]) -> bool {
    let bytes = match game.snapshot().to_bytes() {
        Ok(b) => b,
        Err(_) => return false,
    };
    let restored = match hex_core::snapshot::Snapshot::from_bytes(&bytes).and_then(Game::restore) {
        Ok(g) => g,
        Err(_) => return false,
    };
    if restored.state_hash() != game.state_hash() {
        return false;
    }

    let mut original = game.clone();
    let mut restored = restored;
    for &input in inputs {
        if apply_input(&mut original, input).is_err() || apply_input(&mut restored, input).is_err() {
            return false;
        }
    }
    original.state_hash() == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing.
pub mod strategies {
    use proptest::prelude::*;

    use hex_core::hex::{Direction, HexShape, Pos};

    use super::Input;

    /// Any of the six directions.
    pub fn arb_direction() -> impl Strategy<Value = Direction> {
        (0usize..6).prop_map(Direction::from_index)
    }

    /// A level seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        0u64..100_000
    }

    /// A board wide enough for generation to succeed.
    ///
    /// Tall narrow rectangles hold too small a hexagon to pass the cave
    /// size check, so width grows with height.
    pub fn arb_shape() -> impl Strategy<Value = HexShape> {
        (9u32..20, 2u32..12).prop_map(|(h, extra)| HexShape::new(h + h / 2 + extra, h))
    }

    /// An axial position near the origin.
    pub fn arb_pos() -> impl Strategy<Value = Pos> {
        (-50i32..50, -50i32..50).prop_map(|(x, y)| Pos::new(x, y))
    }

    /// A position inside `shape`.
    pub fn arb_pos_in(shape: HexShape) -> impl Strategy<Value = Pos> {
        let cells: Vec<Pos> = shape.positions().collect();
        proptest::sample::select(cells)
    }

    /// Which of the six neighbours are set, one bit per direction.
    pub fn arb_neighbor_mask() -> impl Strategy<Value = u8> {
        0u8..64
    }

    /// One player action, mostly movement.
    pub fn arb_input() -> impl Strategy<Value = Input> {
        prop_oneof![
            6 => arb_direction().prop_map(Input::Move),
            2 => Just(Input::Rest),
            1 => arb_direction().prop_map(Input::Cast),
        ]
    }

    /// A sequence of player actions.
    pub fn arb_input_sequence(max_len: usize) -> impl Strategy<Value = Vec<Input>> {
        prop::collection::vec(arb_input(), 0..max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::*;
    use super::*;
    use hex_core::config::LevelConfig;
    use proptest::prelude::*;

    fn small_config() -> GameConfig {
        GameConfig::default().with_level(LevelConfig::default().with_size(24, 15))
    }

    fn walk_around() -> Vec<Input> {
        Direction::ALL
            .into_iter()
            .flat_map(|d| [Input::Move(d), Input::Move(d), Input::Rest])
            .chain([Input::Cast(Direction::East), Input::Cast(Direction::West)])
            .collect()
    }

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_new_game_determinism() {
        let result = verify_game_determinism(&GameConfig::default(), 42, &[], 3);
        result.assert_deterministic();
        assert_ne!(result.hashes[0], 0);
    }

    #[test]
    fn test_scripted_game_determinism() {
        let result = verify_game_determinism(&GameConfig::default(), 7, &walk_around(), 3);
        result.assert_deterministic();
        assert_ne!(result.hashes[0], 0);
    }

    #[test]
    fn test_resting_advances_clock() {
        let result = verify_determinism(
            2,
            20,
            || Game::new(small_config(), 11).unwrap(),
            |g| apply_input(g, Input::Rest).unwrap(),
            Game::time,
        );
        result.assert_deterministic();
        assert_eq!(result.hashes[0], 20);
    }

    #[test]
    fn test_find_divergence_on_identical_games() {
        let divergence = find_first_divergence(
            || Game::new(GameConfig::default(), 42).unwrap(),
            &walk_around(),
        );
        assert!(divergence.is_none(), "Expected no divergence");
    }

    #[test]
    fn test_find_divergence_on_different_seeds() {
        let seed = std::cell::Cell::new(0);
        let divergence = find_first_divergence(
            || {
                seed.set(seed.get() + 1);
                Game::new(GameConfig::default(), seed.get()).unwrap()
            },
            &[],
        );
        assert_eq!(divergence, Some(0));
    }

    // =========================================================================
    // Snapshot round-trip tests
    // =========================================================================

    #[test]
    fn test_snapshot_fresh_game() {
        let game = Game::new(GameConfig::default(), 42).unwrap();
        assert!(verify_snapshot_determinism(&game, &walk_around()));
    }

    #[test]
    fn test_snapshot_mid_game() {
        let game = play(&GameConfig::default(), 42, &walk_around()).unwrap();
        assert!(verify_snapshot_determinism(&game, &walk_around()));
    }

    // =========================================================================
    // Parallel tests
    // =========================================================================

    #[test]
    fn test_parallel_games() {
        let result = run_parallel_games(&GameConfig::default(), 3, &walk_around(), 4);
        result.assert_deterministic();
        assert_eq!(result.hashes.len(), 4);
    }

    #[test]
    fn test_input_script_format() {
        let script = r#"[{"action":"move","direction":"north_east"},{"action":"cast","direction":"west"}]"#;
        let inputs: Vec<Input> = serde_json::from_str(script).unwrap();
        assert_eq!(
            inputs,
            vec![Input::Move(Direction::NorthEast), Input::Cast(Direction::West)]
        );
        assert_eq!(serde_json::to_string(&Input::Rest).unwrap(), r#"{"action":"rest"}"#);
    }

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(compute_hash(&(1u32, "a")), compute_hash(&(1u32, "a")));
        assert_ne!(compute_hash(&1u32), compute_hash(&2u32));
    }

    // =========================================================================
    // Property-based tests using proptest
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Any seed and input sequence replays to the same state.
        #[test]
        fn prop_inputs_are_replayable(
            seed in arb_seed(),
            inputs in arb_input_sequence(30),
        ) {
            let result = verify_game_determinism(&small_config(), seed, &inputs, 2);
            prop_assert!(result.is_deterministic);
        }

        /// A snapshot restores exactly, whatever happened before it.
        #[test]
        fn prop_snapshot_roundtrip_is_exact(
            seed in arb_seed(),
            before in arb_input_sequence(15),
            after in arb_input_sequence(15),
        ) {
            let game = play(&small_config(), seed, &before).unwrap();
            prop_assert!(verify_snapshot_determinism(&game, &after));
        }
    }
}
