//! Batch level generation for tuning.
//!
//! Generates many levels in parallel using rayon and collects per-level
//! statistics, so generator parameters can be judged across seed ranges.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use hex_core::config::{GameConfig, LevelConfig};
use hex_core::error::Result as CoreResult;
use hex_core::game::Game;
use hex_core::hex::Direction;
use hex_core::map_generation::{generate_level, GeneratedLevel};
use hex_core::tile::Tile;

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Generator parameters
    pub level: LevelConfig,
    /// Number of levels to generate
    pub count: u32,
    /// First seed; level `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Maximum parallel generations (0 = use rayon default)
    pub parallel: u32,
    /// Where the JSON results go
    pub output: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            level: LevelConfig::default(),
            count: 100,
            seed_start: 0,
            parallel: 0,
            output: PathBuf::from("results/batch.json"),
        }
    }
}

impl BatchConfig {
    /// Create config for `count` levels
    pub fn new(count: u32) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }

    /// Set generator parameters
    pub fn with_level(mut self, level: LevelConfig) -> Self {
        self.level = level;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set output file
    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.output = path;
        self
    }
}

/// Statistics for one generated level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    /// Seed the level came from
    pub seed: u64,
    /// Attempts the generator needed
    pub attempts: u32,
    /// Main cave size before cleanup
    pub cave_size: usize,
    /// Walkable cells in the final level
    pub floor_count: usize,
    /// Tall grass cells
    pub tall_grass: usize,
    /// Short grass cells
    pub short_grass: usize,
    /// Player start
    pub start: (i32, i32),
    /// Hash of the final tiles
    pub tiles_hash: u64,
}

impl LevelStats {
    /// Summarise a generated level
    pub fn from_level(level: &GeneratedLevel) -> Self {
        let count = |wanted: Tile| level.tiles.iter().filter(|&(_, &t)| t == wanted).count();
        let mut hasher = DefaultHasher::new();
        for (_, tile) in level.tiles.iter() {
            tile.hash(&mut hasher);
        }
        Self {
            seed: level.seed,
            attempts: level.attempts,
            cave_size: level.cave_size,
            floor_count: level.floor_count,
            tall_grass: count(Tile::TallGrass),
            short_grass: count(Tile::ShortGrass),
            start: (level.start.x, level.start.y),
            tiles_hash: hasher.finish(),
        }
    }
}

/// Aggregate statistics over a batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Levels generated
    pub total_levels: usize,
    /// Mean attempts per level
    pub mean_attempts: f64,
    /// Most attempts any level needed
    pub max_attempts: u32,
    /// Mean walkable cells
    pub mean_floor: f64,
    /// Fewest walkable cells
    pub min_floor: usize,
    /// Most walkable cells
    pub max_floor: usize,
    /// Share of walkable cells that are grass
    pub grass_ratio: f64,
}

impl BatchSummary {
    /// Aggregate per-level stats
    #[allow(clippy::cast_precision_loss)]
    pub fn from_levels(levels: &[LevelStats]) -> Self {
        if levels.is_empty() {
            return Self::default();
        }
        let n = levels.len() as f64;
        let floor: usize = levels.iter().map(|l| l.floor_count).sum();
        let grass: usize = levels.iter().map(|l| l.tall_grass + l.short_grass).sum();
        Self {
            total_levels: levels.len(),
            mean_attempts: levels.iter().map(|l| f64::from(l.attempts)).sum::<f64>() / n,
            max_attempts: levels.iter().map(|l| l.attempts).max().unwrap_or(0),
            mean_floor: floor as f64 / n,
            min_floor: levels.iter().map(|l| l.floor_count).min().unwrap_or(0),
            max_floor: levels.iter().map(|l| l.floor_count).max().unwrap_or(0),
            grass_ratio: grass as f64 / floor.max(1) as f64,
        }
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Per-level statistics, in seed order
    pub levels: Vec<LevelStats>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Seeds the generator gave up on
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run a batch of generations
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        count = config.count,
        seed_start = config.seed_start,
        width = config.level.width,
        height = config.level.height,
        "Starting batch run"
    );

    // Configure thread pool if specified
    if config.parallel > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let center = config.level.shape().center();
    let results: Vec<Result<LevelStats, BatchError>> = (0..config.count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            let outcome = generate_level(&config.level, seed, center);

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 100 == 0 {
                debug!("Progress: {}/{}", done, config.count);
            }

            outcome
                .map(|level| LevelStats::from_level(&level))
                .map_err(|e| {
                    warn!(seed, error = %e, "Generation failed");
                    BatchError {
                        seed,
                        message: e.to_string(),
                    }
                })
        })
        .collect();

    let (levels, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let levels: Vec<LevelStats> = levels.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_levels(&levels);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        levels = levels.len(),
        failed = errors.len(),
        duration_secs = format!("{duration_seconds:.2}"),
        "Batch complete"
    );

    BatchResults {
        config,
        levels,
        summary,
        duration_seconds,
        errors,
    }
}

/// Play a fixed script of `turns` inputs and return the final state hash.
///
/// The script tries to walk in each direction in turn and rests when
/// blocked, so it touches movement, trampling and the monsters' turns.
pub fn scripted_hash(config: &GameConfig, seed: u64, turns: u32) -> CoreResult<u64> {
    let mut game = Game::new(config.clone(), seed)?;
    for turn in 0..turns {
        let direction = Direction::from_index(turn as usize);
        let here = game.player_position()?;
        if game.level().can_enter(here + direction) {
            game.move_player(direction)?;
        } else {
            game.rest()?;
        }
        game.run_until_input()?;
    }
    Ok(game.state_hash())
}

/// Verify determinism by playing the same seed several times
pub fn verify_determinism(config: &GameConfig, seed: u64, runs: u32, turns: u32) -> bool {
    let hashes: Vec<u64> = match (0..runs.max(1))
        .map(|_| scripted_hash(config, seed, turns))
        .collect::<CoreResult<_>>()
    {
        Ok(h) => h,
        Err(e) => {
            warn!(seed, error = %e, "Determinism run failed");
            return false;
        }
    };

    hashes.windows(2).all(|w| w[0] == w[1])
}
