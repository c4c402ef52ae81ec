//! Headless hex adventure driver.
//!
//! This binary generates levels, checks determinism and plays games without
//! a screen, controlled via JSON on stdin/stdout.
//!
//! # Usage
//!
//! ```bash
//! # Draw one level
//! cargo run -p hex_headless -- generate --seed 7 --width 60 --height 35
//!
//! # Verify a seed replays identically
//! cargo run -p hex_headless -- verify --seed 7 --runs 5
//!
//! # Collect generator statistics over many seeds
//! cargo run -p hex_headless -- batch --from 0 --count 1000 --output results/batch.json
//!
//! # Play over stdin/stdout, saving to disk
//! cargo run -p hex_headless -- play --seed 7 --save saves/game.bin
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hex_core::config::GameConfig;
use hex_core::map_generation::generate_level;
use hex_core::snapshot::{MemoryStore, SaveStore};
use hex_headless::{
    ascii_visualizer::{render_level, AsciiConfig},
    batch::{run_batch, verify_determinism, BatchConfig},
    error::load_game_config,
    runner::HeadlessRunner,
    store::FileStore,
};

#[derive(Parser)]
#[command(name = "hexadv")]
#[command(about = "Headless hex adventure: level generation, determinism checks and scripted play")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Game config file (RON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one level and print it as ASCII
    Generate {
        /// Level seed
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Override the level width
        #[arg(long)]
        width: Option<u32>,

        /// Override the level height
        #[arg(long)]
        height: Option<u32>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Verify determinism by playing the same seed multiple times
    Verify {
        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Scripted turns per run
        #[arg(short, long, default_value = "200")]
        turns: u32,
    },

    /// Generate a batch of levels and record statistics
    Batch {
        /// First seed
        #[arg(long, default_value = "0")]
        from: u64,

        /// Number of levels to generate
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Maximum parallel generations (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output JSON file
        #[arg(short, long, default_value = "results/batch.json")]
        output: PathBuf,
    },

    /// Play a game over JSON lines on stdin/stdout
    Play {
        /// Level seed
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Save file for the `save` and `load` commands (in memory if omitted)
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Generate {
            seed,
            width,
            height,
            no_color,
        } => cmd_generate(config, seed, width, height, no_color),
        Commands::Verify { seed, runs, turns } => cmd_verify(&config, seed, runs, turns),
        Commands::Batch {
            from,
            count,
            parallel,
            output,
        } => cmd_batch(config, from, count, parallel, output),
        Commands::Play { seed, save } => cmd_play(config, seed, save),
    }
}

fn fail(message: &str, error: &dyn std::fmt::Display) -> ! {
    tracing::error!(error = %error, "{message}");
    std::process::exit(1);
}

fn load_config(path: Option<&Path>) -> GameConfig {
    match path {
        Some(path) => {
            load_game_config(path).unwrap_or_else(|e| fail("Failed to load config", &e))
        }
        None => GameConfig::default(),
    }
}

/// Generate and draw one level
fn cmd_generate(
    mut config: GameConfig,
    seed: u64,
    width: Option<u32>,
    height: Option<u32>,
    no_color: bool,
) {
    if let Some(width) = width {
        config.level.width = width;
    }
    if let Some(height) = height {
        config.level.height = height;
    }
    if let Err(e) = config.validate("command line") {
        fail("Invalid level size", &e);
    }

    let level = generate_level(&config.level, seed, config.level.shape().center())
        .unwrap_or_else(|e| fail("Generation failed", &e));

    let ascii = AsciiConfig {
        use_color: !no_color,
        show_legend: true,
    };
    print!("{}", render_level(&level, &ascii));
}

/// Verify determinism
fn cmd_verify(config: &GameConfig, seed: u64, runs: u32, turns: u32) {
    tracing::info!(seed, runs, turns, "Verifying determinism");

    if verify_determinism(config, seed, runs, turns) {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        std::process::exit(1);
    }
}

/// Run a batch of generations
fn cmd_batch(config: GameConfig, from: u64, count: u32, parallel: u32, output: PathBuf) {
    let mut batch = BatchConfig::new(count)
        .with_level(config.level)
        .with_seed(from)
        .with_output(output);
    batch.parallel = parallel;

    let results = run_batch(batch);
    if let Err(e) = results.save(&results.config.output) {
        fail("Failed to save results", &e);
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Levels generated: {}", summary.total_levels);
    if !results.errors.is_empty() {
        eprintln!("Levels FAILED: {}", results.errors.len());
        for error in results.errors.iter().take(10) {
            eprintln!("  seed {}: {}", error.seed, error.message);
        }
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Attempts: mean {:.2}, max {}",
        summary.mean_attempts, summary.max_attempts
    );
    eprintln!(
        "Floor cells: mean {:.1}, range {}..={}",
        summary.mean_floor, summary.min_floor, summary.max_floor
    );
    eprintln!("Grass ratio: {:.1}%", summary.grass_ratio * 100.0);
    eprintln!("\nResults saved to: {}", results.config.output.display());
}

/// Play over stdin/stdout
fn cmd_play(config: GameConfig, seed: u64, save: Option<PathBuf>) {
    tracing::info!(seed, "Starting interactive session");

    let store: Box<dyn SaveStore> = match save {
        Some(path) => Box::new(FileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };

    let mut runner = HeadlessRunner::with_store(config, seed, store)
        .unwrap_or_else(|e| fail("Failed to start game", &e));

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = runner.run(stdin.lock(), stdout.lock()) {
        fail("Session I/O failed", &e);
    }
}
