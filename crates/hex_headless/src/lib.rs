//! Headless driver for hex adventure.
//!
//! Everything here runs without a screen:
//!
//! - **Level tuning**: generate and render levels as ASCII, or batch-generate
//!   thousands of seeds and collect statistics
//! - **Determinism checks**: replay the same seed and compare state hashes
//! - **Scripted play**: drive a game with JSON commands on stdin
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (move, rest, cast, view, ...)
//! - **stdout**: Responses (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Draw a level
//! cargo run -p hex_headless -- generate --seed 7
//!
//! # Play through a pipe
//! echo '{"cmd":"move","direction":"east"}' | cargo run -p hex_headless -- play --seed 7
//!
//! # Check a seed replays identically
//! cargo run -p hex_headless -- verify --seed 7 --runs 5
//! ```

pub mod ascii_visualizer;
pub mod batch;
pub mod error;
pub mod protocol;
pub mod runner;
pub mod store;

pub use ascii_visualizer::{render_level, render_view, AsciiConfig};
pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary, LevelStats};
pub use error::{load_game_config, ConfigError};
pub use protocol::{Command, Response};
pub use runner::HeadlessRunner;
pub use store::FileStore;
