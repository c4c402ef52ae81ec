//! # Hex Core
//!
//! Deterministic core of a hex-grid roguelike.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//!
//! Every random choice is drawn from a seeded [`random::Alea`] stream, so a
//! seed and a sequence of inputs always reproduce the same game. Front ends
//! drive it through [`game::Game`], draw it through [`game::Game::view`]
//! and persist it through a [`snapshot::SaveStore`].
//!
//! ## Crate Structure
//!
//! - [`hex`] - Hex coordinates, directions and the hexagon shape
//! - [`grid`] - Hexagon-shaped storage
//! - [`random`] - The Alea generator
//! - [`map_generation`] - Cave carving and level dressing
//! - [`fov`] - Shadowcasting field of view
//! - [`schedule`] - The turn queue
//! - [`game`] - The game loop and player input
//! - [`behavior`] - What each kind of entity does on its turn

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod behavior;
pub mod config;
pub mod entity;
pub mod error;
pub mod fov;
pub mod game;
pub mod grid;
pub mod hex;
pub mod level;
pub mod map_generation;
pub mod random;
pub mod schedule;
pub mod snapshot;
pub mod tile;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::behavior::BehaviorKind;
    pub use crate::config::{GameConfig, LevelConfig};
    pub use crate::entity::{Entity, EntityId, EntityStore};
    pub use crate::error::{GameError, Result};
    pub use crate::fov::{shadowcast, Visibility};
    pub use crate::game::{Game, Step};
    pub use crate::grid::HexGrid;
    pub use crate::hex::{Direction, HexShape, Pos};
    pub use crate::level::Level;
    pub use crate::map_generation::{generate_level, GeneratedLevel};
    pub use crate::random::Alea;
    pub use crate::schedule::{Delay, Schedule};
    pub use crate::snapshot::{MemoryStore, SaveStore, Snapshot, SNAPSHOT_VERSION};
    pub use crate::tile::Tile;
    pub use crate::view::{CellView, Opacity};
}
