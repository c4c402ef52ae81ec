//! Error types for the game core.

use thiserror::Error;

use crate::entity::EntityId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game core errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Level generation kept producing undersized caves.
    #[error("Level generation exhausted after {attempts} attempts")]
    GenerationExhausted {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// A checked lookup fell outside the rectangular backing store.
    #[error("Position ({x}, {y}) is outside the grid")]
    OutOfBounds {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },

    /// The starting position is not an inner cell of the hexagon.
    #[error("Start position ({x}, {y}) is not an inner hexagon cell")]
    InvalidStart {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },

    /// Nothing is left to act. The player must always be scheduled.
    #[error("Schedule underflow: no entity left to act")]
    ScheduleUnderflow,

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// An input entry point was used while the loop is not parked on the player.
    #[error("Game is not awaiting player input")]
    NotAwaitingInput,

    /// Binary or text serialization failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Configuration parsing error.
    #[error("Failed to parse config '{source_name}': {message}")]
    ConfigParse {
        /// Name of the config source (file path or label).
        source_name: String,
        /// Error message.
        message: String,
    },

    /// Persistence backend failure.
    #[error("IO error: {0}")]
    Io(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}
