//! JSON protocol for headless play.
//!
//! The runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready",...}` once the player is up
//! 2. Controller sends one command per line
//! 3. Every command gets exactly one response line
//! 4. `quit` (or end of input) ends the session with `{"type":"bye"}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","seed":42,"time":0,"width":48,"height":31}
//! -> {"cmd":"move","direction":"east"}
//! <- {"type":"turn","cmd":"move","time":1,"x":25,"y":15,"moved":true,"spike":null,"turns":1,"hash":...}
//! -> {"cmd":"cast","direction":"west"}
//! <- {"type":"turn","cmd":"cast","time":2,"x":25,"y":15,"moved":null,"spike":7,"turns":4,"hash":...}
//! -> {"cmd":"hash"}
//! <- {"type":"state_hash","time":2,"hash":...}
//! ```

use serde::{Deserialize, Serialize};

use hex_core::entity::EntityId;
use hex_core::hex::Direction;
use hex_core::view::CellView;

/// Protocol version reported in the ready line.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Step the player one cell.
    Move { direction: Direction },

    /// Pass the player's turn.
    Rest,

    /// Throw a spike.
    Cast { direction: Direction },

    /// Report what the player can see and remembers.
    View {
        /// Also render the view as ASCII.
        #[serde(default)]
        ascii: bool,
    },

    /// Report the state hash (for determinism verification).
    Hash,

    /// Write the game to the save store.
    Save,

    /// Replace the game with the one in the save store.
    Load,

    /// End the session.
    Quit,
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        version: String,
        seed: u64,
        time: u64,
        width: u32,
        height: u32,
    },

    /// The player acted and the world ran until their next turn.
    Turn {
        cmd: String,
        time: u64,
        x: i32,
        y: i32,
        /// For `move`: whether the player changed cells.
        moved: Option<bool>,
        /// For `cast`: the spike's entity id.
        spike: Option<EntityId>,
        /// Other entities' turns run before the player was up again.
        turns: u32,
        hash: u64,
    },

    /// Cells the player can see or remembers.
    View {
        time: u64,
        cells: Vec<CellView>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ascii: Option<String>,
    },

    /// State hash for determinism verification.
    StateHash { time: u64, hash: u64 },

    /// Acknowledgment of a command with no other output.
    Ack { cmd: String },

    /// A saved game was loaded.
    Loaded { seed: u64, time: u64, hash: u64 },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"type":"error","message":"Serialization failed: {}"}}"#,
                e
            )
        });
        json.push('\n');
        json
    }
}

impl Command {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Rest => "rest",
            Self::Cast { .. } => "cast",
            Self::View { .. } => "view",
            Self::Hash => "hash",
            Self::Save => "save",
            Self::Load => "load",
            Self::Quit => "quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move_command() {
        let json = r#"{"cmd":"move","direction":"south_west"}"#;
        let cmd = Command::from_json(json).unwrap();
        assert_eq!(
            cmd,
            Command::Move {
                direction: Direction::SouthWest
            }
        );
        assert_eq!(cmd.name(), "move");
    }

    #[test]
    fn test_parse_unit_commands() {
        assert_eq!(Command::from_json(r#"{"cmd":"rest"}"#).unwrap(), Command::Rest);
        assert_eq!(Command::from_json(r#"{"cmd":"quit"}"#).unwrap(), Command::Quit);
        assert_eq!(Command::from_json(r#"{"cmd":"hash"}"#).unwrap(), Command::Hash);
    }

    #[test]
    fn test_view_ascii_defaults_off() {
        let cmd = Command::from_json(r#"{"cmd":"view"}"#).unwrap();
        assert_eq!(cmd, Command::View { ascii: false });
    }

    #[test]
    fn test_bad_direction_rejected() {
        assert!(Command::from_json(r#"{"cmd":"move","direction":"up"}"#).is_err());
    }

    #[test]
    fn test_serialize_turn_response() {
        let resp = Response::Turn {
            cmd: "move".to_string(),
            time: 3,
            x: 4,
            y: 5,
            moved: Some(true),
            spike: None,
            turns: 2,
            hash: 12345,
        };
        let json = resp.to_json_line();
        assert!(json.ends_with('\n'));
        assert!(json.contains(r#""type":"turn""#));
        assert!(json.contains(r#""time":3"#));
        assert!(json.contains(r#""moved":true"#));
    }

    #[test]
    fn test_serialize_error_response() {
        let json = Response::error("nope", Some("cast")).to_json_line();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains(r#""cmd":"cast""#));
    }
}
