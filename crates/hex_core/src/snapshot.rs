//! Serializable game state and the persistence port.
//!
//! The core never touches storage itself. Front ends hand it a
//! [`SaveStore`] and it reads or writes [`Snapshot`]s through that.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::entity::{EntityId, EntityStore};
use crate::error::{GameError, Result};
use crate::hex::Pos;
use crate::level::Level;
use crate::random::Alea;
use crate::schedule::Schedule;

/// Snapshot format version for compatibility.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to resume a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version.
    pub version: u32,
    /// Seed the level was generated from.
    pub seed: u64,
    /// Rules in effect.
    pub config: GameConfig,
    /// Pending turns and the clock.
    pub schedule: Schedule,
    /// All entities and their components.
    pub entities: EntityStore,
    /// Terrain and occupants.
    pub level: Level,
    /// Game random stream.
    pub rng: Alea,
    /// Trampled grass countdowns.
    pub grass_regrowth: BTreeMap<Pos, u32>,
    /// The player's id.
    pub player: EntityId,
    /// Entity the loop is parked on, if any.
    pub current: Option<EntityId>,
}

impl Snapshot {
    /// Game clock at the time of capture.
    #[must_use]
    pub const fn time(&self) -> u64 {
        self.schedule.time()
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Serialization(format!("Failed to serialize snapshot: {e}")))
    }

    /// Decode from bincode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| GameError::Serialization(format!("Failed to deserialize snapshot: {e}")))
    }
}

/// Where snapshots are kept between sessions.
pub trait SaveStore {
    /// The stored snapshot, or `None` if nothing has been saved.
    fn load(&self) -> Result<Option<Snapshot>>;

    /// Replace the stored snapshot.
    fn save(&mut self, snapshot: &Snapshot) -> Result<()>;

    /// Forget the stored snapshot.
    fn clear(&mut self) -> Result<()>;
}

/// In-memory store holding encoded bytes, so a save/load cycle goes
/// through the same encoding as a file would.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    bytes: Option<Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a snapshot is stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_none()
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        self.bytes.as_deref().map(Snapshot::from_bytes).transpose()
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.bytes = Some(snapshot.to_bytes()?);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.bytes = None;
        Ok(())
    }
}
