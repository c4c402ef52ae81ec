//! File-backed save store.

use std::path::{Path, PathBuf};

use hex_core::error::{GameError, Result};
use hex_core::snapshot::{SaveStore, Snapshot};

/// Keeps one bincode snapshot in a file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store snapshots at `path`. Nothing is touched until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn io_error(action: &str, path: &Path, e: &std::io::Error) -> GameError {
    GameError::Io(format!("Failed to {action} '{}': {e}", path.display()))
}

impl SaveStore for FileStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&self.path).map_err(|e| io_error("read", &self.path, &e))?;
        Snapshot::from_bytes(&bytes).map(Some)
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error("create", parent, &e))?;
        }
        let bytes = snapshot.to_bytes()?;
        std::fs::write(&self.path, bytes).map_err(|e| io_error("write", &self.path, &e))?;
        tracing::debug!(path = %self.path.display(), time = snapshot.time(), "Saved game");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &self.path, &e)),
        }
    }
}
