//! Durable record of the last component that completed startup.
//!
//! Losing the checkpoint must only ever degrade to "start from scratch":
//! `load()` swallows read and parse errors and reports no progress, while
//! `save()`/`clear()` surface storage failures as `Persistence` errors.

use crate::error::{IgnitionError, Result};
use crate::io;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CheckpointRecord {
    #[serde(default)]
    last_component: String,
}

/// Storage handle for orchestration progress. Injected into the sequencer so
/// tests can substitute an in-memory store.
pub trait CheckpointStore {
    /// Name of the last component that completed startup, or an empty string
    /// when there is no usable checkpoint. Never fails.
    fn load(&self) -> String;

    /// Atomically persist `name` as the new checkpoint.
    fn save(&self, name: &str) -> Result<()>;

    /// Remove the checkpoint. Clearing a nonexistent checkpoint is a no-op.
    fn clear(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileCheckpointStore
// ---------------------------------------------------------------------------

/// Checkpoint persisted as a small JSON file (`{"last_component": "..."}`).
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn at_root(root: &Path) -> Self {
        Self::new(crate::paths::checkpoint_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> String {
        let Ok(data) = std::fs::read_to_string(&self.path) else {
            return String::new();
        };
        match serde_json::from_str::<CheckpointRecord>(&data) {
            Ok(record) => record.last_component,
            Err(_) => {
                tracing::warn!(path = %self.path.display(), "checkpoint file corrupt, starting fresh");
                String::new()
            }
        }
    }

    fn save(&self, name: &str) -> Result<()> {
        let record = CheckpointRecord {
            last_component: name.to_string(),
        };
        let data = serde_json::to_vec_pretty(&record)?;
        io::atomic_write(&self.path, &data)
            .map_err(|e| IgnitionError::Persistence(format!("{}: {e}", self.path.display())))
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IgnitionError::Persistence(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryCheckpointStore
// ---------------------------------------------------------------------------

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    last: std::sync::Mutex<String>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_checkpoint(name: &str) -> Self {
        let store = Self::new();
        *store.last.lock().unwrap() = name.to_string();
        store
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> String {
        self.last.lock().unwrap().clone()
    }

    fn save(&self, name: &str) -> Result<()> {
        *self.last.lock().unwrap() = name.to_string();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.last.lock().unwrap().clear();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
