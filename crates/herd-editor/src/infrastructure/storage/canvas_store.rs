//! Canvas slot backends.
//!
//! - [`FileCanvasStore`] keeps the record in `<dir>/herd-topology.json`.
//!   Saves write a sibling temp file and rename it over the target, so a
//!   crash mid-write leaves either the old record or the new one, never a
//!   torn file.
//! - [`MemoryCanvasStore`] keeps the record in memory.  Clones share the
//!   same slot, which lets tests hand one clone to the session and inspect
//!   the other.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use herd_core::CANVAS_RECORD_KEY;
use tracing::debug;

use crate::application::persist_canvas::{CanvasStore, StoreError};

// ── File store ────────────────────────────────────────────────────────────────

/// JSON file backend.
#[derive(Debug, Clone)]
pub struct FileCanvasStore {
    path: PathBuf,
}

impl FileCanvasStore {
    /// Stores the record in `dir`, which is created on first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{CANVAS_RECORD_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl CanvasStore for FileCanvasStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(&self.path, e)),
        }
    }

    fn save(&self, record: &str) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Self::io_error(dir, e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, record).map_err(|e| Self::io_error(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| Self::io_error(&self.path, e))?;
        debug!(path = %self.path.display(), bytes = record.len(), "canvas record written");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(&self.path, e)),
        }
    }
}

// ── Memory store ──────────────────────────────────────────────────────────────

/// In-memory backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryCanvasStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryCanvasStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current slot content.
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn with_slot<T>(&self, f: impl FnOnce(&mut Option<String>) -> T) -> Result<T, StoreError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| StoreError::Unavailable("memory slot lock poisoned".to_string()))?;
        Ok(f(&mut *slot))
    }
}

impl CanvasStore for MemoryCanvasStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        self.with_slot(|slot| slot.clone())
    }

    fn save(&self, record: &str) -> Result<(), StoreError> {
        self.with_slot(|slot| *slot = Some(record.to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.with_slot(|slot| *slot = None)
    }
}
