//! Debounced canvas persistence.
//!
//! The graph store performs no I/O.  Instead the editing session forwards
//! "something changed" to [`CanvasPersistence`], which decides when to
//! actually write:
//!
//! 1. [`CanvasPersistence::schedule`] captures an immutable snapshot and a
//!    due time one debounce window in the future.  A newer schedule replaces
//!    the pending one, so a burst of drag frames produces one write.
//! 2. [`CanvasPersistence::flush_due`] writes once the window has elapsed.
//!    The session's tick loop calls it.
//! 3. [`CanvasPersistence::flush`] writes immediately (shutdown).
//! 4. [`CanvasPersistence::discard`] drops the pending write and empties
//!    the slot (canvas cleared).
//!
//! Write failures never interrupt editing.  They are logged and kept as a
//! passive warning the UI may display.

use std::time::{Duration, Instant};

use herd_core::{decode_canvas, encode_canvas, Canvas, RecordError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default debounce window between the last change and the write.
pub const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Error type for canvas slot backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing canvas at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backend cannot be used right now.
    #[error("canvas store unavailable: {0}")]
    Unavailable(String),
}

/// Error type for persistence operations.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// A single-slot key/value backend holding the encoded canvas record.
///
/// Every `save` replaces the slot as a whole.
#[cfg_attr(test, mockall::automock)]
pub trait CanvasStore: Send {
    /// Returns the stored record text, or `None` if the slot is empty.
    fn load(&self) -> Result<Option<String>, StoreError>;

    fn save(&self, record: &str) -> Result<(), StoreError>;

    /// Empties the slot.
    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
struct PendingSave {
    snapshot: Canvas,
    due: Instant,
}

/// Owns the store and the debounce state.
pub struct CanvasPersistence {
    store: Box<dyn CanvasStore>,
    debounce: Duration,
    pending: Option<PendingSave>,
    last_failure: Option<String>,
}

impl std::fmt::Debug for CanvasPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasPersistence")
            .field("debounce", &self.debounce)
            .field("pending", &self.pending.is_some())
            .field("last_failure", &self.last_failure)
            .finish()
    }
}

impl CanvasPersistence {
    pub fn new(store: Box<dyn CanvasStore>, debounce: Duration) -> Self {
        Self {
            store,
            debounce,
            pending: None,
            last_failure: None,
        }
    }

    /// Restores the stored canvas, if any.
    ///
    /// Returns `None` when the slot is empty or the record cannot be used;
    /// the caller then starts from an empty canvas.
    pub fn load(&mut self) -> Option<Canvas> {
        match self.try_load() {
            Ok(Some((canvas, report))) => {
                if !report.is_clean() {
                    warn!(?report, "stored canvas needed repair on load");
                }
                info!(nodes = canvas.nodes.len(), edges = canvas.edges.len(), "canvas restored");
                Some(canvas)
            }
            Ok(None) => {
                debug!("no stored canvas; starting empty");
                None
            }
            Err(e) => {
                warn!("failed to restore canvas, starting empty: {e}");
                self.last_failure = Some(e.to_string());
                None
            }
        }
    }

    fn try_load(&self) -> Result<Option<(Canvas, herd_core::RestoreReport)>, PersistenceError> {
        match self.store.load()? {
            Some(text) => Ok(Some(decode_canvas(&text)?)),
            None => Ok(None),
        }
    }

    /// Schedules `snapshot` to be written one debounce window after `now`.
    pub fn schedule(&mut self, snapshot: Canvas, now: Instant) {
        self.pending = Some(PendingSave {
            snapshot,
            due: now + self.debounce,
        });
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Writes the pending snapshot if its window has elapsed.
    ///
    /// Returns `true` if a write was attempted.
    pub fn flush_due(&mut self, now: Instant) -> bool {
        match &self.pending {
            Some(pending) if pending.due <= now => self.flush(),
            _ => false,
        }
    }

    /// Writes the pending snapshot immediately, if there is one.
    ///
    /// Returns `true` if a write was attempted.
    pub fn flush(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        match self.write(&pending.snapshot) {
            Ok(()) => {
                debug!(nodes = pending.snapshot.nodes.len(), edges = pending.snapshot.edges.len(), "canvas saved");
                self.last_failure = None;
            }
            Err(e) => {
                warn!("failed to save canvas: {e}");
                self.last_failure = Some(e.to_string());
            }
        }
        true
    }

    /// Drops any pending write and empties the stored slot.
    ///
    /// If the slot cannot be emptied, `cleared` is written over the old
    /// record instead, so the next load never brings back the discarded
    /// canvas.
    pub fn discard(&mut self, cleared: &Canvas) {
        self.pending = None;
        let Err(e) = self.store.clear() else {
            debug!("stored canvas cleared");
            self.last_failure = None;
            return;
        };
        warn!("failed to clear stored canvas, overwriting it instead: {e}");
        match self.write(cleared) {
            Ok(()) => self.last_failure = None,
            Err(e) => {
                warn!("failed to overwrite stored canvas: {e}");
                self.last_failure = Some(e.to_string());
            }
        }
    }

    /// Description of the most recent failed operation, cleared by the next
    /// successful save.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    fn write(&self, canvas: &Canvas) -> Result<(), PersistenceError> {
        let text = encode_canvas(canvas)?;
        self.store.save(&text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herd_core::{EdgeLayer, GraphStore};
    use mockall::predicate::always;
    use std::sync::{Arc, Mutex};

    /// A store that records every saved record.
    #[derive(Default, Clone)]
    struct RecordingStore {
        saved: Arc<Mutex<Vec<String>>>,
    }

    impl CanvasStore for RecordingStore {
        fn load(&self) -> Result<Option<String>, StoreError> {
            Ok(self.saved.lock().unwrap().last().cloned())
        }

        fn save(&self, record: &str) -> Result<(), StoreError> {
            self.saved.lock().unwrap().push(record.to_string());
            Ok(())
        }

        fn clear(&self) -> Result<(), StoreError> {
            self.saved.lock().unwrap().clear();
            Ok(())
        }
    }

    fn canvas_with_layer(layer: EdgeLayer) -> Canvas {
        let mut store = GraphStore::new();
        store.set_selected_layer(layer);
        store.snapshot()
    }

    #[test]
    fn test_flush_due_waits_for_debounce_window() {
        // Arrange
        let store = RecordingStore::default();
        let mut persistence = CanvasPersistence::new(Box::new(store.clone()), Duration::from_millis(500));
        let t0 = Instant::now();
        persistence.schedule(Canvas::default(), t0);

        // Act / Assert
        assert!(!persistence.flush_due(t0 + Duration::from_millis(499)));
        assert!(store.saved.lock().unwrap().is_empty());
        assert!(persistence.flush_due(t0 + Duration::from_millis(500)));
        assert_eq!(store.saved.lock().unwrap().len(), 1);
        assert!(!persistence.is_pending());
    }

    #[test]
    fn test_burst_of_schedules_writes_latest_snapshot_once() {
        // Arrange
        let store = RecordingStore::default();
        let mut persistence = CanvasPersistence::new(Box::new(store.clone()), Duration::from_millis(100));
        let t0 = Instant::now();

        // Act
        persistence.schedule(canvas_with_layer(EdgeLayer::L1), t0);
        persistence.schedule(canvas_with_layer(EdgeLayer::L3), t0 + Duration::from_millis(50));
        persistence.flush_due(t0 + Duration::from_millis(120));
        persistence.flush_due(t0 + Duration::from_millis(200));

        // Assert
        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        let (restored, _) = decode_canvas(&saved[0]).unwrap();
        assert_eq!(restored.selected_edge_layer, EdgeLayer::L3);
    }

    #[test]
    fn test_scheduled_snapshot_is_isolated_from_later_edits() {
        // Arrange
        let store = RecordingStore::default();
        let mut persistence = CanvasPersistence::new(Box::new(store.clone()), Duration::ZERO);
        let mut graph = GraphStore::new();
        persistence.schedule(graph.snapshot(), Instant::now());

        // Act: mutate after scheduling
        graph.set_selected_layer(EdgeLayer::L1);
        persistence.flush();

        // Assert
        let (restored, _) = decode_canvas(&store.saved.lock().unwrap()[0]).unwrap();
        assert_eq!(restored.selected_edge_layer, EdgeLayer::L2);
    }

    #[test]
    fn test_save_failure_is_recorded_not_propagated() {
        // Arrange
        let mut mock = MockCanvasStore::new();
        mock.expect_save()
            .with(always())
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("quota exceeded".to_string())));
        let mut persistence = CanvasPersistence::new(Box::new(mock), Duration::ZERO);
        persistence.schedule(Canvas::default(), Instant::now());

        // Act
        let attempted = persistence.flush();

        // Assert
        assert!(attempted);
        assert!(!persistence.is_pending());
        assert!(persistence.last_failure().unwrap().contains("quota exceeded"));
    }

    #[test]
    fn test_successful_save_clears_previous_failure() {
        let mut mock = MockCanvasStore::new();
        let mut calls = 0;
        mock.expect_save().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(StoreError::Unavailable("offline".to_string()))
            } else {
                Ok(())
            }
        });
        let mut persistence = CanvasPersistence::new(Box::new(mock), Duration::ZERO);

        persistence.schedule(Canvas::default(), Instant::now());
        persistence.flush();
        assert!(persistence.last_failure().is_some());

        persistence.schedule(Canvas::default(), Instant::now());
        persistence.flush();
        assert!(persistence.last_failure().is_none());
    }

    #[test]
    fn test_load_of_empty_slot_returns_none() {
        let mut mock = MockCanvasStore::new();
        mock.expect_load().times(1).returning(|| Ok(None));
        let mut persistence = CanvasPersistence::new(Box::new(mock), DEFAULT_SAVE_DEBOUNCE);

        assert!(persistence.load().is_none());
        assert!(persistence.last_failure().is_none());
    }

    #[test]
    fn test_load_of_corrupt_record_returns_none_with_warning() {
        let mut mock = MockCanvasStore::new();
        mock.expect_load()
            .times(1)
            .returning(|| Ok(Some("{\"nodes\": [oops".to_string())));
        let mut persistence = CanvasPersistence::new(Box::new(mock), DEFAULT_SAVE_DEBOUNCE);

        assert!(persistence.load().is_none());
        assert!(persistence.last_failure().is_some());
    }

    #[test]
    fn test_load_of_newer_record_version_returns_none() {
        let mut mock = MockCanvasStore::new();
        mock.expect_load()
            .times(1)
            .returning(|| Ok(Some(r#"{"version":99,"nodes":[],"edges":[]}"#.to_string())));
        let mut persistence = CanvasPersistence::new(Box::new(mock), DEFAULT_SAVE_DEBOUNCE);

        assert!(persistence.load().is_none());
        assert!(persistence.last_failure().unwrap().contains("version 99"));
    }

    #[test]
    fn test_discard_drops_pending_and_clears_slot() {
        // Arrange
        let store = RecordingStore::default();
        store.save("old record").unwrap();
        let mut persistence = CanvasPersistence::new(Box::new(store.clone()), Duration::from_secs(60));
        persistence.schedule(canvas_with_layer(EdgeLayer::L3), Instant::now());

        // Act
        persistence.discard(&Canvas::default());

        // Assert
        assert!(!persistence.is_pending());
        assert!(!persistence.flush());
        assert!(persistence.load().is_none(), "no phantom restore after clear");
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[test]
    fn test_discard_overwrites_slot_when_clear_fails() {
        // Arrange
        let saved = Arc::new(Mutex::new(Some("old record".to_string())));
        let mut mock = MockCanvasStore::new();
        mock.expect_clear()
            .times(1)
            .returning(|| Err(StoreError::Unavailable("read-only".to_string())));
        let on_save = Arc::clone(&saved);
        mock.expect_save().times(1).returning(move |record| {
            *on_save.lock().unwrap() = Some(record.to_string());
            Ok(())
        });
        let mut persistence = CanvasPersistence::new(Box::new(mock), Duration::ZERO);
        persistence.schedule(canvas_with_layer(EdgeLayer::L3), Instant::now());

        // Act
        persistence.discard(&canvas_with_layer(EdgeLayer::L1));

        // Assert
        assert!(!persistence.is_pending());
        assert!(persistence.last_failure().is_none());
        let record = saved.lock().unwrap().clone().unwrap();
        let (restored, _) = decode_canvas(&record).unwrap();
        assert!(restored.is_empty());
        assert_eq!(restored.selected_edge_layer, EdgeLayer::L1);
    }

    #[test]
    fn test_discard_records_failure_when_clear_and_overwrite_fail() {
        let mut mock = MockCanvasStore::new();
        mock.expect_clear()
            .returning(|| Err(StoreError::Unavailable("read-only".to_string())));
        mock.expect_save()
            .returning(|_| Err(StoreError::Unavailable("disk full".to_string())));
        let mut persistence = CanvasPersistence::new(Box::new(mock), Duration::ZERO);

        persistence.discard(&Canvas::default());

        assert!(persistence.last_failure().unwrap().contains("disk full"));
    }
}
