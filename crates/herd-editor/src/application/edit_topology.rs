//! EditorSession: the editing use case behind every canvas gesture.
//!
//! The session is the explicitly owned context object of one editing
//! session.  It owns:
//!
//! - the [`GraphStore`] holding the canonical canvas,
//! - a subscription to the store's [`GraphEvent`]s,
//! - the debounced [`CanvasPersistence`],
//! - the single-flight [`NotificationCenter`],
//! - the node id generator used for drops.
//!
//! Every command mutates the store first and then drains the store's events
//! into persistence, so the store itself never touches storage.
//!
//! # Architecture
//!
//! This use case depends only on domain types and on the `CanvasStore`
//! trait (through [`CanvasPersistence`]).  The UI bridge holds the session
//! behind an async mutex; every method here runs synchronously inside one
//! lock acquisition.

use std::sync::mpsc;
use std::time::Instant;

use herd_core::{
    default_id_generator, receive_drop, Canvas, ChangeBatch, Connection, ConnectionRejection,
    DropEvent, DropTarget, EdgeId, EdgeLayer, GraphError, GraphEvent, GraphStore, IdGenerator,
    NodeId, PlacementError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::notifications::{Notification, NotificationCenter};
use super::persist_canvas::CanvasPersistence;
use super::reserve::ReservationDraft;

/// Error type for editing session commands.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    /// "Reserve selected" with nothing selected.
    #[error("no devices selected")]
    EmptySelection,

    /// Clearing discards the whole canvas and must be confirmed by the user.
    #[error("clearing the canvas requires confirmation")]
    ClearNotConfirmed,
}

/// One editing session over one canvas slot.
pub struct EditorSession {
    store: GraphStore,
    events: mpsc::Receiver<GraphEvent>,
    persistence: CanvasPersistence,
    notifications: NotificationCenter,
    node_ids: Box<dyn IdGenerator>,
    /// Layer selected on a fresh canvas, at start and after a clear.
    default_layer: EdgeLayer,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("store", &self.store)
            .field("persistence", &self.persistence)
            .field("notifications", &self.notifications)
            .field("default_layer", &self.default_layer)
            .finish()
    }
}

impl EditorSession {
    /// Creates a session with random node and edge ids.
    pub fn new(persistence: CanvasPersistence, notifications: NotificationCenter) -> Self {
        Self::with_id_generators(
            persistence,
            notifications,
            default_id_generator(),
            default_id_generator(),
        )
    }

    /// Creates a session with injected id sources.
    pub fn with_id_generators(
        persistence: CanvasPersistence,
        notifications: NotificationCenter,
        node_ids: Box<dyn IdGenerator>,
        edge_ids: Box<dyn IdGenerator>,
    ) -> Self {
        let mut store = GraphStore::with_id_generator(edge_ids);
        let events = store.subscribe();
        Self {
            store,
            events,
            persistence,
            notifications,
            node_ids,
            default_layer: EdgeLayer::default(),
        }
    }

    /// Restores the stored canvas, or starts empty with `default_layer`
    /// selected when there is nothing usable to restore.
    pub fn start(&mut self, default_layer: EdgeLayer) {
        self.default_layer = default_layer;
        match self.persistence.load() {
            Some(canvas) => self.store.replace_canvas(canvas),
            None => self.store.set_selected_layer(default_layer),
        }
        // Startup is not an edit; nothing to write back.
        self.events.try_iter().for_each(drop);
        info!(
            nodes = self.store.nodes().len(),
            edges = self.store.edges().len(),
            layer = %self.store.selected_edge_layer(),
            "editing session started"
        );
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn canvas(&self) -> &Canvas {
        self.store.canvas()
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Renderer callback evaluated while a connection is being dragged.
    pub fn is_valid_connection(&self, connection: &Connection) -> bool {
        self.store.validate_connection(connection).is_ok()
    }

    pub fn default_layer(&self) -> EdgeLayer {
        self.default_layer
    }

    pub fn selected_device_ids(&self) -> Vec<String> {
        self.store.selected_device_ids()
    }

    /// Passive persistence warning for the UI, if the last write failed.
    pub fn persistence_warning(&self) -> Option<&str> {
        self.persistence.last_failure()
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    /// Places a dropped device.
    ///
    /// Returns the new node's id, or `None` if the drop carried something
    /// other than a device.
    ///
    /// # Errors
    ///
    /// [`EditorError::Placement`] for a malformed device payload and
    /// [`EditorError::Graph`] if the generated id is already taken.
    pub fn drop_device(
        &mut self,
        event: &DropEvent,
        target: &DropTarget,
    ) -> Result<Option<NodeId>, EditorError> {
        let Some(node) = receive_drop(event, target, &mut *self.node_ids)? else {
            return Ok(None);
        };
        let id = node.id.clone();
        self.store.insert_node(node)?;
        self.sync_persistence();
        Ok(Some(id))
    }

    /// Commits a connection drawn by the user.
    ///
    /// A domain mismatch queues a user notification (once per mismatch pair
    /// until shown); other rejections are only logged.  The rejection is
    /// returned either way and nothing is mutated.
    pub fn connect(&mut self, connection: Connection) -> Result<EdgeId, ConnectionRejection> {
        match self.store.insert_edge(connection) {
            Ok(id) => {
                self.sync_persistence();
                Ok(id)
            }
            Err(rejection) => {
                match rejection.notification_key() {
                    Some(key) if rejection.is_user_facing() => {
                        self.notifications
                            .notify(&key, rejection.to_string(), Instant::now());
                    }
                    _ => debug!(%rejection, "connection rejected"),
                }
                Err(rejection)
            }
        }
    }

    /// Folds a renderer change batch into the canvas.
    pub fn apply_changes(&mut self, batch: &ChangeBatch) {
        self.store.apply_changes(batch);
        self.sync_persistence();
    }

    /// Selects the layer for edges drawn from now on.
    pub fn set_edge_layer(&mut self, layer: EdgeLayer) {
        if self.store.selected_edge_layer() == layer {
            return;
        }
        self.store.set_selected_layer(layer);
        self.sync_persistence();
    }

    /// Layer for fresh canvases from now on.  The current selection is
    /// left alone.
    pub fn set_default_layer(&mut self, layer: EdgeLayer) {
        self.default_layer = layer;
    }

    /// Empties the canvas and the stored slot, then selects the default
    /// layer, the same state a restart after the clear starts from.
    ///
    /// # Errors
    ///
    /// [`EditorError::ClearNotConfirmed`] if `confirmed` is false; nothing is
    /// changed in that case.
    pub fn clear(&mut self, confirmed: bool) -> Result<(), EditorError> {
        if !confirmed {
            return Err(EditorError::ClearNotConfirmed);
        }
        self.store.clear();
        if self.store.selected_edge_layer() != self.default_layer {
            self.store.set_selected_layer(self.default_layer);
        }
        self.sync_persistence();
        info!(layer = %self.default_layer, "canvas cleared");
        Ok(())
    }

    /// Builds the reservation prefill from the current selection.
    ///
    /// # Errors
    ///
    /// [`EditorError::EmptySelection`] if no device node is selected.
    pub fn reservation_draft(&self) -> Result<ReservationDraft, EditorError> {
        let device_ids = self.store.selected_device_ids();
        if device_ids.is_empty() {
            return Err(EditorError::EmptySelection);
        }
        Ok(ReservationDraft { device_ids })
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.take(Instant::now())
    }

    // ── Persistence pump ──────────────────────────────────────────────────────

    /// Writes the pending snapshot once its debounce window has elapsed.
    pub fn tick(&mut self, now: Instant) {
        self.persistence.flush_due(now);
    }

    /// Writes any pending snapshot immediately.
    pub fn flush(&mut self) {
        if self.persistence.flush() {
            if let Some(failure) = self.persistence.last_failure() {
                warn!("final canvas save failed: {failure}");
            }
        }
    }

    /// Drains store events into the persistence policy.
    ///
    /// A clear empties the slot right away (or overwrites it with the empty
    /// canvas) so a later load cannot bring the old canvas back; any other
    /// event schedules a debounced save of the current snapshot.
    fn sync_persistence(&mut self) {
        let mut dirty = false;
        for event in self.events.try_iter() {
            match event {
                GraphEvent::Cleared => {
                    self.persistence.discard(&self.store.snapshot());
                    dirty = false;
                }
                _ => dirty = true,
            }
        }
        if dirty {
            self.persistence.schedule(self.store.snapshot(), Instant::now());
        }
    }
}
