//! UI command bridge: exposes the editing session to the canvas frontend.
//!
//! Every command here takes the shared [`AppState`], locks the session once,
//! and returns a [`CommandResult`].  The presentation layer (the canvas
//! renderer and its toolbar) is the only consumer of this module; it must
//! NOT be imported by the application or domain layers.
//!
//! # `CommandResult<T>` wrapper
//!
//! All commands return `CommandResult<T>` rather than `Result<T, E>`, so
//! every response has the same shape:
//! `{ success: bool, data: T | null, error: string | null }`.
//!
//! A connection refused by the domain rules is not an error at this
//! boundary: `connect` succeeds with `accepted: false`, and the user-facing
//! message arrives through `take_notifications`.
//!
//! `update_editor_settings` writes through to the config file named in
//! [`AppState::config_path`].
//!
//! # Data Transfer Objects
//!
//! Nodes, edges and change batches already serialise in the renderer's
//! shape and cross the bridge as-is.  The DTOs below cover the remaining
//! flat request and response payloads.

use std::path::PathBuf;
use std::sync::Arc;

use herd_core::{ChangeBatch, Connection, DropEvent, DropTarget, Edge, EdgeLayer, Node, Position};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::application::{
    edit_topology::EditorSession,
    notifications::{Notification, NotificationCenter},
    persist_canvas::CanvasPersistence,
    reserve::{ReservationDraft, ReservationFlow},
};
use crate::infrastructure::storage::{
    canvas_store::FileCanvasStore,
    config::{save_config_to, ConfigError, EditorConfig},
};

// ── Shared application state ──────────────────────────────────────────────────

/// State shared between UI commands.
///
/// Wrapped in `Arc<>` and handed to every command.  The session sits behind
/// an async Tokio mutex so a command suspends, rather than blocks, while
/// another command holds the lock.
pub struct AppState {
    /// The one editing session of this process.
    pub session: Mutex<EditorSession>,
    /// The current editor configuration.
    pub config: Mutex<EditorConfig>,
    /// File that settings updates are written to; `None` keeps them in memory.
    pub config_path: Option<PathBuf>,
    /// Where "reserve selected" hands the selection.
    pub reservations: Arc<dyn ReservationFlow>,
}

impl AppState {
    /// Builds the session from `config`, backed by the canvas file in the
    /// configured directory, and restores the stored canvas.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoPlatformConfigDir`] if no canvas directory is
    /// configured and the platform directory cannot be determined.
    pub fn new(
        config: EditorConfig,
        config_path: Option<PathBuf>,
        reservations: Arc<dyn ReservationFlow>,
    ) -> Result<Arc<Self>, ConfigError> {
        let canvas_dir = config.persistence.resolved_canvas_dir()?;
        let store = FileCanvasStore::new(&canvas_dir);
        info!(path = %store.path().display(), "canvas file");

        let persistence = CanvasPersistence::new(Box::new(store), config.persistence.debounce());
        let notifications = NotificationCenter::new(config.notifications.cooldown());
        let mut session = EditorSession::new(persistence, notifications);
        session.start(config.editor.default_edge_layer);

        Ok(Self::with_session(session, config, config_path, reservations))
    }

    /// Wraps an already started session.
    pub fn with_session(
        session: EditorSession,
        config: EditorConfig,
        config_path: Option<PathBuf>,
        reservations: Arc<dyn ReservationFlow>,
    ) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(session),
            config: Mutex::new(config),
            config_path,
            reservations,
        })
    }
}

// ── Data Transfer Objects (Presentation layer) ────────────────────────────────

/// The whole canvas plus the passive persistence warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasDto {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub selected_edge_layer: String,
    pub persistence_warning: Option<String>,
}

/// A drop as reported by the canvas element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropDto {
    pub mime: String,
    pub data: String,
    pub client_x: f64,
    pub client_y: f64,
    pub bounds_left: f64,
    pub bounds_top: f64,
}

/// Endpoints of a connect gesture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDto {
    pub source: String,
    pub target: String,
}

impl From<ConnectionDto> for Connection {
    fn from(dto: ConnectionDto) -> Self {
        Connection::new(dto.source, dto.target)
    }
}

/// Outcome of a connect gesture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectOutcomeDto {
    pub accepted: bool,
    pub edge_id: Option<String>,
    pub reason: Option<String>,
}

/// One entry of the layer selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerOptionDto {
    pub value: String,
    pub description: String,
}

/// Editor settings shown in the preferences panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettingsDto {
    pub log_level: String,
    pub default_edge_layer: String,
    pub debounce_ms: u64,
    pub cooldown_ms: u64,
}

/// Unified response wrapper used by UI commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── UI commands ───────────────────────────────────────────────────────────────

/// Returns the current canvas.
///
/// # Example (frontend)
/// ```ts
/// const canvas = await invoke<CanvasDto>('get_canvas');
/// ```
pub async fn get_canvas(state: Arc<AppState>) -> CommandResult<CanvasDto> {
    let session = state.session.lock().await;
    let canvas = session.canvas();
    CommandResult::ok(CanvasDto {
        nodes: canvas.nodes.clone(),
        edges: canvas.edges.clone(),
        selected_edge_layer: canvas.selected_edge_layer.to_string(),
        persistence_warning: session.persistence_warning().map(str::to_string),
    })
}

/// Places a device dropped from the equipment picker.
///
/// Returns the new node id, or `null` when the drop carried something else.
pub async fn drop_device(state: Arc<AppState>, payload: DropDto) -> CommandResult<Option<String>> {
    let event = DropEvent {
        mime: payload.mime,
        data: payload.data,
        pointer: Position::new(payload.client_x, payload.client_y),
    };
    let target = DropTarget {
        left: payload.bounds_left,
        top: payload.bounds_top,
    };

    let mut session = state.session.lock().await;
    match session.drop_device(&event, &target) {
        Ok(id) => CommandResult::ok(id.map(|id| id.to_string())),
        Err(e) => {
            warn!("drop rejected: {e}");
            CommandResult::err(e.to_string())
        }
    }
}

/// Renderer callback while a connection is being dragged.
pub async fn is_valid_connection(state: Arc<AppState>, connection: ConnectionDto) -> CommandResult<bool> {
    let session = state.session.lock().await;
    CommandResult::ok(session.is_valid_connection(&connection.into()))
}

/// Commits a connection drawn by the user.
pub async fn connect(state: Arc<AppState>, connection: ConnectionDto) -> CommandResult<ConnectOutcomeDto> {
    let mut session = state.session.lock().await;
    let outcome = match session.connect(connection.into()) {
        Ok(id) => ConnectOutcomeDto {
            accepted: true,
            edge_id: Some(id.to_string()),
            reason: None,
        },
        Err(rejection) => ConnectOutcomeDto {
            accepted: false,
            edge_id: None,
            reason: Some(rejection.to_string()),
        },
    };
    CommandResult::ok(outcome)
}

/// Applies a batch of renderer changes (moves, selections, deletions).
pub async fn apply_changes(state: Arc<AppState>, batch: ChangeBatch) -> CommandResult<()> {
    let mut session = state.session.lock().await;
    session.apply_changes(&batch);
    CommandResult::ok(())
}

/// Selects the layer for new edges (`"L1"`, `"L2"` or `"L3"`).
pub async fn set_edge_layer(state: Arc<AppState>, layer: String) -> CommandResult<()> {
    let layer: EdgeLayer = match layer.parse() {
        Ok(layer) => layer,
        Err(e) => return CommandResult::err(e),
    };
    state.session.lock().await.set_edge_layer(layer);
    CommandResult::ok(())
}

/// Entries for the layer selector, in display order.
pub async fn layer_options() -> CommandResult<Vec<LayerOptionDto>> {
    let options = EdgeLayer::ALL
        .iter()
        .map(|layer| LayerOptionDto {
            value: layer.to_string(),
            description: layer.description().to_string(),
        })
        .collect();
    CommandResult::ok(options)
}

/// Empties the canvas.  The UI must have asked the user first.
pub async fn clear_canvas(state: Arc<AppState>, confirmed: bool) -> CommandResult<()> {
    let mut session = state.session.lock().await;
    match session.clear(confirmed) {
        Ok(()) => CommandResult::ok(()),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Hands the selected devices to the reservation flow.
pub async fn reserve_selected(state: Arc<AppState>) -> CommandResult<ReservationDraft> {
    let draft = {
        let session = state.session.lock().await;
        match session.reservation_draft() {
            Ok(draft) => draft,
            Err(e) => return CommandResult::err(e.to_string()),
        }
    };

    match state.reservations.begin(draft.clone()).await {
        Ok(()) => CommandResult::ok(draft),
        Err(e) => CommandResult::err(format!("reservation hand-off failed: {e}")),
    }
}

/// Returns the current editor settings.
pub async fn get_editor_settings(state: Arc<AppState>) -> CommandResult<EditorSettingsDto> {
    let cfg = state.config.lock().await;
    CommandResult::ok(EditorSettingsDto {
        log_level: cfg.editor.log_level.clone(),
        default_edge_layer: cfg.editor.default_edge_layer.to_string(),
        debounce_ms: cfg.persistence.debounce_ms,
        cooldown_ms: cfg.notifications.cooldown_ms,
    })
}

/// Applies and persists new editor settings.
///
/// The default layer takes effect at the next clear; log level, debounce
/// and cooldown at the next start.
pub async fn update_editor_settings(
    state: Arc<AppState>,
    settings: EditorSettingsDto,
) -> CommandResult<()> {
    let layer: EdgeLayer = match settings.default_edge_layer.parse() {
        Ok(layer) => layer,
        Err(e) => return CommandResult::err(e),
    };

    state.session.lock().await.set_default_layer(layer);

    let mut cfg = state.config.lock().await;
    cfg.editor.log_level = settings.log_level;
    cfg.editor.default_edge_layer = layer;
    cfg.persistence.debounce_ms = settings.debounce_ms;
    cfg.notifications.cooldown_ms = settings.cooldown_ms;

    if let Some(path) = &state.config_path {
        if let Err(e) = save_config_to(path, &cfg) {
            return CommandResult::err(format!("failed to save config: {e}"));
        }
        info!(path = %path.display(), "editor settings saved");
    }
    CommandResult::ok(())
}

/// Drains queued user notifications.
pub async fn take_notifications(state: Arc<AppState>) -> CommandResult<Vec<Notification>> {
    let mut session = state.session.lock().await;
    CommandResult::ok(session.take_notifications())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
