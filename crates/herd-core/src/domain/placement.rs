//! Drag-and-drop hand-off from the equipment picker to the canvas.
//!
//! The picker serialises the full [`Device`] record as JSON and tags it with
//! [`DEVICE_TRANSFER_MIME`].  On drop, the canvas side turns that payload
//! into a fresh [`Node`] positioned under the pointer.
//!
//! # Positioning (for beginners)
//!
//! The pointer arrives in viewport coordinates.  Subtracting the canvas
//! element's top-left corner gives canvas coordinates; subtracting the
//! centering offset then makes the node's centre, not its corner, land under
//! the pointer:
//!
//! ```text
//! x = pointer.x - target.left - 70
//! y = pointer.y - target.top  - 60
//! ```
//!
//! # Identifiers
//!
//! Node ids come from an [`IdGenerator`].  The default is a UUID v4
//! generator; [`FallbackIdGenerator`] produces a timestamp plus random
//! suffix for environments where UUID generation is unavailable.  Uniqueness
//! within a canvas is enforced by the store, not here.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::device::Device;
use super::graph::{Node, NodeId, Position};

/// Transfer tag carried by every device drag.
pub const DEVICE_TRANSFER_MIME: &str = "application/herd-device";

/// Offset subtracted from the drop point so the node is centred on it.
pub const CENTERING_OFFSET: Position = Position { x: 70.0, y: 60.0 };

/// Length of the random suffix appended by [`FallbackIdGenerator`].
const FALLBACK_SUFFIX_LEN: usize = 9;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

// ── Drop data ─────────────────────────────────────────────────────────────────

/// A drop delivered by the canvas host.
#[derive(Debug, Clone, PartialEq)]
pub struct DropEvent {
    /// Transfer tag of the payload.
    pub mime: String,
    /// Raw payload text.
    pub data: String,
    /// Pointer location in viewport coordinates.
    pub pointer: Position,
}

impl DropEvent {
    /// Builds a drop carrying a device under the editor's transfer tag.
    pub fn device(device: &Device, pointer: Position) -> Result<Self, PlacementError> {
        let data = serde_json::to_string(device)
            .map_err(|e| PlacementError::MalformedPayload(e.to_string()))?;
        Ok(Self {
            mime: DEVICE_TRANSFER_MIME.to_string(),
            data,
            pointer,
        })
    }
}

/// Viewport origin of the canvas element receiving the drop.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DropTarget {
    pub left: f64,
    pub top: f64,
}

/// Errors raised while receiving a drop.
#[derive(Debug, Error, PartialEq)]
pub enum PlacementError {
    /// The payload carried the device tag but was not a valid device record.
    #[error("malformed device payload: {0}")]
    MalformedPayload(String),
}

// ── Id generation ─────────────────────────────────────────────────────────────

/// Source of fresh entity identifiers.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> String;
}

/// Random UUID v4 ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// `<base-36 millis>-<9 random base-36 chars>` ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackIdGenerator;

impl IdGenerator for FallbackIdGenerator {
    fn next_id(&mut self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let mut rng = rand::thread_rng();
        let suffix: String = (0..FALLBACK_SUFFIX_LEN)
            .map(|_| BASE36_DIGITS[rng.gen_range(0..BASE36_DIGITS.len())] as char)
            .collect();
        format!("{}-{suffix}", to_base36(millis))
    }
}

/// Returns the generator used when the caller does not inject one.
pub fn default_id_generator() -> Box<dyn IdGenerator> {
    Box::new(UuidIdGenerator)
}

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

// ── Receiving ─────────────────────────────────────────────────────────────────

/// Canvas coordinates for a pointer location over `target`.
pub fn drop_position(pointer: Position, target: &DropTarget) -> Position {
    Position::new(
        pointer.x - target.left - CENTERING_OFFSET.x,
        pointer.y - target.top - CENTERING_OFFSET.y,
    )
}

/// Turns a drop into a new unselected device node.
///
/// Returns `Ok(None)` when the drop carries some other payload (a file, a
/// text selection) or an empty device payload; the caller ignores those.
/// A drop whose resulting position is not finite is ignored as well.
///
/// # Errors
///
/// Returns [`PlacementError::MalformedPayload`] if the payload is tagged as
/// a device but does not parse as one.
pub fn receive_drop(
    event: &DropEvent,
    target: &DropTarget,
    ids: &mut dyn IdGenerator,
) -> Result<Option<Node>, PlacementError> {
    if event.mime != DEVICE_TRANSFER_MIME {
        trace!(mime = %event.mime, "ignoring drop with foreign transfer tag");
        return Ok(None);
    }
    if event.data.trim().is_empty() {
        trace!("ignoring drop with empty device payload");
        return Ok(None);
    }

    let device: Device = serde_json::from_str(&event.data)
        .map_err(|e| PlacementError::MalformedPayload(e.to_string()))?;

    let position = drop_position(event.pointer, target);
    if !position.is_finite() {
        warn!(x = position.x, y = position.y, "ignoring drop at non-finite position");
        return Ok(None);
    }
    let node = Node::device(NodeId::new(ids.next_id()), position, device);
    debug!(node_id = %node.id, label = node.label(), x = position.x, y = position.y, "device dropped");
    Ok(Some(node))
}
