//! # herd-core
//!
//! Shared library for the HERD lab topology editor containing the graph
//! model, the connection rules that guard every edge, the change applicator
//! driven by canvas gestures, the device placement protocol, and the
//! persisted canvas record format.
//!
//! This crate has zero dependencies on storage, UI frameworks, or async
//! runtimes.  Everything here runs synchronously on the caller's thread.
//!
//! # Architecture overview
//!
//! An operator drags lab equipment out of an inventory picker onto a canvas,
//! then wires devices together at a chosen protocol layer (L1, L2 or L3).
//!
//! - **`domain::device`** – The read-only device record handed over by the
//!   inventory service.
//! - **`domain::graph`** – Nodes, edges, the canvas value, and the
//!   [`GraphStore`] that owns them.
//! - **`domain::validator`** – The pure predicate evaluated before any edge
//!   is committed (PHYSICAL devices only wire to PHYSICAL, CLOUD to CLOUD).
//! - **`domain::changes`** – Incremental change batches (add, move, remove,
//!   select) and the function that folds them into the next canvas.
//! - **`domain::placement`** – The drag-and-drop transfer payload and the
//!   drop coordinate math.
//! - **`domain::canvas`** – The versioned on-disk record and its restore
//!   policy.

pub mod domain;

pub use domain::canvas::{
    decode_canvas, encode_canvas, CanvasRecord, RecordError, RestoreReport, CANVAS_RECORD_KEY,
    CANVAS_RECORD_VERSION,
};
pub use domain::changes::{apply_changes, ChangeBatch, EdgeChange, NodeChange};
pub use domain::device::{Device, DeviceStatus, DeviceType, TopologyType};
pub use domain::graph::{
    Canvas, DeviceNodeData, Dimensions, Edge, EdgeId, EdgeKind, EdgeLayer, GraphError,
    GraphEvent, GraphStore, LayerEdgeData, Node, NodeId, NodeKind, Position,
};
pub use domain::placement::{
    default_id_generator, drop_position, receive_drop, DropEvent, DropTarget, FallbackIdGenerator, IdGenerator,
    PlacementError, UuidIdGenerator, CENTERING_OFFSET, DEVICE_TRANSFER_MIME,
};
pub use domain::validator::{is_valid_connection, validate_connection, Connection, ConnectionRejection};
