//! Topology graph model and the store that owns it.
//!
//! The canvas is a directed multigraph: [`Node`]s are placed devices and
//! [`Edge`]s are protocol-layer connections between them.  The
//! [`GraphStore`] is the single owner of the canonical node and edge
//! collections plus the globally selected edge layer.
//!
//! # JSON shape
//!
//! Nodes and edges serialize in the shape the canvas renderer consumes,
//! with a `type` discriminator next to a `data` payload:
//!
//! ```json
//! {"id":"n1","position":{"x":30.0,"y":40.0},"type":"deviceNode",
//!  "data":{"device":{...},"label":"fw-1","topologyType":"PHYSICAL"}}
//! {"id":"e1","source":"n1","target":"n2","type":"layerEdge","data":{"layer":"L2"}}
//! ```
//!
//! # Change notification
//!
//! The store performs no I/O.  Every committed mutation is announced as a
//! [`GraphEvent`] on each channel handed out by [`GraphStore::subscribe`];
//! persistence and UI refresh hang off those channels.

use std::fmt;
use std::sync::mpsc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use super::changes::{self, ChangeBatch};
use super::device::{Device, TopologyType};
use super::placement::{default_id_generator, IdGenerator};
use super::validator::{validate_connection, Connection, ConnectionRejection};

// ── Identifiers ───────────────────────────────────────────────────────────────

/// Identifier of a node, generated at placement and stable for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

/// Identifier of an edge, generated when the connection is committed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(NodeId);
string_id!(EdgeId);

// ── Geometry ──────────────────────────────────────────────────────────────────

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// JSON has no NaN or infinity; a non-finite coordinate cannot be stored.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Rendered size of a node as measured by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn is_finite(&self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }
}

// ── Layers ────────────────────────────────────────────────────────────────────

/// Protocol layer an edge represents.
///
/// Purely descriptive: the editor never checks it against real connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EdgeLayer {
    L1,
    #[default]
    L2,
    L3,
}

impl EdgeLayer {
    /// The three choices offered by the layer selector, in display order.
    pub const ALL: [EdgeLayer; 3] = [EdgeLayer::L1, EdgeLayer::L2, EdgeLayer::L3];

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeLayer::L1 => "L1",
            EdgeLayer::L2 => "L2",
            EdgeLayer::L3 => "L3",
        }
    }

    /// Tooltip text for the layer selector.
    pub fn description(self) -> &'static str {
        match self {
            EdgeLayer::L1 => "Physical / fiber",
            EdgeLayer::L2 => "Ethernet / VLAN",
            EdgeLayer::L3 => "IP routing",
        }
    }
}

impl fmt::Display for EdgeLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EdgeLayer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L1" => Ok(EdgeLayer::L1),
            "L2" => Ok(EdgeLayer::L2),
            "L3" => Ok(EdgeLayer::L3),
            other => Err(format!("unknown edge layer `{other}`; expected L1|L2|L3")),
        }
    }
}

// ── Nodes ─────────────────────────────────────────────────────────────────────

/// Payload of a device node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceNodeData {
    /// Value copy of the inventory record taken at placement time.
    pub device: Device,
    pub label: String,
    /// Copied from `device.topology_type` at creation and never recomputed.
    pub topology_type: TopologyType,
}

impl DeviceNodeData {
    pub fn from_device(device: Device) -> Self {
        Self {
            label: device.name.clone(),
            topology_type: device.topology_type,
            device,
        }
    }
}

/// Node variants known to the renderer.  Only device nodes exist today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum NodeKind {
    #[serde(rename = "deviceNode")]
    DeviceNode(DeviceNodeData),
}

/// A placed device on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Transient selection flag; not part of identity.
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
    /// UI measurement only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured: Option<Dimensions>,
}

impl Node {
    /// Creates an unselected device node.
    pub fn device(id: NodeId, position: Position, device: Device) -> Self {
        Self {
            id,
            position,
            kind: NodeKind::DeviceNode(DeviceNodeData::from_device(device)),
            selected: false,
            measured: None,
        }
    }

    /// Domain classification captured when the node was created.
    pub fn topology_type(&self) -> TopologyType {
        match &self.kind {
            NodeKind::DeviceNode(data) => data.topology_type,
        }
    }

    /// The device copied into this node, if the node carries one.
    pub fn device_record(&self) -> Option<&Device> {
        match &self.kind {
            NodeKind::DeviceNode(data) => Some(&data.device),
        }
    }

    pub fn label(&self) -> &str {
        match &self.kind {
            NodeKind::DeviceNode(data) => &data.label,
        }
    }
}

// ── Edges ─────────────────────────────────────────────────────────────────────

/// Payload of a layer edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerEdgeData {
    pub layer: EdgeLayer,
}

/// Edge variants known to the renderer.  Only layer edges exist today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EdgeKind {
    #[serde(rename = "layerEdge")]
    LayerEdge(LayerEdgeData),
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(flatten)]
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
}

impl Edge {
    pub fn layer_edge(id: EdgeId, source: NodeId, target: NodeId, layer: EdgeLayer) -> Self {
        Self {
            id,
            source,
            target,
            kind: EdgeKind::LayerEdge(LayerEdgeData { layer }),
            selected: false,
        }
    }

    /// Layer captured when the edge was created.
    pub fn layer(&self) -> EdgeLayer {
        match &self.kind {
            EdgeKind::LayerEdge(data) => data.layer,
        }
    }

    /// Returns `true` if either endpoint is `node`.
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ── Canvas ────────────────────────────────────────────────────────────────────

/// The complete graph plus the currently selected default layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Canvas {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(rename = "selectedEdgeLayer", default)]
    pub selected_edge_layer: EdgeLayer,
}

impl Canvas {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| &e.id == id)
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// Errors raised by [`GraphStore`] mutations.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    /// A node with this id already exists.  Ids are random, so this signals a
    /// programming error rather than a user mistake.
    #[error("duplicate node id: {0}")]
    DuplicateId(NodeId),
}

/// Notification emitted after every committed store mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    NodeInserted(NodeId),
    EdgeInserted(EdgeId),
    LayerChanged(EdgeLayer),
    ChangesApplied {
        node_changes: usize,
        edge_changes: usize,
    },
    Cleared,
    CanvasReplaced,
}

/// Owner of the canonical canvas.
///
/// There is exactly one logical writer per editing session; the store is a
/// plain data container and every method applies atomically to the
/// in-memory collections.
pub struct GraphStore {
    canvas: Canvas,
    edge_ids: Box<dyn IdGenerator>,
    subscribers: Vec<mpsc::Sender<GraphEvent>>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStore")
            .field("nodes", &self.canvas.nodes.len())
            .field("edges", &self.canvas.edges.len())
            .field("selected_edge_layer", &self.canvas.selected_edge_layer)
            .finish()
    }
}

impl GraphStore {
    /// Creates an empty store with `L2` selected.
    pub fn new() -> Self {
        Self::with_id_generator(default_id_generator())
    }

    /// Creates an empty store that draws edge ids from `edge_ids`.
    pub fn with_id_generator(edge_ids: Box<dyn IdGenerator>) -> Self {
        Self {
            canvas: Canvas::default(),
            edge_ids,
            subscribers: Vec::new(),
        }
    }

    /// Registers a new listener for [`GraphEvent`]s.
    ///
    /// Dropping the receiver unsubscribes it on the next emitted event.
    pub fn subscribe(&mut self) -> mpsc::Receiver<GraphEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn nodes(&self) -> &[Node] {
        &self.canvas.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.canvas.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.canvas.node(id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.canvas.edge(id)
    }

    pub fn selected_edge_layer(&self) -> EdgeLayer {
        self.canvas.selected_edge_layer
    }

    /// Borrowed view of the whole canvas.
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Immutable copy of the canvas, suitable for deferred persistence.
    pub fn snapshot(&self) -> Canvas {
        self.canvas.clone()
    }

    /// Appends a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateId`] if a node with the same id exists;
    /// the store is left untouched.
    pub fn insert_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.canvas.node(&node.id).is_some() {
            error!(node_id = %node.id, "refusing to insert node with duplicate id");
            return Err(GraphError::DuplicateId(node.id));
        }
        let id = node.id.clone();
        debug!(node_id = %id, topology = %node.topology_type(), "node inserted");
        self.canvas.nodes.push(node);
        self.emit(GraphEvent::NodeInserted(id));
        Ok(())
    }

    /// Evaluates the connection rules against the current node snapshot.
    pub fn validate_connection(&self, connection: &Connection) -> Result<(), ConnectionRejection> {
        validate_connection(&self.canvas.nodes, &connection.source, &connection.target)
    }

    /// Commits a new edge if the connection passes validation.
    ///
    /// The edge's layer is the currently selected layer.  On rejection
    /// nothing is mutated and the caller decides whether to notify the user.
    pub fn insert_edge(&mut self, connection: Connection) -> Result<EdgeId, ConnectionRejection> {
        self.validate_connection(&connection)?;

        let id = loop {
            let candidate = EdgeId::new(self.edge_ids.next_id());
            if self.canvas.edge(&candidate).is_none() {
                break candidate;
            }
            debug!(edge_id = %candidate, "edge id collision; drawing another");
        };

        let layer = self.canvas.selected_edge_layer;
        debug!(edge_id = %id, source = %connection.source, target = %connection.target, %layer, "edge inserted");
        self.canvas.edges.push(Edge::layer_edge(
            id.clone(),
            connection.source,
            connection.target,
            layer,
        ));
        self.emit(GraphEvent::EdgeInserted(id.clone()));
        Ok(id)
    }

    /// Selects the layer for future edges.  Existing edges keep theirs.
    pub fn set_selected_layer(&mut self, layer: EdgeLayer) {
        self.canvas.selected_edge_layer = layer;
        self.emit(GraphEvent::LayerChanged(layer));
    }

    /// Empties the graph and resets the selected layer to the default.
    pub fn clear(&mut self) {
        self.canvas = Canvas::default();
        self.emit(GraphEvent::Cleared);
    }

    /// Folds a change batch into the canvas.  An empty batch is a no-op and
    /// emits nothing.
    pub fn apply_changes(&mut self, batch: &ChangeBatch) {
        if batch.is_empty() {
            return;
        }
        self.canvas = changes::apply_changes(&self.canvas, batch);
        self.emit(GraphEvent::ChangesApplied {
            node_changes: batch.nodes.len(),
            edge_changes: batch.edges.len(),
        });
    }

    /// Swaps in a restored canvas wholesale.
    pub fn replace_canvas(&mut self, canvas: Canvas) {
        self.canvas = canvas;
        self.emit(GraphEvent::CanvasReplaced);
    }

    /// Inventory ids of the devices on selected nodes, first occurrence
    /// order, without duplicates.
    pub fn selected_device_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for node in self.canvas.nodes.iter().filter(|n| n.selected) {
            if let Some(device) = node.device_record() {
                if !ids.contains(&device.id) {
                    ids.push(device.id.clone());
                }
            }
        }
        ids
    }

    fn emit(&mut self, event: GraphEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
