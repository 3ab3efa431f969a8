//! Incremental change application.
//!
//! The canvas renderer reports user interaction as ordered batches of small
//! change descriptors: a node was dragged, an edge was selected, the delete
//! key removed two nodes.  [`apply_changes`] folds one batch into the next
//! canvas state.
//!
//! # Contract
//!
//! - Node changes and edge changes are two independently ordered lists.
//!   Node changes run first, then edge changes; neither reorders the other.
//! - Removing a node removes every edge incident to it in the same batch.
//! - Edge additions pass through the connection rules; invalid ones are
//!   skipped.
//! - A node `add` with an id that already exists replaces the node in place;
//!   an edge `add` with an existing id is dropped.  Either way re-applying a
//!   batch to its own result changes nothing.
//! - A replacement that changes the node's topology type counts as a
//!   removal for the cascade, so no edge outlives the domain it was
//!   validated in.
//! - Edge `add` is the replay path (undo, paste, restore): the edge keeps
//!   the layer it carries.  New connections drawn by the user go through
//!   `GraphStore::insert_edge`, which binds the selected layer.
//! - Non-finite positions and sizes are ignored; they cannot be persisted.
//! - Changes that address an unknown id, and change kinds this version does
//!   not understand, are ignored rather than failing the batch.
//! - The function is total and depends only on its two arguments.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::graph::{Canvas, Dimensions, Edge, EdgeId, Node, NodeId, Position};
use super::validator::validate_connection;

/// A single structural change to the node collection.
///
/// # Serde representation
///
/// ```json
/// {"type":"position","id":"n1","position":{"x":10.0,"y":20.0}}
/// {"type":"select","id":"n1","selected":true}
/// {"type":"remove","id":"n1"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeChange {
    Add {
        item: Node,
    },
    Remove {
        id: NodeId,
    },
    #[serde(rename = "position", alias = "move")]
    Move {
        id: NodeId,
        position: Position,
    },
    Select {
        id: NodeId,
        selected: bool,
    },
    /// UI measurement; stored on the node, no semantic effect.
    #[serde(rename = "dimensions")]
    Measure {
        id: NodeId,
        #[serde(alias = "size")]
        dimensions: Dimensions,
    },
    #[serde(other)]
    Unknown,
}

/// A single structural change to the edge collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EdgeChange {
    Add {
        item: Edge,
    },
    Remove {
        id: EdgeId,
    },
    Select {
        id: EdgeId,
        selected: bool,
    },
    #[serde(other)]
    Unknown,
}

/// One interaction's worth of changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChangeBatch {
    #[serde(default)]
    pub nodes: Vec<NodeChange>,
    #[serde(default)]
    pub edges: Vec<EdgeChange>,
}

impl ChangeBatch {
    /// A batch touching only nodes.
    pub fn nodes(nodes: Vec<NodeChange>) -> Self {
        Self {
            nodes,
            edges: Vec::new(),
        }
    }

    /// A batch touching only edges.
    pub fn edges(edges: Vec<EdgeChange>) -> Self {
        Self {
            nodes: Vec::new(),
            edges,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Produces the canvas that results from applying `batch` to `canvas`.
///
/// `canvas` itself is not modified.  The selected edge layer is carried over
/// unchanged.
pub fn apply_changes(canvas: &Canvas, batch: &ChangeBatch) -> Canvas {
    let mut next = canvas.clone();
    let mut removed_nodes: HashSet<NodeId> = HashSet::new();

    for change in &batch.nodes {
        apply_node_change(&mut next.nodes, change, &mut removed_nodes);
    }

    if !removed_nodes.is_empty() {
        let before = next.edges.len();
        next.edges
            .retain(|e| !removed_nodes.contains(&e.source) && !removed_nodes.contains(&e.target));
        let cascaded = before - next.edges.len();
        if cascaded > 0 {
            debug!(removed_nodes = removed_nodes.len(), cascaded, "removed edges incident to deleted nodes");
        }
    }

    for change in &batch.edges {
        apply_edge_change(&next.nodes, &mut next.edges, change);
    }

    next
}

fn apply_node_change(nodes: &mut Vec<Node>, change: &NodeChange, removed: &mut HashSet<NodeId>) {
    match change {
        NodeChange::Add { item } => {
            if !item.position.is_finite() {
                warn!(node_id = %item.id, "skipping node add with non-finite position");
                return;
            }
            match nodes.iter_mut().find(|n| n.id == item.id) {
                Some(existing) => {
                    if existing.topology_type() != item.topology_type() {
                        warn!(
                            node_id = %item.id,
                            from = %existing.topology_type(),
                            to = %item.topology_type(),
                            "node replaced with a different topology type; dropping its edges"
                        );
                        removed.insert(item.id.clone());
                    }
                    *existing = item.clone();
                }
                None => nodes.push(item.clone()),
            }
        }
        NodeChange::Remove { id } => {
            if let Some(index) = nodes.iter().position(|n| &n.id == id) {
                nodes.remove(index);
                removed.insert(id.clone());
            }
        }
        NodeChange::Move { id, position } => {
            if !position.is_finite() {
                warn!(node_id = %id, "ignoring move to non-finite position");
                return;
            }
            if let Some(node) = node_mut(nodes, id) {
                node.position = *position;
            }
        }
        NodeChange::Select { id, selected } => {
            if let Some(node) = node_mut(nodes, id) {
                node.selected = *selected;
            }
        }
        NodeChange::Measure { id, dimensions } => {
            if !dimensions.is_finite() {
                trace!(node_id = %id, "ignoring non-finite measurement");
                return;
            }
            if let Some(node) = node_mut(nodes, id) {
                node.measured = Some(*dimensions);
            }
        }
        NodeChange::Unknown => trace!("ignoring unknown node change kind"),
    }
}

fn apply_edge_change(nodes: &[Node], edges: &mut Vec<Edge>, change: &EdgeChange) {
    match change {
        EdgeChange::Add { item } => {
            if edges.iter().any(|e| e.id == item.id) {
                debug!(edge_id = %item.id, "edge already present; add ignored");
                return;
            }
            if let Err(rejection) = validate_connection(nodes, &item.source, &item.target) {
                warn!(edge_id = %item.id, %rejection, "skipping edge add that breaks connection rules");
                return;
            }
            edges.push(item.clone());
        }
        EdgeChange::Remove { id } => edges.retain(|e| &e.id != id),
        EdgeChange::Select { id, selected } => {
            if let Some(edge) = edges.iter_mut().find(|e| &e.id == id) {
                edge.selected = *selected;
            }
        }
        EdgeChange::Unknown => trace!("ignoring unknown edge change kind"),
    }
}

fn node_mut<'a>(nodes: &'a mut [Node], id: &NodeId) -> Option<&'a mut Node> {
    nodes.iter_mut().find(|n| &n.id == id)
}
