//! Connection rules.
//!
//! Evaluated synchronously inside the drag-and-connect gesture, against the
//! current node snapshot only.  No I/O, no side effects: the caller decides
//! whether a rejection deserves a user-visible notification.
//!
//! Rules, in evaluation order:
//!
//! 1. Both endpoint ids must resolve to nodes on the canvas.
//! 2. A node may not be connected to itself.
//! 3. Both endpoints must share the same `topologyType`.
//!
//! Direction does not matter for rule 3, and parallel edges between the
//! same pair are permitted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::device::TopologyType;
use super::graph::{Node, NodeId};

/// Prefix of the notification key used for domain mismatches.
const MISMATCH_KEY_PREFIX: &str = "topology-mismatch";

/// A candidate edge produced by the connect gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
}

impl Connection {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Why a candidate connection was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionRejection {
    /// An endpoint id does not resolve to a node on the canvas.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(NodeId),

    /// Source and target are the same node.
    #[error("cannot connect a device to itself")]
    SelfLoop(NodeId),

    /// The endpoints live in different domains.
    #[error("Cannot connect {source_type} and {target_type} devices: topology types must match")]
    DomainMismatch {
        source_type: TopologyType,
        target_type: TopologyType,
    },
}

impl ConnectionRejection {
    /// Returns `true` for rejections the user caused and should be told about.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, ConnectionRejection::DomainMismatch { .. })
    }

    /// Coalescing key for the user-visible notification.
    ///
    /// Identical for every attempt involving the same pair of domains in
    /// either direction, so repeated drags collapse into one notification.
    /// `None` for rejections that are never shown.
    pub fn notification_key(&self) -> Option<String> {
        match self {
            ConnectionRejection::DomainMismatch {
                source_type,
                target_type,
            } => {
                let (low, high) = if source_type <= target_type {
                    (source_type, target_type)
                } else {
                    (target_type, source_type)
                };
                Some(format!("{MISMATCH_KEY_PREFIX}:{low}-{high}"))
            }
            _ => None,
        }
    }
}

/// Checks a candidate connection against `nodes`.
///
/// # Errors
///
/// Returns the first rule the candidate breaks; see the module docs.
pub fn validate_connection(
    nodes: &[Node],
    source: &NodeId,
    target: &NodeId,
) -> Result<(), ConnectionRejection> {
    let source_node = find(nodes, source)?;
    let target_node = find(nodes, target)?;

    if source == target {
        return Err(ConnectionRejection::SelfLoop(source.clone()));
    }

    let source_type = source_node.topology_type();
    let target_type = target_node.topology_type();
    if source_type != target_type {
        return Err(ConnectionRejection::DomainMismatch {
            source_type,
            target_type,
        });
    }

    Ok(())
}

/// Boolean form of [`validate_connection`] for renderer callbacks.
pub fn is_valid_connection(nodes: &[Node], source: &NodeId, target: &NodeId) -> bool {
    validate_connection(nodes, source, target).is_ok()
}

fn find<'a>(nodes: &'a [Node], id: &NodeId) -> Result<&'a Node, ConnectionRejection> {
    nodes
        .iter()
        .find(|n| &n.id == id)
        .ok_or_else(|| ConnectionRejection::UnknownEndpoint(id.clone()))
}
