//! Persisted canvas record.
//!
//! The editor keeps exactly one record per session slot, always overwritten
//! as a whole.  Its JSON layout is the canvas itself plus a `version` field:
//!
//! ```json
//! {"version":1,"nodes":[...],"edges":[...],"selectedEdgeLayer":"L2"}
//! ```
//!
//! Records written before versioning existed carry no `version` and are read
//! as version 1.  A record from a newer editor is refused rather than
//! half-understood.
//!
//! # Restore policy
//!
//! Stored data is not trusted to satisfy the graph invariants.  On decode,
//! duplicate node and edge ids keep their first occurrence, and edges whose
//! endpoints are not on the canvas are dropped.  Each repair is logged.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::graph::Canvas;

/// Highest record version this build reads, and the one it writes.
pub const CANVAS_RECORD_VERSION: u32 = 1;

/// Logical key of the canvas slot in a store.
pub const CANVAS_RECORD_KEY: &str = "herd-topology";

/// Errors raised while encoding or decoding a record.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("failed to serialise canvas: {0}")]
    Serialize(String),

    #[error("failed to parse canvas record: {0}")]
    Deserialize(String),

    /// The record was written by a newer editor.
    #[error("unsupported canvas record version {found} (this build reads up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

fn default_version() -> u32 {
    CANVAS_RECORD_VERSION
}

/// Versioned wrapper around a [`Canvas`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(flatten)]
    pub canvas: Canvas,
}

/// Repairs applied while restoring a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestoreReport {
    pub duplicate_nodes: usize,
    pub duplicate_edges: usize,
    pub orphan_edges: usize,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

impl CanvasRecord {
    /// Wraps `canvas` at the current version.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            version: CANVAS_RECORD_VERSION,
            canvas,
        }
    }

    pub fn encode(&self) -> Result<String, RecordError> {
        serde_json::to_string(self).map_err(|e| RecordError::Serialize(e.to_string()))
    }

    /// Parses a stored record and checks its version.
    ///
    /// The canvas is returned as stored; call [`CanvasRecord::restore`] to
    /// apply the restore policy.
    pub fn decode(text: &str) -> Result<Self, RecordError> {
        let record: CanvasRecord =
            serde_json::from_str(text).map_err(|e| RecordError::Deserialize(e.to_string()))?;
        if record.version > CANVAS_RECORD_VERSION {
            return Err(RecordError::UnsupportedVersion {
                found: record.version,
                supported: CANVAS_RECORD_VERSION,
            });
        }
        Ok(record)
    }

    /// Consumes the record and returns a canvas that satisfies the id
    /// uniqueness and edge endpoint invariants.
    pub fn restore(self) -> (Canvas, RestoreReport) {
        let mut canvas = self.canvas;
        let mut report = RestoreReport::default();

        let mut seen_nodes = HashSet::new();
        canvas.nodes.retain(|node| {
            let fresh = seen_nodes.insert(node.id.clone());
            if !fresh {
                warn!(node_id = %node.id, "dropping duplicate node id from stored canvas");
                report.duplicate_nodes += 1;
            }
            fresh
        });

        let mut seen_edges = HashSet::new();
        canvas.edges.retain(|edge| {
            if !seen_edges.insert(edge.id.clone()) {
                warn!(edge_id = %edge.id, "dropping duplicate edge id from stored canvas");
                report.duplicate_edges += 1;
                return false;
            }
            if !seen_nodes.contains(&edge.source) || !seen_nodes.contains(&edge.target) {
                warn!(edge_id = %edge.id, source = %edge.source, target = %edge.target,
                    "dropping edge with missing endpoint from stored canvas");
                report.orphan_edges += 1;
                return false;
            }
            true
        });

        (canvas, report)
    }
}

/// Encodes `canvas` as a current-version record.
pub fn encode_canvas(canvas: &Canvas) -> Result<String, RecordError> {
    CanvasRecord::new(canvas.clone()).encode()
}

/// Decodes a stored record and applies the restore policy.
pub fn decode_canvas(text: &str) -> Result<(Canvas, RestoreReport), RecordError> {
    Ok(CanvasRecord::decode(text)?.restore())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::{Device, DeviceStatus, DeviceType, TopologyType};
    use crate::domain::graph::{Edge, EdgeId, EdgeLayer, Node, NodeId, Position};

    fn node(id: &str) -> Node {
        Node::device(
            NodeId::from(id),
            Position::new(10.0, 20.0),
            Device {
                id: format!("inv-{id}"),
                name: id.to_string(),
                device_type: DeviceType::Other,
                topology_type: TopologyType::Cloud,
                status: DeviceStatus::Available,
                location: None,
                specs: None,
                description: Some("vm".to_string()),
                created_at: String::new(),
                updated_at: String::new(),
            },
        )
    }

    fn edge(id: &str, source: &str, target: &str) -> Edge {
        Edge::layer_edge(EdgeId::from(id), NodeId::from(source), NodeId::from(target), EdgeLayer::L1)
    }

    fn sample() -> Canvas {
        Canvas {
            nodes: vec![node("a"), node("b")],
            edges: vec![edge("ab", "a", "b")],
            selected_edge_layer: EdgeLayer::L3,
        }
    }

    #[test]
    fn test_encoded_record_carries_version_and_canvas_keys() {
        let text = encode_canvas(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["version"], 1);
        assert_eq!(value["selectedEdgeLayer"], "L3");
        assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(value["edges"][0]["type"], "layerEdge");
    }

    #[test]
    fn test_decode_restores_what_was_encoded() {
        let canvas = sample();
        let text = encode_canvas(&canvas).unwrap();

        let (restored, report) = decode_canvas(&text).unwrap();

        assert_eq!(restored, canvas);
        assert!(report.is_clean());
    }

    #[test]
    fn test_unversioned_record_reads_as_version_one() {
        let record = CanvasRecord::decode(r#"{"nodes":[],"edges":[]}"#).unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.canvas.selected_edge_layer, EdgeLayer::L2);
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let result = CanvasRecord::decode(r#"{"version":2,"nodes":[],"edges":[]}"#);
        assert_eq!(
            result,
            Err(RecordError::UnsupportedVersion {
                found: 2,
                supported: 1
            })
        );
    }

    #[test]
    fn test_garbage_is_a_deserialize_error() {
        assert!(matches!(
            CanvasRecord::decode("not json at all"),
            Err(RecordError::Deserialize(_))
        ));
    }

    #[test]
    fn test_restore_drops_orphan_edges() {
        let mut canvas = sample();
        canvas.edges.push(edge("a-ghost", "a", "ghost"));
        canvas.edges.push(edge("ghost-b", "ghost", "b"));

        let (restored, report) = CanvasRecord::new(canvas).restore();

        assert_eq!(restored.edges, vec![edge("ab", "a", "b")]);
        assert_eq!(report.orphan_edges, 2);
    }

    #[test]
    fn test_restore_keeps_first_of_duplicate_ids() {
        let mut canvas = sample();
        let mut shadow = node("a");
        shadow.position = Position::new(999.0, 999.0);
        canvas.nodes.push(shadow);
        canvas.edges.push(edge("ab", "b", "a"));

        let (restored, report) = CanvasRecord::new(canvas).restore();

        assert_eq!(restored.nodes.len(), 2);
        assert_eq!(restored.nodes[0].position, Position::new(10.0, 20.0));
        assert_eq!(restored.edges, vec![edge("ab", "a", "b")]);
        assert_eq!(
            report,
            RestoreReport {
                duplicate_nodes: 1,
                duplicate_edges: 1,
                orphan_edges: 0
            }
        );
    }
}
