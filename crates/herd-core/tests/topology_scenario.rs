//! Integration tests for the herd-core graph model.
//!
//! These tests drive the public API the way the editor does: devices arrive
//! through the drop protocol, edges through the connection gate, and
//! deletions through change batches.

use herd_core::{
    decode_canvas, encode_canvas, receive_drop, ChangeBatch, Connection, ConnectionRejection,
    Device, DeviceStatus, DeviceType, DropEvent, DropTarget, EdgeLayer, GraphStore, IdGenerator,
    NodeChange, NodeId, Position, TopologyType,
};

/// Deterministic `n0`, `n1`, ... ids so assertions can name nodes.
struct Counter {
    prefix: &'static str,
    next: usize,
}

impl IdGenerator for Counter {
    fn next_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

fn device(name: &str, topology: TopologyType) -> Device {
    Device {
        id: format!("inv-{name}"),
        name: name.to_string(),
        device_type: DeviceType::Router,
        topology_type: topology,
        status: DeviceStatus::Available,
        location: None,
        specs: None,
        description: None,
        created_at: "2024-03-01T12:00:00Z".to_string(),
        updated_at: "2024-03-01T12:00:00Z".to_string(),
    }
}

/// Drops `device` so that it lands at canvas coordinates `at`.
fn place(store: &mut GraphStore, ids: &mut Counter, device: Device, at: Position) -> NodeId {
    // The drop math subtracts the centering offset; add it back here.
    let pointer = Position::new(at.x + 70.0, at.y + 60.0);
    let event = DropEvent::device(&device, pointer).expect("device serialises");
    let node = receive_drop(&event, &DropTarget::default(), ids)
        .expect("well-formed payload")
        .expect("device tag");
    assert_eq!(node.position, at);
    let id = node.id.clone();
    store.insert_node(node).expect("fresh id");
    id
}

#[test]
fn test_editing_scenario() {
    let mut store = GraphStore::with_id_generator(Box::new(Counter { prefix: "e", next: 0 }));
    let mut node_ids = Counter { prefix: "n", next: 0 };

    // Cross-domain connect is refused and leaves no edge behind.
    let phys = place(&mut store, &mut node_ids, device("p0", TopologyType::Physical), Position::new(100.0, 100.0));
    let cloud = place(&mut store, &mut node_ids, device("c0", TopologyType::Cloud), Position::new(300.0, 100.0));
    let rejection = store.insert_edge(Connection::new(phys.clone(), cloud)).unwrap_err();
    assert!(matches!(rejection, ConnectionRejection::DomainMismatch { .. }));
    assert!(rejection.is_user_facing());
    assert!(store.edges().is_empty());

    // Same-domain connect takes the selected layer.
    let p1 = place(&mut store, &mut node_ids, device("p1", TopologyType::Physical), Position::new(100.0, 300.0));
    let first = store.insert_edge(Connection::new(phys.clone(), p1)).unwrap();
    assert_eq!(store.edges().len(), 1);
    assert_eq!(store.edge(&first).unwrap().layer(), store.selected_edge_layer());

    // New layer applies to new edges only.
    store.set_selected_layer(EdgeLayer::L1);
    let p2 = place(&mut store, &mut node_ids, device("p2", TopologyType::Physical), Position::new(500.0, 300.0));
    let p3 = place(&mut store, &mut node_ids, device("p3", TopologyType::Physical), Position::new(700.0, 300.0));
    let second = store.insert_edge(Connection::new(p2, p3)).unwrap();
    assert_eq!(store.edge(&second).unwrap().layer(), EdgeLayer::L1);
    assert_eq!(store.edge(&first).unwrap().layer(), EdgeLayer::L2);

    // Removing one endpoint of the first edge cascades exactly that edge.
    let nodes_before = store.nodes().len();
    let edges_before = store.edges().len();
    let untouched = store.edge(&second).unwrap().clone();
    store.apply_changes(&ChangeBatch::nodes(vec![NodeChange::Remove { id: phys }]));

    assert_eq!(store.nodes().len(), nodes_before - 1);
    assert_eq!(store.edges().len(), edges_before - 1);
    assert!(store.edge(&first).is_none());
    assert_eq!(store.edge(&second), Some(&untouched));
}

#[test]
fn test_saved_canvas_restores_identically() {
    let mut store = GraphStore::new();
    let mut node_ids = Counter { prefix: "n", next: 0 };
    let a = place(&mut store, &mut node_ids, device("a", TopologyType::Cloud), Position::new(0.0, 0.0));
    let b = place(&mut store, &mut node_ids, device("b", TopologyType::Cloud), Position::new(200.0, 0.0));
    store.set_selected_layer(EdgeLayer::L3);
    store.insert_edge(Connection::new(a, b)).unwrap();

    let text = encode_canvas(store.canvas()).unwrap();
    let (restored, report) = decode_canvas(&text).unwrap();

    assert_eq!(&restored, store.canvas());
    assert!(report.is_clean());
}

#[test]
fn test_validity_is_symmetric_over_all_pairs() {
    let mut store = GraphStore::new();
    let mut node_ids = Counter { prefix: "n", next: 0 };
    let topologies = [
        TopologyType::Physical,
        TopologyType::Cloud,
        TopologyType::Physical,
        TopologyType::Cloud,
    ];
    let ids: Vec<NodeId> = topologies
        .iter()
        .enumerate()
        .map(|(i, t)| place(&mut store, &mut node_ids, device(&format!("d{i}"), *t), Position::default()))
        .collect();

    for (i, a) in ids.iter().enumerate() {
        for (j, b) in ids.iter().enumerate() {
            if i == j {
                continue;
            }
            let expected = topologies[i] == topologies[j];
            let forward = store.validate_connection(&Connection::new(a.clone(), b.clone())).is_ok();
            let backward = store.validate_connection(&Connection::new(b.clone(), a.clone())).is_ok();
            assert_eq!(forward, expected, "{a} -> {b}");
            assert_eq!(backward, expected, "{b} -> {a}");
        }
    }
}
