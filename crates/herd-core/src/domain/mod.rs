//! Domain entities for the HERD topology editor.
//!
//! This module contains pure business logic with no infrastructure
//! dependencies: no file system, no UI toolkit, no async runtime.
//!
//! Code in outer layers (the editor session, storage adapters, the UI
//! bridge) depends on the domain, but the domain never depends on them.
//! That keeps every rule below testable in isolation.

/// Persisted canvas record and restore policy.
pub mod canvas;

/// Incremental change descriptors and the change applicator.
///
/// See [`changes::apply_changes`] for the main entry point.
pub mod changes;

/// Inventory device records as seen by the editor.
pub mod device;

/// Graph model and the owning store.
///
/// See [`graph::GraphStore`] for the main type.
pub mod graph;

/// Drag-and-drop hand-off from the equipment picker.
pub mod placement;

/// Connection rules evaluated before an edge is committed.
pub mod validator;
