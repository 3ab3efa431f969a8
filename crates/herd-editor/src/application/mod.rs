//! Application layer use cases for the topology editor.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules in `herd_core`) and the infrastructure (files, UI
//! bridge, process entry point).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a user goal (e.g., "wire these
//!   two devices together and tell the user if that is not allowed").
//! - **Depend on abstractions** (traits such as [`persist_canvas::CanvasStore`]
//!   and [`reserve::ReservationFlow`]) rather than concrete implementations.
//! - **Contain no direct file system access**.
//!
//! # Sub-modules
//!
//! - **`edit_topology`** – The editing session: owns the graph store and
//!   routes every gesture through it.  This is the use case the UI talks to.
//!
//! - **`notifications`** – Single-flight user notifications, so dragging a
//!   PHYSICAL device onto a CLOUD one ten times shows one message, not ten.
//!
//! - **`persist_canvas`** – Debounced canvas persistence behind the
//!   `CanvasStore` trait.
//!
//! - **`reserve`** – Hand-off of the current selection to the reservation
//!   subsystem.

pub mod edit_topology;
pub mod notifications;
pub mod persist_canvas;
pub mod reserve;
