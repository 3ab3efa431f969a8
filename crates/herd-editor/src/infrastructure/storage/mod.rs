//! Storage infrastructure: canvas slot and configuration file persistence.
//!
//! - `canvas_store` implements the application's `CanvasStore` trait on top
//!   of a JSON file (and an in-memory variant for tests and headless runs).
//! - `config` reads and writes the editor's TOML configuration file.
//!
//! Keeping storage concerns here means the canvas could move to another
//! backing store without touching the editing session.

pub mod canvas_store;
pub mod config;
