//! Infrastructure layer for the topology editor.
//!
//! Contains outward-facing adapters: file-system storage for the canvas and
//! the editor configuration, and the UI command bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and `herd_core`,
//! but MUST NOT be imported by the `application` or domain layers.

pub mod storage;
pub mod ui_bridge;
