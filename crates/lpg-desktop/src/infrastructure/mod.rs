//! Infrastructure layer for the desktop backend.
//!
//! Contains the OS-facing adapters: the JSON settings document on disk, the
//! in-process notification bus, the texture generator, the package archive
//! writer, and the UI command bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and `lpg_core`,
//! but MUST NOT be imported by the `application` layer's production code.

pub mod events;
pub mod generation;
pub mod packaging;
pub mod storage;
pub mod ui_bridge;
