//! lpg-desktop library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does lpg-desktop do? (for beginners)
//!
//! The desktop backend keeps the user's settings (plugin folder, package
//! output folder, theme) in memory, in sync with the `settings.json` document
//! on disk and with `settings-updated` notifications fired by other windows.
//! It also answers the UI's path questions ("is this a package?") and builds
//! package archives into the configured output folder.

/// Application layer: the settings store and the ports it depends on.
pub mod application;

/// Infrastructure layer: JSON persistence, event bus, packaging, UI bridge.
pub mod infrastructure;
