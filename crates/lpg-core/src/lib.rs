//! # lpg-core
//!
//! Shared library for the Lethal Poster Generator desktop app containing the
//! settings model and the path resolution helpers used by the file pickers.
//!
//! This crate has zero dependencies on OS APIs, UI frameworks, the file
//! system or an async runtime.  Everything here is a pure function of its
//! inputs, which is what lets the desktop crate unit-test its settings store
//! against in-memory adapters.
//!
//! # Modules
//!
//! - **`settings`** – The canonical [`Settings`] value, its independently
//!   defaulted sections, the merge of a partially persisted document with the
//!   defaults, and the derived predicates the UI branches on
//!   (`is_plugin_path_set`, `is_package_path_set`, `is_theme_dark`).
//!
//! - **`path`** – Decomposition of a raw path string into a [`PathData`]
//!   descriptor (directory, file, base name, extension), joining path bits,
//!   and classifying files against the native dialog filter sets.

pub mod path;
pub mod settings;

pub use path::{
    classify, dialog_filters, is_package, join, resolve, DialogFilter, FilterType, PathData,
    PathResolver,
};
pub use settings::{
    merge_with_defaults, GlobalSettings, LpgSettings, PartialSettings, Settings, Theme,
    GLOBAL_SECTION, LPG_SECTION, SETTINGS_DOCUMENT, SETTINGS_UPDATED_EVENT,
};
