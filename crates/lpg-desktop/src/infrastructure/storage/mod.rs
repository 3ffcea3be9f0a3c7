//! Storage infrastructure: settings document persistence.
//!
//! This module provides the adapters behind the application layer's
//! [`SettingsPersistence`](crate::application::settings_store::SettingsPersistence)
//! port:
//!
//! - **`json_file`** – [`JsonFileStore`](json_file::JsonFileStore): one pretty
//!   printed JSON file per document inside a store directory.  This is what
//!   the shipping binary uses.
//! - **`memory`** – [`MemoryStore`](memory::MemoryStore): documents kept in a
//!   shared in-process map.  Used by tests that must not touch the user's
//!   real settings.
//!
//! The store directory defaults to the platform config directory:
//! - Windows:  `%APPDATA%\LethalPosterGenerator`
//! - Linux:    `~/.config/lethal-poster-generator`
//! - macOS:    `~/Library/Application Support/LethalPosterGenerator`

use std::ffi::OsString;
use std::path::PathBuf;

pub mod json_file;
pub mod memory;

/// Directory name on Windows and macOS.
pub const APP_DIR_NAME: &str = "LethalPosterGenerator";
/// Directory name under the XDG config home.
pub const XDG_APP_DIR_NAME: &str = "lethal-poster-generator";

/// Resolves the platform config directory the settings document lives in.
///
/// Returns `None` when the relevant environment variables are unset (e.g. in
/// a stripped container) or on unsupported platforms.
pub fn default_store_dir() -> Option<PathBuf> {
    store_dir_from(|key| std::env::var_os(key))
}

/// Platform lookup over an injectable environment.
fn store_dir_from(env: impl Fn(&str) -> Option<OsString>) -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env("APPDATA").map(|p| PathBuf::from(p).join(APP_DIR_NAME))
    }

    #[cfg(target_os = "linux")]
    {
        let base = env("XDG_CONFIG_HOME")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| env("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join(XDG_APP_DIR_NAME))
    }

    #[cfg(target_os = "macos")]
    {
        env("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR_NAME)
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        let _ = env;
        None
    }
}
