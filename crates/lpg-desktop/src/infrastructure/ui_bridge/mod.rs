//! UI command bridge: exposes the settings store and path helpers to the web UI.
//!
//! Every function here is one command the frontend can `invoke`.  Commands
//! take the shared [`AppState`] and plain JSON-friendly arguments and
//! delegate to the application layer; the UI layer is the only consumer of
//! this module.
//!
//! # `CommandResult<T>` wrapper
//!
//! Commands never return `Err`.  Every response has the same shape,
//! `{ success: bool, data: T | null, error: string | null }`, so the
//! frontend can read `result.success` without wrapping `invoke` in a
//! try/catch.
//!
//! # Cross-window sync
//!
//! [`update_settings`] saves and then emits `settings-updated` on the shared
//! [`EventBus`], so every other window's store reloads from disk.  The
//! emitting window reloads too, which is a no-op because its value already
//! matches what was just written.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use lpg_core::{
    dialog_filters, is_package, DialogFilter, FilterType, PathData, PathResolver, Settings,
    SETTINGS_UPDATED_EVENT,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::settings_store::SettingsStore;
use crate::infrastructure::events::EventBus;
use crate::infrastructure::generation::{
    self, GenerationMode, GenerationReport, GenerationRequest,
};
use crate::infrastructure::packaging;

// ── Shared application state ──────────────────────────────────────────────────

/// State shared by every command invocation.
pub struct AppState {
    /// The one settings store of this process.
    pub store: Arc<SettingsStore>,
    /// Bus the `settings-updated` notification travels on.
    pub events: EventBus,
    /// Resolver used by `resolve_path` and `check_package`.
    pub resolver: PathResolver,
}

impl AppState {
    /// Bundles an already constructed store with its event bus, resolving
    /// paths with the platform separator.
    pub fn new(store: Arc<SettingsStore>, events: EventBus) -> Arc<Self> {
        Self::with_resolver(store, events, PathResolver::native())
    }

    pub fn with_resolver(
        store: Arc<SettingsStore>,
        events: EventBus,
        resolver: PathResolver,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            events,
            resolver,
        })
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// Loading flag plus the derived predicates the UI branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsStatusDto {
    pub is_loading: bool,
    pub is_plugin_path_set: bool,
    pub is_package_path_set: bool,
    pub is_theme_dark: bool,
}

impl From<&SettingsStore> for SettingsStatusDto {
    fn from(store: &SettingsStore) -> Self {
        Self {
            is_loading: store.is_loading(),
            is_plugin_path_set: store.is_plugin_path_set(),
            is_package_path_set: store.is_package_path_set(),
            is_theme_dark: store.is_theme_dark(),
        }
    }
}

/// Unified response wrapper used by every command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Returns the current in-memory settings.
///
/// # Example (frontend)
/// ```ts
/// const { data } = await invoke<CommandResult<Settings>>('get_settings');
/// ```
pub async fn get_settings(state: Arc<AppState>) -> CommandResult<Settings> {
    CommandResult::ok(state.store.settings())
}

/// Applies `settings`, persists them and tells every window to reload.
///
/// Publishing and writing happen as one store operation, so a reload already
/// in flight cannot overwrite the edit before it is saved.  The in-memory
/// value is kept even if the save fails; the error is returned so the UI can
/// offer to retry.
pub async fn update_settings(state: Arc<AppState>, settings: Settings) -> CommandResult<()> {
    if let Err(e) = state.store.save_settings(settings).await {
        warn!("update_settings: {e}");
        return CommandResult::err(e.to_string());
    }

    let notified = state.events.emit(SETTINGS_UPDATED_EVENT).await;
    debug!(notified, "settings saved and broadcast");
    CommandResult::ok(())
}

/// Re-reads the persisted document and returns the resulting settings.
pub async fn reload_settings(state: Arc<AppState>) -> CommandResult<Settings> {
    match state.store.load_store().await {
        Ok(()) => CommandResult::ok(state.store.settings()),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub async fn get_settings_status(state: Arc<AppState>) -> CommandResult<SettingsStatusDto> {
    CommandResult::ok(SettingsStatusDto::from(state.store.as_ref()))
}

/// Decomposes a path picked in a file dialog.
pub async fn resolve_path(state: Arc<AppState>, path: String) -> CommandResult<PathData> {
    CommandResult::ok(state.resolver.resolve(&path))
}

/// Filter sets for the native file dialogs, keyed by category.
pub async fn get_dialog_filters(
    _state: Arc<AppState>,
) -> CommandResult<BTreeMap<FilterType, Vec<DialogFilter>>> {
    CommandResult::ok(dialog_filters())
}

/// True iff `path` names a package archive.
pub async fn check_package(state: Arc<AppState>, path: String) -> CommandResult<bool> {
    CommandResult::ok(is_package(&state.resolver.resolve(&path)))
}

/// Zips `source_dir` into the configured output directory as
/// `<package_name>.zip` and returns the written path.
pub async fn create_package(
    state: Arc<AppState>,
    source_dir: String,
    package_name: String,
) -> CommandResult<String> {
    let settings = state.store.settings();
    match packaging::create_package(&settings, PathBuf::from(source_dir), &package_name).await {
        Ok(path) => CommandResult::ok(path.to_string_lossy().into_owned()),
        Err(e) => {
            warn!("create_package: {e}");
            CommandResult::err(e.to_string())
        }
    }
}

/// Renders poster and painting textures from the pictures in `input_dir`
/// into the configured output directory.
///
/// # Example (frontend)
/// ```ts
/// await invoke('generate_posters', { inputDir, templateDir, modes: ['posters'] });
/// ```
pub async fn generate_posters(
    state: Arc<AppState>,
    input_dir: String,
    template_dir: String,
    modes: Vec<GenerationMode>,
) -> CommandResult<GenerationReport> {
    let settings = state.store.settings();
    let request = GenerationRequest {
        input_dir: PathBuf::from(input_dir),
        template_dir: PathBuf::from(template_dir),
        modes,
    };
    match generation::generate(&settings, request).await {
        Ok(report) => CommandResult::ok(report),
        Err(e) => {
            warn!("generate_posters: {e}");
            CommandResult::err(e.to_string())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
