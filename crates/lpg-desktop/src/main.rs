//! Lethal Poster Generator desktop backend entry point.
//!
//! Builds the one [`SettingsStore`] of this process over the JSON document in
//! the store directory, subscribes it to `settings-updated`, loads it and
//! then keeps it in sync until Ctrl-C.
//!
//! # Usage
//!
//! ```text
//! lpg-desktop [OPTIONS]
//!
//! Options:
//!   --store-dir <DIR>     Directory holding settings.json [env: LPG_STORE_DIR]
//!   --log-level <LEVEL>   Log filter when RUST_LOG is unset [default: info]
//!   --show                Print the effective settings as JSON and exit
//! ```
//!
//! # Architecture
//!
//! ```text
//! main()
//!  ├─ EventBus              -- settings-updated notifications
//!  ├─ JsonFileStore         -- <store dir>/settings.json
//!  └─ SettingsStore::init() -- subscribe, then initial load
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lpg_core::SETTINGS_DOCUMENT;
use lpg_desktop::application::settings_store::SettingsStore;
use lpg_desktop::infrastructure::events::EventBus;
use lpg_desktop::infrastructure::storage::{default_store_dir, json_file::JsonFileStore};
use lpg_desktop::infrastructure::ui_bridge::{AppState, SettingsStatusDto};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Lethal Poster Generator settings backend.
#[derive(Debug, Parser)]
#[command(
    name = "lpg-desktop",
    about = "Settings synchronization backend for the Lethal Poster Generator",
    version
)]
struct Cli {
    /// Directory containing `settings.json`.
    ///
    /// Defaults to the platform config directory
    /// (e.g. `~/.config/lethal-poster-generator`).
    #[arg(long, env = "LPG_STORE_DIR")]
    store_dir: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is not set (e.g. `debug`,
    /// `lpg_desktop=trace`).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the loaded settings and derived flags as JSON, then exit.
    #[arg(long)]
    show: bool,
}

impl Cli {
    fn resolve_store_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.store_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_store_dir()
                .context("no platform config directory; pass --store-dir or set LPG_STORE_DIR"),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let store_dir = cli.resolve_store_dir()?;
    info!(
        document = %store_dir.join(SETTINGS_DOCUMENT).display(),
        "Lethal Poster Generator backend starting"
    );

    let events = EventBus::new();
    let persistence = JsonFileStore::new(&store_dir);
    let store = SettingsStore::new(Arc::new(persistence), Arc::new(events.clone()));
    store
        .init()
        .await
        .with_context(|| format!("failed to initialize settings from {}", store_dir.display()))?;

    let state = AppState::new(Arc::clone(&store), events);

    if cli.show {
        let report = json!({
            "settings": state.store.settings(),
            "status": SettingsStatusDto::from(state.store.as_ref()),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        store.cleanup_listener();
        return Ok(());
    }

    info!("settings backend ready.  Press Ctrl-C to exit.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    info!("shutdown signal received");
    store.cleanup_listener();
    state.events.close();
    info!("Lethal Poster Generator backend stopped");
    Ok(())
}
