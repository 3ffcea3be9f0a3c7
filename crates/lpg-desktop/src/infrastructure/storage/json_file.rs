//! JSON-file persistence for settings documents.
//!
//! Each document is a single JSON object stored at `<store dir>/<document>`,
//! e.g. `~/.config/lethal-poster-generator/settings.json`:
//!
//! ```json
//! {
//!   "global": { "plugin_path": "/opt/plugins", "theme": "dark" },
//!   "lpg": { "output": "" }
//! }
//! ```
//!
//! Opening reads the whole file into memory; `set` only changes that copy;
//! `save` writes it back.  A missing directory or file opens as an empty
//! document, so the first run works without any setup.
//!
//! # Atomic replace
//!
//! `save` writes to `<document>.tmp` next to the target and renames it over
//! the original, so a crash mid-write leaves either the old or the new
//! document on disk, never a truncated one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::application::settings_store::{
    AdapterError, OpenOptions, SettingsDocument, SettingsPersistence,
};

/// Opens JSON documents stored in one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at `dir`.  The directory is created lazily on
    /// the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the file backing `document`.
    pub fn document_path(&self, document: &str) -> PathBuf {
        self.dir.join(document)
    }
}

#[async_trait]
impl SettingsPersistence for JsonFileStore {
    async fn open(
        &self,
        document: &str,
        options: OpenOptions,
    ) -> Result<Box<dyn SettingsDocument>, AdapterError> {
        let path = self.document_path(document);
        let entries = read_entries(&path).await?;
        debug!(path = %path.display(), sections = entries.len(), "opened settings document");

        Ok(Box::new(JsonDocument {
            path,
            entries,
            auto_save: options.auto_save,
        }))
    }
}

async fn read_entries(path: &Path) -> Result<Map<String, Value>, AdapterError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(source) => {
            return Err(AdapterError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str(&content)? {
        Value::Object(entries) => Ok(entries),
        other => Err(AdapterError::Unavailable(format!(
            "{} must contain a JSON object, found {}",
            path.display(),
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// In-memory copy of one JSON document file.
#[derive(Debug)]
pub struct JsonDocument {
    path: PathBuf,
    entries: Map<String, Value>,
    auto_save: bool,
}

#[async_trait]
impl SettingsDocument for JsonDocument {
    async fn get(&self, section: &str) -> Result<Option<Value>, AdapterError> {
        Ok(self.entries.get(section).cloned())
    }

    async fn set(&mut self, section: &str, value: Value) -> Result<(), AdapterError> {
        self.entries.insert(section.to_string(), value);
        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }

    async fn save(&mut self) -> Result<(), AdapterError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| AdapterError::Io { path, source }
        };

        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(io_err(dir))?;
        }

        let content = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await.map_err(io_err(&tmp))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(io_err(&self.path))?;

        debug!(path = %self.path.display(), "saved settings document");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
