//! In-memory settings persistence.
//!
//! # Why an in-memory store?
//!
//! The JSON file store writes to the user's real config directory.  Tests
//! need the same open/get/set/save semantics without touching disk, and
//! need to inspect what was saved.
//!
//! [`MemoryStore`] keeps every document in a map shared between all clones
//! of the store.  Like the file store, an opened document is a private copy:
//! `set` changes only that copy and `save` publishes it to the shared map.
//!
//! # Usage in tests
//!
//! ```ignore
//! let persistence = MemoryStore::new();
//! let store = SettingsStore::new(Arc::new(persistence.clone()), bus);
//!
//! // Simulate another window writing the document behind the store's back.
//! persistence.put_section("settings.json", "lpg", json!({ "output": "/out" }));
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::application::settings_store::{
    AdapterError, OpenOptions, SettingsDocument, SettingsPersistence,
};

type Documents = HashMap<String, Map<String, Value>>;

/// Documents kept in process memory.  Clones share the same documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<Mutex<Documents>>,
    opens: Arc<AtomicUsize>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `document`.
    ///
    /// Non-object `contents` are ignored and the document starts empty.
    pub fn with_document(document: &str, contents: Value) -> Self {
        let store = Self::new();
        if let Value::Object(entries) = contents {
            lock(&store.documents).insert(document.to_string(), entries);
        }
        store
    }

    /// Writes `value` under `section` of `document` directly, bypassing any
    /// opened copies.
    pub fn put_section(&self, document: &str, section: &str, value: Value) {
        lock(&self.documents)
            .entry(document.to_string())
            .or_default()
            .insert(section.to_string(), value);
    }

    /// The last saved contents of `document` as a JSON object.
    pub fn document(&self, document: &str) -> Option<Value> {
        lock(&self.documents)
            .get(document)
            .map(|entries| Value::Object(entries.clone()))
    }

    /// Number of times any document has been opened.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of completed saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

fn lock(documents: &Mutex<Documents>) -> MutexGuard<'_, Documents> {
    documents.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl SettingsPersistence for MemoryStore {
    async fn open(
        &self,
        document: &str,
        options: OpenOptions,
    ) -> Result<Box<dyn SettingsDocument>, AdapterError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let entries = lock(&self.documents)
            .get(document)
            .cloned()
            .unwrap_or_default();

        Ok(Box::new(MemoryDocument {
            key: document.to_string(),
            entries,
            auto_save: options.auto_save,
            store: self.clone(),
        }))
    }
}

/// Private copy of one in-memory document.
#[derive(Debug)]
pub struct MemoryDocument {
    key: String,
    entries: Map<String, Value>,
    auto_save: bool,
    store: MemoryStore,
}

#[async_trait]
impl SettingsDocument for MemoryDocument {
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
        lock(&self.store.documents).insert(self.key.clone(), self.entries.clone());
        self.store.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
