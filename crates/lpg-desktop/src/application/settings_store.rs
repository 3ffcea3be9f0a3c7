//! SettingsStore: the canonical in-memory settings kept in sync with disk.
//!
//! The store owns the one [`Settings`] value every consumer reads.  It
//! mediates all reads and writes against a [`SettingsPersistence`] port,
//! publishes a loading flag, and listens for the
//! [`SETTINGS_UPDATED_EVENT`] notification so that changes made by another
//! window or process are picked up.
//!
//! # Lifecycle
//!
//! ```text
//! [Uninitialized] --init()--> [Subscribed, Loading] --load completes--> [Ready]
//! [Ready] --settings-updated--> [Loading] --load completes--> [Ready]
//! [Ready] --save_store()--> [Loading] --save completes--> [Ready]
//! [Ready]/[Loading] --cleanup_listener()--> [Unsubscribed]
//! ```
//!
//! The subscription is installed *before* the initial load so a change fired
//! during startup is never missed.  A load never clears the current value
//! before the new one is ready, and a failed load leaves it untouched.
//!
//! # Reactive state (for beginners)
//!
//! The UI observes the store through [`tokio::sync::watch`] channels.  A
//! `watch` channel holds exactly one value; receivers can read the latest
//! value at any time with `borrow()` and can `await` the next change with
//! `changed()`.  This is the Rust equivalent of a reactive `ref`: the store
//! writes, every window's receiver sees the new value.
//!
//! # Consistency
//!
//! Load and save operations on one store are serialized by an in-flight
//! operation lock, so two overlapping loads (a manual reload racing a
//! notification) complete in the order they were started.  Nothing stronger
//! is provided: the durability and atomicity of a save are whatever the
//! persistence adapter offers, and a save does not emit
//! `settings-updated` itself.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use lpg_core::{
    merge_with_defaults, PartialSettings, Settings, GLOBAL_SECTION, LPG_SECTION,
    SETTINGS_DOCUMENT, SETTINGS_UPDATED_EVENT,
};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Error raised by a persistence adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or a value could not be encoded.
    #[error("malformed settings document: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend refused the operation for another reason.
    #[error("{0}")]
    Unavailable(String),
}

/// Error raised by a notification channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("subscription refused: {0}")]
    Refused(String),
}

/// Error type for settings store operations.
///
/// None of these are retried by the store; retrying is the caller's call.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The settings document could not be opened or read.
    #[error("settings persistence unavailable: {0}")]
    PersistenceUnavailable(#[source] AdapterError),

    /// Writing a section or saving the document failed after it was opened.
    #[error("failed to write settings: {0}")]
    WriteFailed(#[source] AdapterError),

    /// The notification channel refused the `settings-updated` subscription.
    #[error("failed to subscribe to settings-updated: {0}")]
    SubscriptionFailed(#[source] NotifyError),
}

// ── Ports ─────────────────────────────────────────────────────────────────────

/// Options passed when opening a settings document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenOptions {
    /// Persist after every `set` instead of waiting for an explicit `save`.
    pub auto_save: bool,
}

/// Opens named JSON documents.  The durability boundary of the store.
///
/// The store reopens the document on every load and save and never caches a
/// handle, so implementations must tolerate being opened repeatedly.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsPersistence: Send + Sync {
    /// Opens the document named `document`, creating an empty one in memory
    /// if it does not exist yet.
    async fn open(
        &self,
        document: &str,
        options: OpenOptions,
    ) -> Result<Box<dyn SettingsDocument>, AdapterError>;
}

/// One opened JSON document: a map of section keys to JSON values.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsDocument: Send + Sync {
    /// Returns the value stored under `section`, or `None` if absent.
    async fn get(&self, section: &str) -> Result<Option<Value>, AdapterError>;

    /// Stages `value` under `section`.  Not durable until [`save`](Self::save)
    /// unless the document was opened with `auto_save`.
    async fn set(&mut self, section: &str, value: Value) -> Result<(), AdapterError>;

    /// Durably writes every staged change.
    async fn save(&mut self) -> Result<(), AdapterError>;
}

/// Callback invoked each time a subscribed event fires.
pub type NotificationHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Handle returned by [`NotificationChannel::subscribe`].
///
/// Consumed by [`call`](Self::call), so one handle unsubscribes exactly once.
pub struct Unsubscribe(Box<dyn FnOnce() + Send + Sync>);

impl Unsubscribe {
    pub fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self(Box::new(unsubscribe))
    }

    /// Removes the subscription this handle was created for.
    pub fn call(self) {
        (self.0)()
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Unsubscribe")
    }
}

/// Publish/subscribe mechanism keyed by event name.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Registers `handler` for `event`.
    async fn subscribe(
        &self,
        event: &str,
        handler: NotificationHandler,
    ) -> Result<Unsubscribe, NotifyError>;
}

// ── Loading guard ─────────────────────────────────────────────────────────────

/// Keeps `is_loading` true while at least one load/save is in flight.
///
/// Dropping the guard is the only way the count goes down, so every exit
/// path of an operation (including `?` on an error) resets the flag.
struct LoadingGuard<'a> {
    store: &'a SettingsStore,
}

impl<'a> LoadingGuard<'a> {
    fn enter(store: &'a SettingsStore) -> Self {
        if store.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            store.loading.send_replace(true);
        }
        Self { store }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.store.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.store.loading.send_replace(false);
        }
    }
}

// ── SettingsStore ─────────────────────────────────────────────────────────────

/// The process-wide settings store.
///
/// Construct exactly one per process with [`SettingsStore::new`] and share the
/// returned `Arc` with every consumer.
pub struct SettingsStore {
    persistence: Arc<dyn SettingsPersistence>,
    notifications: Arc<dyn NotificationChannel>,
    defaults: Settings,
    current: watch::Sender<Settings>,
    loading: watch::Sender<bool>,
    in_flight: AtomicUsize,
    operation: tokio::sync::Mutex<()>,
    subscription: Mutex<Option<Unsubscribe>>,
}

impl SettingsStore {
    /// Creates a store holding [`Settings::default`] until the first load.
    pub fn new(
        persistence: Arc<dyn SettingsPersistence>,
        notifications: Arc<dyn NotificationChannel>,
    ) -> Arc<Self> {
        Self::with_defaults(persistence, notifications, Settings::default())
    }

    /// Creates a store that substitutes `defaults` for absent sections.
    pub fn with_defaults(
        persistence: Arc<dyn SettingsPersistence>,
        notifications: Arc<dyn NotificationChannel>,
        defaults: Settings,
    ) -> Arc<Self> {
        let (current, _) = watch::channel(defaults.clone());
        let (loading, _) = watch::channel(false);
        Arc::new(Self {
            persistence,
            notifications,
            defaults,
            current,
            loading,
            in_flight: AtomicUsize::new(0),
            operation: tokio::sync::Mutex::new(()),
            subscription: Mutex::new(None),
        })
    }

    // ── Reactive state ────────────────────────────────────────────────────────

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.current.borrow().clone()
    }

    /// Receiver notified every time the settings value changes.
    pub fn subscribe_settings(&self) -> watch::Receiver<Settings> {
        self.current.subscribe()
    }

    /// True while a load or save is in flight.
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// True while the store holds a `settings-updated` subscription.
    pub fn is_subscribed(&self) -> bool {
        self.lock_subscription().is_some()
    }

    pub fn is_plugin_path_set(&self) -> bool {
        self.current.borrow().is_plugin_path_set()
    }

    pub fn is_package_path_set(&self) -> bool {
        self.current.borrow().is_package_path_set()
    }

    pub fn is_theme_dark(&self) -> bool {
        self.current.borrow().is_theme_dark()
    }

    /// Mutates the in-memory settings in place (UI form bindings).
    ///
    /// Receivers are only notified if `edit` actually changed something.
    /// Nothing is persisted until [`save_store`](Self::save_store).
    pub fn update(&self, edit: impl FnOnce(&mut Settings)) {
        self.current.send_if_modified(|settings| {
            let before = settings.clone();
            edit(settings);
            *settings != before
        });
    }

    /// Replaces the in-memory settings wholesale.  Not persisted.
    pub fn replace(&self, settings: Settings) {
        self.update(|current| *current = settings);
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Subscribes to `settings-updated` and performs the initial load.
    ///
    /// Calling `init` again while subscribed keeps the existing subscription
    /// and only reloads.
    ///
    /// # Errors
    ///
    /// [`StoreError::SubscriptionFailed`] if the channel refuses the
    /// subscription (no load is attempted), otherwise any error of
    /// [`load_store`](Self::load_store).
    pub async fn init(self: &Arc<Self>) -> Result<(), StoreError> {
        if self.is_subscribed() {
            debug!("settings store already subscribed; reloading only");
        } else {
            let handle = self
                .notifications
                .subscribe(SETTINGS_UPDATED_EVENT, self.reload_handler())
                .await
                .map_err(StoreError::SubscriptionFailed)?;

            // A concurrent `init` may have won the race while we awaited.
            let duplicate = {
                let mut slot = self.lock_subscription();
                if slot.is_some() {
                    Some(handle)
                } else {
                    *slot = Some(handle);
                    None
                }
            };
            match duplicate {
                Some(extra) => extra.call(),
                None => info!("subscribed to {SETTINGS_UPDATED_EVENT}"),
            }
        }

        self.load_store().await
    }

    /// Reads every section from the persisted document into memory.
    ///
    /// Absent sections become their default.  Receivers are only notified
    /// when the merged value differs from the current one.
    ///
    /// # Errors
    ///
    /// [`StoreError::PersistenceUnavailable`] if the document cannot be opened
    /// or read; the in-memory settings are left as they were.
    pub async fn load_store(&self) -> Result<(), StoreError> {
        let _loading = LoadingGuard::enter(self);
        let _operation = self.operation.lock().await;
        debug!("loading {SETTINGS_DOCUMENT}");

        let document = self
            .persistence
            .open(SETTINGS_DOCUMENT, OpenOptions { auto_save: false })
            .await
            .map_err(StoreError::PersistenceUnavailable)?;
        let global = document
            .get(GLOBAL_SECTION)
            .await
            .map_err(StoreError::PersistenceUnavailable)?;
        let lpg = document
            .get(LPG_SECTION)
            .await
            .map_err(StoreError::PersistenceUnavailable)?;

        let loaded = merge_with_defaults(PartialSettings::from_values(global, lpg), &self.defaults);
        let plugin_path_set = loaded.is_plugin_path_set();
        let package_path_set = loaded.is_package_path_set();
        let changed = self.current.send_if_modified(|current| {
            if *current == loaded {
                return false;
            }
            *current = loaded;
            true
        });

        info!(changed, plugin_path_set, package_path_set, "settings loaded");
        Ok(())
    }

    /// Writes every section, then saves the document once.
    ///
    /// # Errors
    ///
    /// [`StoreError::PersistenceUnavailable`] if the document cannot be
    /// opened, [`StoreError::WriteFailed`] if a `set` or the final `save`
    /// fails.  What is left on disk after a failure is up to the adapter.
    pub async fn save_store(&self) -> Result<(), StoreError> {
        let _loading = LoadingGuard::enter(self);
        let _operation = self.operation.lock().await;
        self.write_current().await
    }

    /// Publishes `settings` and persists exactly that value.
    ///
    /// Both steps happen under the operation lock, so a load already in
    /// flight finishes first and cannot overwrite `settings` before they are
    /// written.  Receivers see the new value even if the write then fails.
    ///
    /// # Errors
    ///
    /// Same as [`save_store`](Self::save_store).
    pub async fn save_settings(&self, settings: Settings) -> Result<(), StoreError> {
        let _loading = LoadingGuard::enter(self);
        let _operation = self.operation.lock().await;
        self.replace(settings);
        self.write_current().await
    }

    /// Writes every section of the current value, then saves once.  Caller
    /// holds the operation lock.
    async fn write_current(&self) -> Result<(), StoreError> {
        let sections = self
            .settings()
            .sections()
            .map_err(|e| StoreError::WriteFailed(AdapterError::Json(e)))?;

        let mut document = self
            .persistence
            .open(SETTINGS_DOCUMENT, OpenOptions { auto_save: false })
            .await
            .map_err(StoreError::PersistenceUnavailable)?;
        for (section, value) in sections {
            document
                .set(section, value)
                .await
                .map_err(StoreError::WriteFailed)?;
        }
        document.save().await.map_err(StoreError::WriteFailed)?;

        info!("settings saved to {SETTINGS_DOCUMENT}");
        Ok(())
    }

    /// Drops the `settings-updated` subscription, if any.  Idempotent.
    ///
    /// Also runs when the store is dropped.
    pub fn cleanup_listener(&self) {
        let handle = self.lock_subscription().take();
        if let Some(handle) = handle {
            handle.call();
            info!("unsubscribed from {SETTINGS_UPDATED_EVENT}");
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Handler that reloads this store.  Holds only a weak reference so the
    /// subscription never keeps the store alive.
    fn reload_handler(self: &Arc<Self>) -> NotificationHandler {
        let store = Arc::downgrade(self);
        Arc::new(move || {
            let store = store.clone();
            async move {
                let Some(store) = store.upgrade() else {
                    return;
                };
                debug!("{SETTINGS_UPDATED_EVENT} received; reloading");
                if let Err(e) = store.load_store().await {
                    warn!("reload after {SETTINGS_UPDATED_EVENT} failed: {e}");
                }
            }
            .boxed()
        })
    }

    fn lock_subscription(&self) -> MutexGuard<'_, Option<Unsubscribe>> {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SettingsStore {
    fn drop(&mut self) {
        self.cleanup_listener();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
