//! In-process event bus implementing [`NotificationChannel`].
//!
//! Windows of the desktop app (and any other component holding a clone of
//! the bus) subscribe to named events and are called back when someone emits
//! that name.  The settings store uses it to hear `settings-updated`.
//!
//! # Delivery
//!
//! `emit` snapshots the handlers registered for the event, releases the lock
//! and then runs every handler concurrently, returning once all of them have
//! finished.  A handler may therefore subscribe or unsubscribe (even itself)
//! without deadlocking, and such changes take effect from the next `emit`.
//!
//! Handlers are keyed by a random [`Uuid`] so an [`Unsubscribe`] handle
//! removes exactly the registration it was created for.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::debug;
use uuid::Uuid;

use crate::application::settings_store::{
    NotificationChannel, NotificationHandler, NotifyError, Unsubscribe,
};

type Listeners = HashMap<String, HashMap<Uuid, NotificationHandler>>;

/// Cloneable handle to one shared set of listeners.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<Mutex<Listeners>>,
    closed: Arc<AtomicBool>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handlers currently registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        lock(&self.listeners).get(event).map_or(0, HashMap::len)
    }

    /// Refuses all further subscriptions.  Existing listeners stay registered
    /// and still receive events.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Calls every handler registered for `event` and waits for all of them.
    ///
    /// Returns the number of handlers that were called.
    pub async fn emit(&self, event: &str) -> usize {
        let handlers: Vec<NotificationHandler> = lock(&self.listeners)
            .get(event)
            .map(|handlers| handlers.values().cloned().collect())
            .unwrap_or_default();

        debug!(event, listeners = handlers.len(), "emitting event");
        let count = handlers.len();
        join_all(handlers.iter().map(|handler| handler())).await;
        count
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let events: Vec<String> = lock(&self.listeners).keys().cloned().collect();
        f.debug_struct("EventBus")
            .field("events", &events)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn lock(listeners: &Mutex<Listeners>) -> MutexGuard<'_, Listeners> {
    listeners.lock().unwrap_or_else(PoisonError::into_inner)
}

fn remove_listener(listeners: &Weak<Mutex<Listeners>>, event: &str, id: Uuid) {
    let Some(listeners) = listeners.upgrade() else {
        return;
    };
    let mut listeners = lock(&listeners);
    if let Some(handlers) = listeners.get_mut(event) {
        handlers.remove(&id);
        if handlers.is_empty() {
            listeners.remove(event);
        }
    }
    debug!(event, %id, "listener removed");
}

#[async_trait]
impl NotificationChannel for EventBus {
    async fn subscribe(
        &self,
        event: &str,
        handler: NotificationHandler,
    ) -> Result<Unsubscribe, NotifyError> {
        if self.is_closed() {
            return Err(NotifyError::Refused(format!("event bus closed; cannot listen to {event}")));
        }

        let id = Uuid::new_v4();
        lock(&self.listeners)
            .entry(event.to_string())
            .or_default()
            .insert(id, handler);
        debug!(event, %id, "listener added");

        let listeners = Arc::downgrade(&self.listeners);
        let event = event.to_string();
        Ok(Unsubscribe::new(move || remove_listener(&listeners, &event, id)))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
