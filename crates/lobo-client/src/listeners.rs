//! Named event listeners attached to the connection channel.
//!
//! Screens register handlers under an *owner* tag. Registering the same
//! `(event, owner)` pair again replaces the previous handler instead of
//! adding a second one, so re-entering a screen never double-fires.
//! Removing something that isn't registered is a no-op.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use lobo_core::protocol::{SERVER_EVENT_NAMES, ServerEvent};

/// A listener callback.
pub type Handler = Arc<dyn Fn(&ServerEvent) + Send + Sync>;

struct Entry {
    owner: String,
    token: u64,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    by_event: HashMap<String, Vec<Entry>>,
    next_token: u64,
}

/// Shared listener table. Cloning yields another handle to the same table.
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Arc<Mutex<Registry>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // A panicking handler never runs under the lock, so the table is
        // consistent even if poisoned.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach `handler` to `event` on behalf of `owner`.
    ///
    /// The returned [`Subscription`] detaches the handler when dropped,
    /// unless it was replaced by a later registration for the same owner.
    pub fn on<F>(&self, event: &str, owner: &str, handler: F) -> Subscription
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        if !SERVER_EVENT_NAMES.contains(&event) {
            tracing::warn!(event, owner, "listening for an event the server never sends");
        }
        let mut reg = self.lock();
        reg.next_token += 1;
        let token = reg.next_token;
        let entries = reg.by_event.entry(event.to_string()).or_default();
        let entry = Entry {
            owner: owner.to_string(),
            token,
            handler: Arc::new(handler),
        };
        match entries.iter_mut().find(|e| e.owner == owner) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        Subscription {
            registry: Arc::downgrade(&self.inner),
            event: event.to_string(),
            owner: owner.to_string(),
            token,
        }
    }

    /// Detach `owner`'s handler for `event`. Returns whether one was removed.
    pub fn off(&self, event: &str, owner: &str) -> bool {
        let mut reg = self.lock();
        let Some(entries) = reg.by_event.get_mut(event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.owner != owner);
        before != entries.len()
    }

    /// Detach every handler registered by `owner` (screen teardown).
    pub fn off_owner(&self, owner: &str) -> usize {
        let mut reg = self.lock();
        let mut removed = 0;
        for entries in reg.by_event.values_mut() {
            let before = entries.len();
            entries.retain(|e| e.owner != owner);
            removed += before - entries.len();
        }
        removed
    }

    /// Number of handlers attached to `event`.
    pub fn count(&self, event: &str) -> usize {
        self.lock().by_event.get(event).map_or(0, Vec::len)
    }

    /// Invoke every handler for the event, in registration order.
    ///
    /// Handlers run outside the lock, so they may subscribe or unsubscribe.
    pub fn dispatch(&self, event: &ServerEvent) -> usize {
        let handlers: Vec<Handler> = self
            .lock()
            .by_event
            .get(event.name())
            .map(|entries| entries.iter().map(|e| Arc::clone(&e.handler)).collect())
            .unwrap_or_default();
        for handler in &handlers {
            (**handler)(event);
        }
        handlers.len()
    }
}

/// Guard that detaches a listener when dropped.
#[must_use = "dropping a Subscription detaches the listener immediately"]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    event: String,
    owner: String,
    token: u64,
}

impl Subscription {
    /// Keep the listener attached for the lifetime of the channel.
    pub fn forget(mut self) {
        self.registry = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.registry.upgrade() else {
            return;
        };
        let mut reg = inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entries) = reg.by_event.get_mut(&self.event) {
            entries.retain(|e| !(e.owner == self.owner && e.token == self.token));
        }
    }
}
