//! Change notifications for storage areas.
//!
//! A [`ChangeBus`] is the listener registry a storage area embeds. Listeners
//! are registered with [`ChangeBus::add_listener`] and removed by the
//! [`ListenerId`] handle it returns, so removal never depends on closure
//! identity.

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Old and new value of a single key in a change batch.
///
/// `None` means the key was absent on that side of the change
/// (newly created or removed).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl StorageChange {
    /// Create a change record.
    pub fn new(old_value: Option<Value>, new_value: Option<Value>) -> Self {
        Self {
            old_value,
            new_value,
        }
    }
}

/// A batch of changes, keyed by the changed setting key.
pub type ChangeSet = BTreeMap<String, StorageChange>;

/// Callback invoked with every change batch emitted on a bus.
pub type ChangeListener = Arc<dyn Fn(&ChangeSet) + Send + Sync>;

/// Handle identifying one listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Registry of change listeners.
///
/// Each registration is independent: adding the same closure twice yields
/// two ids and two invocations per emitted batch.
#[derive(Default)]
pub struct ChangeBus {
    listeners: RwLock<HashMap<ListenerId, ChangeListener>>,
    next_id: AtomicU64,
}

impl ChangeBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener, returning the handle used to remove it.
    pub fn add_listener(&self, listener: ChangeListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().insert(id, listener);
        id
    }

    /// Remove a listener.
    ///
    /// Returns `false` if the id was never registered or was already removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.write().remove(&id).is_some()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Deliver a batch to every registered listener.
    ///
    /// Empty batches are not delivered. Listeners are invoked outside the
    /// registry lock, so a listener may add or remove registrations.
    /// Returns the number of listeners invoked.
    pub fn emit(&self, changes: &ChangeSet) -> usize {
        if changes.is_empty() {
            return 0;
        }

        let listeners: Vec<ChangeListener> = self.listeners.read().values().cloned().collect();
        for listener in &listeners {
            listener(changes);
        }
        listeners.len()
    }
}

impl fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
