//! Watcher registration and delivery.
//!
//! Every watcher owns one change listener on the storage area and one
//! delivery task. The listener turns each relevant change batch into a fresh
//! read; the delivery task hands snapshots to the callback one at a time,
//! starting with the initial snapshot when there is one.

use super::SettingsStore;
use super::error::Result;
use super::snapshot::{KeySet, Snapshot};
use crate::storage::{ChangeListener, ChangeSet, ListenerId, StorageArea};
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// The single read behind an operation, shared by every consumer.
pub(crate) type SharedRead = Shared<BoxFuture<'static, Result<Snapshot>>>;

/// Callback receiving snapshots.
pub(crate) type Callback = Arc<dyn Fn(Snapshot) + Send + Sync>;

/// Register a watcher for `keys` and start its delivery task.
///
/// When `initial` is given, its snapshot is delivered before any
/// change-triggered one. A failed read, initial or not, delivers nothing.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub(crate) fn attach(
    store: &SettingsStore,
    keys: &KeySet,
    callback: Callback,
    initial: Option<SharedRead>,
) -> ListenerId {
    let runtime = Handle::current();
    let (updates, pending) = mpsc::unbounded_channel();
    runtime.spawn(deliver(initial, pending, callback));

    // Weak so a forgotten registration does not keep the store alive
    let owner = Arc::downgrade(&store.inner);
    let watched = keys.clone();
    let listener: ChangeListener = Arc::new(move |changes: &ChangeSet| {
        // A closed channel means the delivery task is gone
        if !watched.intersects(changes) || updates.is_closed() {
            return;
        }
        let Some(inner) = owner.upgrade() else {
            return;
        };

        let store = SettingsStore { inner };
        let keys = watched.clone();
        let updates = updates.clone();
        runtime.spawn(async move {
            match store.fetch(&keys).await {
                Ok(snapshot) => {
                    // Receiver gone means the delivery task already stopped
                    let _ = updates.send(snapshot);
                },
                Err(e) => {
                    warn!(keys = ?keys, error = %e, "Dropping settings update after failed read");
                },
            }
        });
    });

    let id = store.area().add_listener(listener);
    debug!(keys = ?keys, listener = %id, "Attached settings watcher");
    id
}

async fn deliver(
    initial: Option<SharedRead>,
    mut pending: mpsc::UnboundedReceiver<Snapshot>,
    callback: Callback,
) {
    if let Some(initial) = initial {
        match initial.await {
            Ok(snapshot) => invoke(&callback, snapshot),
            Err(e) => debug!(error = %e, "Initial settings read failed, skipping first delivery"),
        }
    }

    while let Some(snapshot) = pending.recv().await {
        invoke(&callback, snapshot);
    }
}

/// Run one callback; a panic is logged and the watcher keeps going.
fn invoke(callback: &Callback, snapshot: Snapshot) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| callback(snapshot))) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        warn!(panic = %message, "Settings watcher callback panicked");
    }
}

/// Cleanup handle for [`SettingsStore::watch_settings`].
///
/// [`Subscription::unsubscribe`] removes exactly the one listener registered
/// for this subscription and is idempotent. Dropping the handle also
/// unsubscribes.
#[must_use = "dropping a Subscription stops delivering updates"]
pub struct Subscription {
    area: Arc<dyn StorageArea>,
    id: Mutex<Option<ListenerId>>,
}

impl Subscription {
    pub(crate) fn new(area: Arc<dyn StorageArea>, id: ListenerId) -> Self {
        Self {
            area,
            id: Mutex::new(Some(id)),
        }
    }

    /// Stop delivering updates.
    ///
    /// Returns `true` if this call removed the listener, `false` if the
    /// subscription was already cancelled.
    pub fn unsubscribe(&self) -> bool {
        let Some(id) = self.id.lock().take() else {
            return false;
        };
        debug!(listener = %id, "Removing settings subscription");
        self.area.remove_listener(id)
    }

    /// True until [`Subscription::unsubscribe`] is called.
    pub fn is_active(&self) -> bool {
        self.id.lock().is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("listener", &*self.id.lock())
            .finish_non_exhaustive()
    }
}
