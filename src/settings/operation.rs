//! Awaitable, watchable settings reads.
//!
//! A [`WatchableOperation`] owns one read of a key subset. Await it for the
//! snapshot, chain continuations onto it, or call [`WatchableOperation::watch`]
//! to also receive a fresh snapshot every time one of its keys changes.
//!
//! # Example
//!
//! ```ignore
//! let display = store.read_settings(["theme", "count"]).watch(|snapshot| {
//!     println!("theme is now {}", snapshot.get::<String>("theme").unwrap());
//! });
//!
//! // Later
//! display.unwatch();
//! ```

use super::SettingsStore;
use super::error::{Error, Result};
use super::snapshot::{KeySet, Snapshot};
use super::watch::{self, SharedRead};
use crate::storage::ListenerId;
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;
use tracing::debug;

/// Completion state of the read behind an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// The read has not completed yet.
    Pending,
    /// The read produced a snapshot.
    Resolved,
    /// The read failed; awaiting yields the error.
    Rejected,
}

/// A single settings read that can be awaited and watched.
///
/// The read is issued once, when the operation is created. Watching is
/// orthogonal to completion: `watch` and `unwatch` may be called any number
/// of times, before or after the read resolves. Dropping the operation
/// removes any watchers still attached.
#[must_use = "dropping a WatchableOperation removes its watchers"]
pub struct WatchableOperation {
    store: SettingsStore,
    keys: KeySet,
    read: SharedRead,
    listeners: Mutex<Vec<ListenerId>>,
}

impl WatchableOperation {
    pub(crate) fn new(store: SettingsStore, keys: KeySet, read: SharedRead) -> Self {
        Self {
            store,
            keys,
            read,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Deliver this operation's snapshot to `callback`, then a fresh
    /// snapshot after every change to one of its keys.
    ///
    /// The first delivery is the original read, so the callback sees current
    /// state without waiting for a change. Each call attaches an independent
    /// watcher: two watchers mean two reads and two deliveries per change.
    ///
    /// Takes the operation and hands it back, so a chained read keeps its
    /// watchers only while the returned value is held. Discarding it
    /// unwatches immediately and is flagged by `unused_must_use`:
    ///
    /// ```compile_fail
    /// #![deny(unused_must_use)]
    /// # use settings_watch::settings::SettingsStore;
    /// # fn demo(store: SettingsStore) {
    /// store.read_settings(["theme"]).watch(|_| {});
    /// # }
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn watch<F>(self, callback: F) -> Self
    where
        F: Fn(Snapshot) + Send + Sync + 'static,
    {
        let id = watch::attach(
            &self.store,
            &self.keys,
            Arc::new(callback),
            Some(self.read.clone()),
        );
        self.listeners.lock().push(id);
        self
    }

    /// Detach every watcher attached by [`WatchableOperation::watch`].
    ///
    /// A no-op when nothing is attached. Reads already issued still complete
    /// and are delivered; no new ones are started.
    pub fn unwatch(&self) -> &Self {
        let ids = std::mem::take(&mut *self.listeners.lock());
        if !ids.is_empty() {
            debug!(keys = ?self.keys, watchers = ids.len(), "Detaching settings watchers");
        }
        for id in ids {
            self.store.area().remove_listener(id);
        }
        self
    }

    /// True while at least one watcher is attached.
    pub fn is_watching(&self) -> bool {
        !self.listeners.lock().is_empty()
    }

    /// Number of attached watchers.
    pub fn watcher_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// The keys this operation reads.
    pub fn keys(&self) -> &KeySet {
        &self.keys
    }

    /// Whether the read is still pending, resolved or rejected.
    pub fn state(&self) -> OperationState {
        match self.read.peek() {
            None => OperationState::Pending,
            Some(Ok(_)) => OperationState::Resolved,
            Some(Err(_)) => OperationState::Rejected,
        }
    }

    /// Continue with `on_fulfilled` or `on_rejected` once the read completes.
    pub fn then<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> BoxFuture<'static, U>
    where
        U: Send + 'static,
        F: FnOnce(Snapshot) -> U + Send + 'static,
        R: FnOnce(Error) -> U + Send + 'static,
    {
        self.read
            .clone()
            .map(move |result| match result {
                Ok(snapshot) => on_fulfilled(snapshot),
                Err(e) => on_rejected(e),
            })
            .boxed()
    }

    /// Transform the snapshot; a failed read passes through unchanged.
    pub fn map<U, F>(&self, f: F) -> BoxFuture<'static, Result<U>>
    where
        U: Send + 'static,
        F: FnOnce(Snapshot) -> U + Send + 'static,
    {
        self.read.clone().map(move |result| result.map(f)).boxed()
    }

    /// Replace a failed read with the snapshot produced by `f`.
    pub fn recover<F>(&self, f: F) -> BoxFuture<'static, Snapshot>
    where
        F: FnOnce(Error) -> Snapshot + Send + 'static,
    {
        self.read
            .clone()
            .map(move |result| result.unwrap_or_else(f))
            .boxed()
    }

    /// Run `f` when the read completes, successfully or not, and pass the
    /// result through.
    pub fn finally<F>(&self, f: F) -> BoxFuture<'static, Result<Snapshot>>
    where
        F: FnOnce() + Send + 'static,
    {
        self.read
            .clone()
            .map(move |result| {
                f();
                result
            })
            .boxed()
    }
}

impl Drop for WatchableOperation {
    fn drop(&mut self) {
        self.unwatch();
    }
}

impl IntoFuture for WatchableOperation {
    type Output = Result<Snapshot>;
    type IntoFuture = SharedRead;

    fn into_future(self) -> Self::IntoFuture {
        self.read.clone()
    }
}

impl IntoFuture for &WatchableOperation {
    type Output = Result<Snapshot>;
    type IntoFuture = SharedRead;

    fn into_future(self) -> Self::IntoFuture {
        self.read.clone()
    }
}

impl fmt::Debug for WatchableOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchableOperation")
            .field("keys", &self.keys)
            .field("state", &self.state())
            .field("watchers", &self.watcher_count())
            .finish()
    }
}
