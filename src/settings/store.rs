//! Typed settings store over a storage area.
//!
//! Holds the defaults and bridges caller intent (which keys, which values)
//! to the storage area. Reads merge stored values over the defaults; writes
//! go straight to the area, whose change notifications reach any watchers.

use super::error::{Error, Result, host_error};
use super::operation::WatchableOperation;
use super::snapshot::{Defaults, KeySet, Snapshot, to_object};
use super::watch::{self, Subscription};
use crate::storage::{MemoryArea, RedbArea, StorageArea};
use futures::FutureExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub(crate) struct StoreInner {
    area: Arc<dyn StorageArea>,
    defaults: Defaults,
}

/// Typed settings store.
///
/// `SettingsStore` is `Clone`; clones share the storage area and defaults.
///
/// # Example
///
/// ```ignore
/// use settings_watch::settings::{Defaults, SettingsStore};
/// use serde_json::json;
///
/// let defaults = Defaults::from_serialize(&json!({ "theme": "light", "count": 0 }))?;
/// let store = SettingsStore::memory(defaults);
///
/// store.write_settings(&json!({ "count": 5 })).await?;
/// let snapshot = store.read_settings(["theme", "count"]).await?;
/// assert_eq!(snapshot.get::<u32>("count")?, 5);
/// ```
#[derive(Clone)]
pub struct SettingsStore {
    pub(crate) inner: Arc<StoreInner>,
}

impl SettingsStore {
    /// Creates a store over `area`.
    pub fn new<A: StorageArea>(area: A, defaults: Defaults) -> Self {
        Self::with_area(Arc::new(area), defaults)
    }

    /// Creates a store over an area the caller keeps a handle to.
    pub fn with_area(area: Arc<dyn StorageArea>, defaults: Defaults) -> Self {
        Self {
            inner: Arc::new(StoreInner { area, defaults }),
        }
    }

    /// Creates a store backed by a fresh in-memory area.
    pub fn memory(defaults: Defaults) -> Self {
        Self::new(MemoryArea::new(), defaults)
    }

    /// Creates a store backed by a redb database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P, defaults: Defaults) -> anyhow::Result<Self> {
        Ok(Self::new(RedbArea::open(path)?, defaults))
    }

    /// The defaults this store was created with.
    pub fn defaults(&self) -> &Defaults {
        &self.inner.defaults
    }

    /// The storage area this store reads from and writes to.
    pub fn area(&self) -> &Arc<dyn StorageArea> {
        &self.inner.area
    }

    /// Read `keys` once, returning an operation that can be awaited and
    /// watched.
    ///
    /// The read is issued before this returns, so the snapshot reflects
    /// storage as of the call. It resolves to a snapshot holding every
    /// requested key, or fails with [`Error::StorageRead`].
    pub fn read_settings<I>(&self, keys: I) -> WatchableOperation
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let keys = KeySet::new(keys);

        let store = self.clone();
        let read_keys = keys.clone();
        let read = async move { store.fetch(&read_keys).await }
            .boxed()
            .shared();

        // Poll once so the area sees the read now rather than on first await.
        // A read that completes immediately is cached by the shared future.
        let _ = read.clone().now_or_never();

        WatchableOperation::new(self.clone(), keys, read)
    }

    /// Read `keys` and return the snapshot directly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageRead`] if the storage area fails.
    pub async fn snapshot<I>(&self, keys: I) -> Result<Snapshot>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.fetch(&KeySet::new(keys)).await
    }

    /// Read a single setting as `V`, falling back to its default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageRead`] if the storage area fails, or
    /// [`Error::Decode`] if the value is not a `V`.
    pub async fn get<V: DeserializeOwned>(&self, key: &str) -> Result<V> {
        self.fetch(&KeySet::new([key])).await?.get(key)
    }

    /// Call `callback` with a fresh snapshot of `keys` after every change to
    /// one of them, until the returned subscription is cancelled or dropped.
    ///
    /// Unlike [`WatchableOperation::watch`] there is no initial delivery.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn watch_settings<I, F>(&self, keys: I, callback: F) -> Subscription
    where
        I: IntoIterator,
        I::Item: Into<String>,
        F: Fn(Snapshot) + Send + Sync + 'static,
    {
        let keys = KeySet::new(keys);
        let id = watch::attach(self, &keys, Arc::new(callback), None);
        Subscription::new(Arc::clone(&self.inner.area), id)
    }

    /// Write every entry of `partial`, which must serialize to an object.
    ///
    /// Watchers are notified by the storage area, not by this call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAnObject`] or [`Error::Encode`] if `partial` is not
    /// a key/value object, or [`Error::StorageWrite`] if the area fails.
    pub async fn write_settings<T: Serialize + ?Sized>(&self, partial: &T) -> Result<()> {
        self.write_map(to_object(partial)?).await
    }

    /// Write a single setting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if `value` cannot be serialized, or
    /// [`Error::StorageWrite`] if the area fails.
    pub async fn set<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> Result<()> {
        let value = serde_json::to_value(value).map_err(Error::encode)?;
        let mut items = Map::new();
        items.insert(key.to_string(), value);
        self.write_map(items).await
    }

    /// Remove the stored values for `keys` so reads fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] if the area fails.
    pub async fn reset_settings<I>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let keys = KeySet::new(keys);
        self.inner
            .area
            .remove(keys.as_slice())
            .await
            .map_err(|e| Error::storage_write(keys.as_slice(), host_error(e)))?;

        debug!(keys = ?keys, "Reset settings to defaults");
        Ok(())
    }

    /// One read against the area, merged over the defaults.
    pub(crate) async fn fetch(&self, keys: &KeySet) -> Result<Snapshot> {
        let stored = self
            .inner
            .area
            .get(keys.as_slice())
            .await
            .map_err(|e| Error::storage_read(keys.as_slice(), host_error(e)))?;

        debug!(keys = ?keys, stored = stored.len(), "Read settings");
        Ok(self.inner.defaults.resolve(keys, &stored))
    }

    async fn write_map(&self, items: Map<String, Value>) -> Result<()> {
        let keys: Vec<String> = items.keys().cloned().collect();
        if let Err(e) = self.inner.area.set(items).await {
            return Err(Error::storage_write(&keys, host_error(e)));
        }

        debug!(keys = ?keys, "Wrote settings");
        Ok(())
    }
}

impl fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsStore")
            .field("defaults", &self.inner.defaults)
            .finish_non_exhaustive()
    }
}
