//! Storage area trait.
//!
//! Defines the host key-value facility that settings are read from and
//! written to. The settings layer treats it as an external collaborator:
//! persistence, quotas and cross-process sync belong to the implementation.

use super::events::{ChangeListener, ListenerId};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Asynchronous key-value facility with change notifications.
///
/// All areas must be thread-safe (`Send + Sync`) for use with tokio.
/// Writes must announce what they changed to every registered listener;
/// the settings layer never notifies watchers on its own.
///
/// # Example
///
/// ```ignore
/// use settings_watch::storage::{MemoryArea, StorageArea};
///
/// let area = MemoryArea::new();
/// let id = area.add_listener(Arc::new(|changes| println!("{changes:?}")));
/// area.set(items).await?;
/// area.remove_listener(id);
/// ```
#[async_trait]
pub trait StorageArea: Send + Sync + 'static {
    /// Fetches the stored values for `keys`.
    ///
    /// Keys without a stored value are simply missing from the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn get(&self, keys: &[String]) -> Result<Map<String, Value>>;

    /// Stores every entry of `items`, overwriting existing values.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn set(&self, items: Map<String, Value>) -> Result<()>;

    /// Removes the stored values for `keys`. Missing keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn remove(&self, keys: &[String]) -> Result<()>;

    /// Registers a change listener.
    fn add_listener(&self, listener: ChangeListener) -> ListenerId;

    /// Removes a change listener. Returns `false` if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}
