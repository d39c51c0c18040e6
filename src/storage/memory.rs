//! In-memory storage area.
//!
//! Provides a fast, non-persistent settings area using DashMap for
//! concurrent access. Ideal for testing, development, and embedded use cases.

use super::area::StorageArea;
use super::events::{ChangeBus, ChangeListener, ChangeSet, ListenerId, StorageChange};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory storage area using DashMap.
///
/// Writes emit a change batch containing only the keys whose value actually
/// changed. [`MemoryArea::emit`] lets tests synthesize notifications without
/// touching the data.
///
/// # Example
///
/// ```ignore
/// use settings_watch::storage::MemoryArea;
///
/// let area = MemoryArea::new();
/// area.insert("theme", json!("dark"));
/// ```
#[derive(Default)]
pub struct MemoryArea {
    data: DashMap<String, Value>,
    bus: ChangeBus,
    reads: AtomicUsize,
}

impl MemoryArea {
    /// Creates a new empty in-memory area.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an area pre-populated with `items`, without emitting changes.
    pub fn with_values(items: Map<String, Value>) -> Self {
        let area = Self::new();
        for (key, value) in items {
            area.data.insert(key, value);
        }
        area
    }

    /// Stores a value without emitting a change batch.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Delivers a synthesized change batch to every listener.
    ///
    /// Returns the number of listeners invoked.
    pub fn emit(&self, changes: &ChangeSet) -> usize {
        self.bus.emit(changes)
    }

    /// Number of `get` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of registered change listeners.
    pub fn listener_count(&self) -> usize {
        self.bus.listener_count()
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl StorageArea for MemoryArea {
    async fn get(&self, keys: &[String]) -> Result<Map<String, Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let mut found = Map::new();
        for key in keys {
            if let Some(value) = self.data.get(key) {
                found.insert(key.clone(), value.clone());
            }
        }
        Ok(found)
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        let mut changes = ChangeSet::new();

        for (key, value) in items {
            let old = self.data.insert(key.clone(), value.clone());
            if old.as_ref() != Some(&value) {
                changes.insert(key, StorageChange::new(old, Some(value)));
            }
        }

        self.bus.emit(&changes);
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<()> {
        let mut changes = ChangeSet::new();

        for key in keys {
            if let Some((key, old)) = self.data.remove(key) {
                changes.insert(key, StorageChange::new(Some(old), None));
            }
        }

        self.bus.emit(&changes);
        Ok(())
    }

    fn add_listener(&self, listener: ChangeListener) -> ListenerId {
        self.bus.add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.bus.remove_listener(id)
    }
}
