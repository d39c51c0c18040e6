//! Redb-backed storage area.
//!
//! Provides persistent settings storage using redb with ACID guarantees.
//! Values are stored as JSON bytes. Change batches are emitted after the
//! write transaction commits, and only for keys whose value changed.

use super::area::StorageArea;
use super::events::{ChangeBus, ChangeListener, ChangeSet, ListenerId, StorageChange};
use anyhow::{Context, Result};
use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

/// Table holding one JSON-encoded value per setting key.
pub(crate) const SETTINGS_TABLE: TableDefinition<'static, &'static str, &'static [u8]> =
    TableDefinition::new("settings");

/// Redb-backed storage area.
///
/// # Thread Safety
///
/// `RedbArea` is `Clone` and can be shared across threads. Clones share the
/// database and the change bus, so a write through one clone notifies
/// listeners registered through another.
#[derive(Clone)]
pub struct RedbArea {
    db: Arc<Database>,
    bus: Arc<ChangeBus>,
}

impl RedbArea {
    /// Opens or creates a redb database at the given path.
    ///
    /// Creates parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory cannot be created
    /// - Database file cannot be opened or created (permissions, disk full, etc.)
    /// - Initialization transaction fails to begin or commit
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }

        let db = Database::create(path)
            .with_context(|| format!("Failed to open settings database: {}", path.display()))?;

        // Create the table up front so reads on a fresh database succeed
        let write_txn = db
            .begin_write()
            .context("Failed to begin initialization transaction")?;
        {
            let _table = write_txn
                .open_table(SETTINGS_TABLE)
                .context("Failed to initialize settings table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initialization transaction")?;

        tracing::debug!(path = %path.display(), "Opened settings database");

        Ok(Self {
            db: Arc::new(db),
            bus: Arc::new(ChangeBus::new()),
        })
    }

    fn get_sync(&self, keys: &[String]) -> Result<Map<String, Value>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let table = read_txn
            .open_table(SETTINGS_TABLE)
            .context("Failed to open settings table")?;

        let mut found = Map::new();
        for key in keys {
            let stored = table
                .get(key.as_str())
                .with_context(|| format!("Failed to read key '{key}'"))?;

            if let Some(guard) = stored {
                let value: Value = serde_json::from_slice(guard.value())
                    .with_context(|| format!("Failed to decode value for key '{key}'"))?;
                found.insert(key.clone(), value);
            }
        }

        Ok(found)
    }

    fn set_sync(&self, items: Map<String, Value>) -> Result<ChangeSet> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        let mut changes = ChangeSet::new();
        {
            let mut table = write_txn
                .open_table(SETTINGS_TABLE)
                .context("Failed to open settings table")?;

            for (key, value) in items {
                let bytes = serde_json::to_vec(&value)
                    .with_context(|| format!("Failed to encode value for key '{key}'"))?;

                let old = table
                    .insert(key.as_str(), bytes.as_slice())
                    .with_context(|| format!("Failed to insert key '{key}'"))?
                    .map(|guard| serde_json::from_slice::<Value>(guard.value()))
                    .transpose()
                    .with_context(|| format!("Failed to decode previous value for key '{key}'"))?;

                if old.as_ref() != Some(&value) {
                    changes.insert(key, StorageChange::new(old, Some(value)));
                }
            }
        }

        write_txn
            .commit()
            .context("Failed to commit set transaction")?;

        Ok(changes)
    }

    fn remove_sync(&self, keys: &[String]) -> Result<ChangeSet> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        let mut changes = ChangeSet::new();
        {
            let mut table = write_txn
                .open_table(SETTINGS_TABLE)
                .context("Failed to open settings table")?;

            for key in keys {
                let old = table
                    .remove(key.as_str())
                    .with_context(|| format!("Failed to remove key '{key}'"))?
                    .map(|guard| serde_json::from_slice::<Value>(guard.value()))
                    .transpose()
                    .with_context(|| format!("Failed to decode removed value for key '{key}'"))?;

                if let Some(old) = old {
                    changes.insert(key.clone(), StorageChange::new(Some(old), None));
                }
            }
        }

        write_txn
            .commit()
            .context("Failed to commit remove transaction")?;

        Ok(changes)
    }
}

#[async_trait]
impl StorageArea for RedbArea {
    async fn get(&self, keys: &[String]) -> Result<Map<String, Value>> {
        let area = self.clone();
        let keys = keys.to_vec();
        tokio::task::spawn_blocking(move || area.get_sync(&keys))
            .await
            .context("Task join error")?
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        let area = self.clone();
        let changes = tokio::task::spawn_blocking(move || area.set_sync(items))
            .await
            .context("Task join error")??;

        self.bus.emit(&changes);
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<()> {
        let area = self.clone();
        let keys = keys.to_vec();
        let changes = tokio::task::spawn_blocking(move || area.remove_sync(&keys))
            .await
            .context("Task join error")??;

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
