//! Storage areas the settings layer runs on top of.
//!
//! A storage area is the host key-value facility: async `get`/`set`/`remove`
//! plus change listeners. Two areas ship with the crate:
//!
//! - **RedbArea**: Persistent storage with ACID guarantees (default for CLI)
//! - **MemoryArea**: Fast, non-persistent storage (ideal for testing/embedding)
//!
//! # Custom Areas
//!
//! Implement the `StorageArea` trait to use custom storage:
//!
//! ```ignore
//! use settings_watch::storage::{ChangeBus, StorageArea};
//!
//! struct RemoteArea { client: Client, bus: ChangeBus }
//! impl StorageArea for RemoteArea { /* ... */ }
//!
//! let store = SettingsStore::new(RemoteArea::connect()?, defaults);
//! ```

mod area;
mod events;
mod memory;
mod redb;

pub use area::StorageArea;
pub use events::{ChangeBus, ChangeListener, ChangeSet, ListenerId, StorageChange};
pub use memory::MemoryArea;
pub use self::redb::RedbArea;
