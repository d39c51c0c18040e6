//! Typed settings with read-then-watch semantics.
//!
//! [`SettingsStore`] holds the defaults and talks to a
//! [`StorageArea`](crate::storage::StorageArea). Every read produces a
//! [`WatchableOperation`]: await it for a one-shot [`Snapshot`], or watch it
//! to keep receiving fresh snapshots as the underlying keys change.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use settings_watch::settings::{Defaults, SettingsStore};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let defaults = Defaults::from_serialize(&json!({ "theme": "light", "count": 0 }))?;
//! let store = SettingsStore::memory(defaults);
//!
//! store.set("count", &5).await?;
//!
//! let snapshot = store.read_settings(["theme", "count"]).await?;
//! assert_eq!(snapshot.get::<String>("theme")?, "light");
//! assert_eq!(snapshot.get::<u32>("count")?, 5);
//! # Ok(())
//! # }
//! ```

mod error;
mod operation;
mod snapshot;
mod store;
mod watch;

#[cfg(test)]
mod property_tests;

pub use error::{Error, HostError, Result};
pub use operation::{OperationState, WatchableOperation};
pub use snapshot::{Defaults, KeySet, Snapshot};
pub use store::SettingsStore;
pub use watch::Subscription;
