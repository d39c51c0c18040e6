//! Typed settings over asynchronous key-value storage, with change watching.
//!
//! - [`settings`] - [`SettingsStore`](settings::SettingsStore) and
//!   [`WatchableOperation`](settings::WatchableOperation): reads that merge
//!   stored values over defaults and can be watched for changes
//! - [`storage`] - the storage area contract plus memory and redb areas
//! - [`config`] - TOML configuration for the backend and defaults

pub mod config;
pub mod settings;
pub mod storage;
