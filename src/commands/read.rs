//! Read commands:
//! - `settings-watch get [KEYS...]` - Current values, defaults applied
//! - `settings-watch defaults` - The configured defaults

use anyhow::{Context, Result};

use super::print_json;
use settings_watch::config::Config;

/// Print a snapshot of `keys`, or of every key with a default when empty.
pub async fn get(config: &Config, keys: Vec<String>) -> Result<()> {
    let store = config.open_store()?;

    let keys = if keys.is_empty() {
        store.defaults().keys().map(str::to_string).collect()
    } else {
        keys
    };
    if keys.is_empty() {
        anyhow::bail!("No keys given and no [defaults] configured");
    }

    let snapshot = store
        .read_settings(keys)
        .await
        .context("Failed to read settings")?;

    print_json(&snapshot)
}

/// Print the configured defaults.
pub fn defaults(config: &Config) -> Result<()> {
    let defaults = config.defaults()?;
    print_json(defaults.as_map())
}
