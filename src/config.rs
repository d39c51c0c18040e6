//! Configuration for settings-watch.
//!
//! Loads the storage backend selection and the default settings from a TOML
//! file:
//!
//! ```toml
//! [storage]
//! backend = "redb"
//! path = "~/.settings-watch/settings.redb"
//!
//! [defaults]
//! theme = "light"
//! count = 0
//! ```
//!
//! Every section is optional; a missing section falls back to
//! [`StorageConfig::default`] and empty defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::settings::{Defaults, SettingsStore};

/// Name of the per-user config and data directory.
pub const APP_DIR: &str = "settings-watch";

/// File name looked up inside the user config directory.
pub const CONFIG_FILE: &str = "settings.toml";

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    /// Default value for every known setting.
    #[serde(default)]
    pub defaults: toml::Table,
}

/// Which storage area to use and where it lives.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Database file for the redb backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Redb,
    Memory,
}

impl Config {
    /// Load configuration from the default location, or return the default
    /// configuration if no file exists there.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from(path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - Required fields are missing or have invalid types
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate configuration, returning non-fatal warnings.
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.storage.backend == Backend::Redb && self.storage.path.is_none() {
            result.warnings.push(format!(
                "storage.path not set, using {}",
                default_database_path().map_or_else(
                    || "settings.redb in the working directory".to_string(),
                    |p| p.display().to_string()
                )
            ));
        }

        if self.storage.backend == Backend::Memory && self.storage.path.is_some() {
            result
                .warnings
                .push("storage.path is ignored by the memory backend".to_string());
        }

        if self.defaults.is_empty() {
            result
                .warnings
                .push("no [defaults] configured, unset keys read as null".to_string());
        }

        result
    }

    /// The configured defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be represented as JSON.
    pub fn defaults(&self) -> Result<Defaults> {
        Defaults::from_serialize(&self.defaults).context("Invalid [defaults] table")
    }

    /// Database path for the redb backend, with `~` expanded.
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .path
            .as_deref()
            .map(expand_home)
            .or_else(default_database_path)
            .unwrap_or_else(|| PathBuf::from("settings.redb"))
    }

    /// Open the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if the defaults are invalid or the database cannot
    /// be opened.
    pub fn open_store(&self) -> Result<SettingsStore> {
        let defaults = self.defaults()?;
        match self.storage.backend {
            Backend::Memory => Ok(SettingsStore::memory(defaults)),
            Backend::Redb => SettingsStore::open(self.database_path(), defaults),
        }
    }
}

/// `<config_dir>/settings-watch/settings.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
}

/// `<home>/.settings-watch/settings.redb`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|d| d.join(format!(".{APP_DIR}")).join("settings.redb"))
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
