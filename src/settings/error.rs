//! Error types for settings reads and writes.
//!
//! Every failure is local to the read or write that triggered it; nothing is
//! retried internally. Errors are `Clone` because one pending read is shared
//! by every consumer of a [`WatchableOperation`](super::WatchableOperation).

use std::sync::Arc;

/// Error reported by a storage area, shared between consumers.
pub type HostError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Settings errors with structured context.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The storage area failed during a read.
    #[error("failed to read settings {keys:?}: {source}")]
    StorageRead {
        keys: Vec<String>,
        #[source]
        source: HostError,
    },

    /// The storage area failed during a write.
    #[error("failed to write settings {keys:?}: {source}")]
    StorageWrite {
        keys: Vec<String>,
        #[source]
        source: HostError,
    },

    /// Defaults or a partial write did not serialize to a key/value object.
    #[error("settings must serialize to an object, got {kind}")]
    NotAnObject { kind: &'static str },

    /// A value could not be converted to JSON.
    #[error("failed to encode settings: {source}")]
    Encode {
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// A stored or default value did not match the requested type.
    #[error("failed to decode setting '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: Arc<serde_json::Error>,
    },
}

impl Error {
    /// Create a read error from a host-reported failure.
    pub fn storage_read(keys: &[String], source: impl Into<HostError>) -> Self {
        Self::StorageRead {
            keys: keys.to_vec(),
            source: source.into(),
        }
    }

    /// Create a write error from a host-reported failure.
    pub fn storage_write(keys: &[String], source: impl Into<HostError>) -> Self {
        Self::StorageWrite {
            keys: keys.to_vec(),
            source: source.into(),
        }
    }

    pub(crate) fn encode(source: serde_json::Error) -> Self {
        Self::Encode {
            source: Arc::new(source),
        }
    }

    pub(crate) fn decode(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            key: key.into(),
            source: Arc::new(source),
        }
    }

    /// True for failures reported by the storage area.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::StorageRead { .. } | Self::StorageWrite { .. })
    }
}

/// Convert host `anyhow` errors into the shared error form.
pub(crate) fn host_error(err: anyhow::Error) -> HostError {
    let boxed: Box<dyn std::error::Error + Send + Sync + 'static> = err.into();
    Arc::from(boxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_read_message_names_keys() {
        let err = Error::storage_read(
            &["theme".to_string()],
            host_error(anyhow::anyhow!("quota exceeded")),
        );
        let msg = err.to_string();
        assert!(msg.contains("theme"));
        assert!(msg.contains("quota exceeded"));
        assert!(err.is_storage());
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error as _;

        let err = Error::storage_write(
            &["count".to_string()],
            host_error(anyhow::anyhow!("disk full")),
        );
        let source = err.source().expect("write error carries its source");
        assert_eq!(source.to_string(), "disk full");
    }

    #[test]
    fn test_not_an_object_is_not_storage() {
        let err = Error::NotAnObject { kind: "array" };
        assert!(!err.is_storage());
        assert_eq!(err.to_string(), "settings must serialize to an object, got array");
    }
}
