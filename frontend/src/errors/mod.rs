//! Global error types shared across the session core.
//!
//! Authentication errors live with the auth module; this module covers the
//! persistence backends and configuration loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a [`StorageBackend`](crate::storage::StorageBackend).
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error while reading or writing a file-backed scope.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisted data exists but cannot be parsed.
    #[error("corrupt storage at {location}: {reason}")]
    Corrupt { location: String, reason: String },

    /// JSON serialization error while writing.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::Corrupt {
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised while loading or validating [`PortalConfig`](crate::config::PortalConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
