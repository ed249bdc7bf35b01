//! Error types for rate-history

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for rate-history
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Snapshot store unreadable at {path}: {source}")]
    StoreUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read snapshot {filename}: {source}")]
    SnapshotRead {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot {filename}: {reason}")]
    SnapshotParse { filename: String, reason: String },

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Unknown period: {0}")]
    UnknownPeriod(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl HistoryError {
    /// Whether this error should abort the whole run rather than a single period
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HistoryError::StoreUnreadable { .. } | HistoryError::ConfigError(_)
        )
    }
}

/// Result type alias for rate-history operations
pub type Result<T> = std::result::Result<T, HistoryError>;
