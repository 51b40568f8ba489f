//! Error types for the rental listing collection system.

use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database unavailable: {0}")]
    DatabaseUnavailable(String),

    #[error("Corrupt entry: {0}")]
    CorruptEntry(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised by record source adapters and the page fetcher
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No source supports URL: {0}")]
    Unsupported(String),

    #[error("Extraction failed: {0}")]
    Extract(String),
}

/// API-level errors for the listing service and CLI
#[derive(Debug, Error)]
pub enum HearthError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("No source supports URL: {0}")]
    UnsupportedUrl(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SourceError> for HearthError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Unsupported(url) => HearthError::UnsupportedUrl(url),
            SourceError::Http { .. } | SourceError::Transport(_) => {
                HearthError::Fetch(err.to_string())
            }
            SourceError::Extract(_) => HearthError::Source(err.to_string()),
        }
    }
}

impl From<config::ConfigError> for HearthError {
    fn from(err: config::ConfigError) -> Self {
        HearthError::Config(err.to_string())
    }
}
