//! Error types and error handling for the docdex engine.
//!
//! This module defines the error taxonomy used throughout the
//! crate. Transport-specific error mapping (HTTP status codes etc.)
//! belongs to the adapter that embeds the engine.

use thiserror::Error;

/// Result type alias for docdex operations
pub type Result<T> = std::result::Result<T, DocdexError>;

/// Main error type for the docdex engine
#[derive(Error, Debug)]
pub enum DocdexError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Store operation failed for '{path}': {message}")]
    StoreFailure { path: String, message: String },

    #[error("Index operation failed for '{path}': {message}")]
    IndexFailure { path: String, message: String },

    #[error("Sync reconciliation failed after {deleted} deletion(s): {source}")]
    SyncFailure {
        deleted: usize,
        #[source]
        source: Box<DocdexError>,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl DocdexError {
    /// Wrap a store-layer failure with the offending document path
    pub fn store(path: impl Into<String>, message: impl Into<String>) -> Self {
        DocdexError::StoreFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap an index-layer failure with the offending document path
    pub fn index(path: impl Into<String>, message: impl Into<String>) -> Self {
        DocdexError::IndexFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap a reconciliation failure, preserving the count of deletions
    /// that succeeded before it
    pub fn sync(deleted: usize, source: DocdexError) -> Self {
        DocdexError::SyncFailure {
            deleted,
            source: Box::new(source),
        }
    }

    /// Check if this is a "not found" type error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DocdexError::DocumentNotFound(_) | DocdexError::InvalidPath(_)
        )
    }

    /// Check if this is a bad request error (invalid input)
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            DocdexError::ConfigError(_) | DocdexError::InvalidQuery(_)
        )
    }
}
