//! Error types for Artkeep.
//!
//! A single error enum covers the artwork lifecycle: resolution, backup,
//! removal, restore, and the upstream metadata provider. Per-file failures
//! are reported inside batch results; only journal failures abort a batch.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the Artkeep library.
#[derive(Debug, Error)]
pub enum ArtkeepError {
    // Lookup errors
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Operation {id} was already restored or cannot be undone")]
    AlreadyRestored { id: u64 },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    // File lifecycle errors
    #[error("Backup of {path} failed: {message}")]
    BackupWriteFailed { path: PathBuf, message: String },

    #[error("Removing {path} failed (backup kept at {backup}): {message}")]
    DeleteFailed {
        path: PathBuf,
        backup: PathBuf,
        message: String,
    },

    #[error("Restoring {path} failed: {message}")]
    RestoreFailed { path: PathBuf, message: String },

    // Journal errors
    #[error("Operations journal at {path} is locked by another process")]
    JournalLocked { path: PathBuf },

    // Upstream metadata provider errors
    #[error("Metadata provider unavailable: {message}")]
    UpstreamUnavailable {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Artkeep operations.
pub type Result<T> = std::result::Result<T, ArtkeepError>;

impl From<std::io::Error> for ArtkeepError {
    fn from(err: std::io::Error) -> Self {
        ArtkeepError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for ArtkeepError {
    fn from(err: serde_json::Error) -> Self {
        ArtkeepError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for ArtkeepError {
    fn from(err: reqwest::Error) -> Self {
        ArtkeepError::UpstreamUnavailable {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl ArtkeepError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ArtkeepError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Shorthand for a `NotFound` error.
    pub fn not_found(message: impl Into<String>) -> Self {
        ArtkeepError::NotFound {
            message: message.into(),
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// Custom error codes (application-defined, -32000 to -32099):
    /// - -32000: Metadata provider unreachable
    /// - -32001: Journal locked
    /// - -32002: Not found / already restored
    /// - -32003: File lifecycle failure (backup, delete, restore)
    /// - -32005: Validation error
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            ArtkeepError::UpstreamUnavailable { .. } => -32000,

            ArtkeepError::JournalLocked { .. } => -32001,

            ArtkeepError::NotFound { .. } | ArtkeepError::AlreadyRestored { .. } => -32002,

            ArtkeepError::BackupWriteFailed { .. }
            | ArtkeepError::DeleteFailed { .. }
            | ArtkeepError::RestoreFailed { .. } => -32003,

            ArtkeepError::Validation { .. } => -32005,

            ArtkeepError::InvalidParams { .. } => -32602,

            _ => -32603,
        }
    }

    /// Check if the caller may retry this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ArtkeepError::UpstreamUnavailable { .. })
    }
}
