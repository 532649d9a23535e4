//! Error types and Result aliases for repochunk.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.

use thiserror::Error;

/// Result type alias using repochunk's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for repochunk operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Repository open, sync or URL error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Indexing error.
    #[error("indexing error: {0}")]
    Indexing(#[from] IndexingError),

    /// Chunk store error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Repository errors.
///
/// `InvalidUrl` is raised while configuring, `Open` is fatal for the caller's
/// session, `Sync` is retryable because the recorded head is left untouched,
/// and `Callback` is only ever logged by the sync loop.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The URL does not name a repository on a recognized host.
    #[error("invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The local checkout could not be cloned or opened.
    #[error("cannot open repository at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Pulling or diffing failed.
    #[error("sync of '{name}' failed: {reason}")]
    Sync { name: String, reason: String },

    /// A change callback returned an error or panicked.
    #[error("{kind} callback failed for '{path}': {reason}")]
    Callback {
        kind: &'static str,
        path: String,
        reason: String,
    },
}

/// Indexing errors.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Path does not live under the indexed repository root.
    #[error("'{path}' is outside the repository root '{root}'")]
    OutsideRoot { path: String, root: String },

    /// File processing error.
    #[error("failed to process file '{path}': {reason}")]
    ProcessFailed { path: String, reason: String },
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// `SQLite` database error.
    #[error("database error: {0}")]
    Database(String),

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl RepositoryError {
    /// Create an invalid-URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create an open error.
    pub fn open(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a sync error.
    pub fn sync(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Sync {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
