//! Error types for the sync store.

use crate::config::ConfigError;
use mirrorkv_engine::EngineError;
use mirrorkv_remote::RemoteError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for sync store operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync store operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The database path could not be resolved to an absolute file path.
    #[error("cannot resolve database path {path:?}: {message}")]
    PathResolution {
        /// The path as supplied by the caller.
        path: PathBuf,
        /// Why resolution failed.
        message: String,
    },

    /// A remote store operation failed during load.
    ///
    /// Upload failures after a committed write never surface here; they are
    /// downgraded to a warning because the local commit already succeeded.
    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// A fetched snapshot could not be written to the local database path.
    #[error("cannot materialize snapshot at {path:?}: {source}")]
    SnapshotWrite {
        /// The local database path.
        path: PathBuf,
        /// The underlying I/O failure.
        source: io::Error,
    },

    /// The local engine failed to open or run a transaction.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Serializing the database to a snapshot failed.
    #[error("snapshot serialization failed: {source}")]
    Serialization {
        /// The underlying engine failure.
        source: EngineError,
    },
}

impl SyncError {
    /// Creates a path resolution error.
    pub fn path_resolution(path: &Path, message: impl Into<String>) -> Self {
        Self::PathResolution {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SyncError::path_resolution(Path::new("db"), "path has no file name");
        assert!(err.to_string().contains("path has no file name"));

        let err = SyncError::from(RemoteError::transport("connection reset"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn remote_not_found_never_escapes_as_sync_error() {
        // NotFound is consumed by load(); if it ever reaches SyncError the
        // wrapping still identifies it, which the sync store relies on NOT
        // having to check.
        let err = SyncError::from(RemoteError::not_found("b", "k"));
        assert!(matches!(err, SyncError::Remote(r) if r.is_not_found()));
    }
}
