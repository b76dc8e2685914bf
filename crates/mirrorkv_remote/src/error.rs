//! Error types for remote object store operations.

use thiserror::Error;

/// Result type for remote object store operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors that can occur talking to the remote object store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The requested object does not exist.
    ///
    /// This is a distinguished condition, not a failure: callers map it to
    /// "no prior snapshot".
    #[error("object not found: {bucket}/{key}")]
    NotFound {
        /// Bucket that was queried.
        bucket: String,
        /// Key that was queried.
        key: String,
    },

    /// Network-level failure reaching the store.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The store reached the service but it rejected the request
    /// (authentication, throttling, internal error).
    #[error("service error: {message}")]
    Service {
        /// Error message.
        message: String,
    },
}

impl RemoteError {
    /// Creates a not-found error for the given object.
    pub fn not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a service error.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Returns true if this error is the distinguished not-found condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguished() {
        assert!(RemoteError::not_found("b", "k").is_not_found());
        assert!(!RemoteError::transport("connection reset").is_not_found());
        assert!(!RemoteError::service("throttled").is_not_found());
    }

    #[test]
    fn error_display() {
        let err = RemoteError::not_found("backups", "p/store.db");
        assert_eq!(err.to_string(), "object not found: backups/p/store.db");
    }
}
