//! Object store trait definition.

use crate::error::RemoteResult;

/// A remote blob store addressed by bucket and key.
///
/// This trait abstracts the object-store client, allowing different
/// implementations (AWS SDK, S3-compatible services, in-memory for testing).
/// Credentials, regions, and session setup are entirely the implementation's
/// concern and never surface here.
///
/// # Invariants
///
/// - `get_object` distinguishes "key does not exist"
///   ([`crate::RemoteError::NotFound`]) from every other failure
/// - `put_object` overwrites unconditionally: the store offers last-write-wins
///   semantics only, with no conditional put
/// - both calls block the calling thread for their full duration; timeouts
///   and cancellation, if any, come from the client's own configuration
///
/// # Implementors
///
/// - [`crate::InMemoryStore`] - for testing
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under `key` in `bucket`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails.
    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> RemoteResult<()>;

    /// Fetches the object stored under `key` in `bucket`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RemoteError::NotFound`] if no such object exists, or
    /// another error for transport and service failures.
    fn get_object(&self, bucket: &str, key: &str) -> RemoteResult<Vec<u8>>;
}
