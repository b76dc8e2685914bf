//! In-memory object store for testing.

use crate::client::ObjectStore;
use crate::error::{RemoteError, RemoteResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// An in-memory object store.
///
/// Clones share the same backing storage, so one instance can stand in for a
/// remote service observed by several handles. Put and get failures can be
/// injected to exercise degraded-transport paths.
///
/// # Example
///
/// ```rust
/// use mirrorkv_remote::{InMemoryStore, ObjectStore};
///
/// let store = InMemoryStore::new();
/// store.put_object("bucket", "key", b"bytes".to_vec()).unwrap();
/// assert_eq!(store.get_object("bucket", "key").unwrap(), b"bytes");
/// assert!(store.get_object("bucket", "missing").unwrap_err().is_not_found());
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    shared: Arc<Shared>,
}

#[derive(Debug, Default)]
struct Shared {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    fail_puts: AtomicBool,
    fail_gets: AtomicBool,
    put_count: AtomicU64,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `put_object` fail with a transport error.
    pub fn set_fail_puts(&self, fail: bool) {
        self.shared.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `get_object` fail with a transport error.
    ///
    /// Injected failures are transport failures, not not-found.
    pub fn set_fail_gets(&self, fail: bool) {
        self.shared.fail_gets.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of `put_object` attempts, including failed ones.
    #[must_use]
    pub fn put_count(&self) -> u64 {
        self.shared.put_count.load(Ordering::SeqCst)
    }

    /// Returns a copy of the object stored under `bucket`/`key`, if any.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.shared
            .objects
            .read()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Returns the number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.objects.read().len()
    }

    /// Returns true if no objects are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.objects.read().is_empty()
    }
}

impl ObjectStore for InMemoryStore {
    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> RemoteResult<()> {
        self.shared.put_count.fetch_add(1, Ordering::SeqCst);
        if self.shared.fail_puts.load(Ordering::SeqCst) {
            return Err(RemoteError::transport("injected put failure"));
        }
        self.shared
            .objects
            .write()
            .insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str) -> RemoteResult<Vec<u8>> {
        if self.shared.fail_gets.load(Ordering::SeqCst) {
            return Err(RemoteError::transport("injected get failure"));
        }
        self.shared
            .objects
            .read()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| RemoteError::not_found(bucket, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_roundtrip() {
        let store = InMemoryStore::new();
        store
            .put_object("bucket", "prefix/db", b"snapshot".to_vec())
            .unwrap();

        let body = store.get_object("bucket", "prefix/db").unwrap();
        assert_eq!(body, b"snapshot");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_object_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.get_object("bucket", "nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn put_overwrites_existing_object() {
        let store = InMemoryStore::new();
        store.put_object("b", "k", b"old".to_vec()).unwrap();
        store.put_object("b", "k", b"new".to_vec()).unwrap();

        assert_eq!(store.get_object("b", "k").unwrap(), b"new");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clones_share_storage() {
        let store = InMemoryStore::new();
        let other = store.clone();
        store.put_object("b", "k", b"shared".to_vec()).unwrap();

        assert_eq!(other.get_object("b", "k").unwrap(), b"shared");
    }

    #[test]
    fn injected_put_failure_is_transport_error() {
        let store = InMemoryStore::new();
        store.set_fail_puts(true);

        let err = store.put_object("b", "k", b"data".to_vec()).unwrap_err();
        assert!(!err.is_not_found());
        assert_eq!(store.put_count(), 1);
        assert!(store.is_empty());

        store.set_fail_puts(false);
        store.put_object("b", "k", b"data".to_vec()).unwrap();
        assert_eq!(store.put_count(), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn injected_get_failure_is_not_not_found() {
        let store = InMemoryStore::new();
        store.put_object("b", "k", b"data".to_vec()).unwrap();
        store.set_fail_gets(true);

        let err = store.get_object("b", "k").unwrap_err();
        assert!(!err.is_not_found());
    }

    #[test]
    fn buckets_are_disjoint() {
        let store = InMemoryStore::new();
        store.put_object("one", "k", b"1".to_vec()).unwrap();
        store.put_object("two", "k", b"2".to_vec()).unwrap();

        assert_eq!(store.get_object("one", "k").unwrap(), b"1");
        assert_eq!(store.get_object("two", "k").unwrap(), b"2");
    }
}
