//! Engine trait definitions.

use crate::error::EngineResult;
use std::io::Write;
use std::path::Path;

/// A read-only view that can serialize the entire database.
///
/// The sync layer requires exactly one capability from a read transaction:
/// writing a complete, internally consistent copy of the database to a byte
/// sink. The bytes must be openable as a database file by the same engine.
pub trait SnapshotSource {
    /// Serializes the full database content to `dest`.
    ///
    /// Returns the number of bytes written. The output reflects a single
    /// consistent point in time, never a partial commit.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write to `dest` fails.
    fn write_snapshot(&self, dest: &mut dyn Write) -> EngineResult<u64>;
}

/// An embedded transactional key-value engine.
///
/// Engines are **opaque transaction providers**. The sync layer does not
/// interpret keys, values, or the on-disk format - it only opens an engine at
/// a path, runs caller-supplied transaction functions, and serializes the
/// whole database through [`SnapshotSource`].
///
/// # Invariants
///
/// - `update` and `batch` run read-write transactions: commit on `Ok`,
///   discard all staged writes on `Err`
/// - `view` runs a read-only transaction observing a consistent snapshot of
///   the database as of call time
/// - local transactions are serialized single-writer/multiple-reader by the
///   engine itself; callers add no locking of their own
/// - engines must be `Send + Sync`
///
/// # Implementors
///
/// - [`crate::BTreeEngine`] - file-backed reference engine
pub trait KvEngine: Sized + Send + Sync {
    /// Engine-specific open options.
    type Options: Default;

    /// Read-only transaction handle.
    type ReadTxn<'a>: SnapshotSource
    where
        Self: 'a;

    /// Read-write transaction handle.
    type WriteTxn<'a>
    where
        Self: 'a;

    /// Opens the engine on the database file at `path`.
    ///
    /// `mode` is a unix permission word for newly created files; platforms
    /// without unix permissions ignore it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a valid
    /// database.
    fn open(path: &Path, mode: u32, options: &Self::Options) -> EngineResult<Self>;

    /// Executes `f` within a read-write transaction.
    ///
    /// If `f` returns `Ok`, the transaction is committed and durable in the
    /// engine's own sense before this method returns. If `f` returns `Err`,
    /// all staged writes are discarded.
    fn update<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&mut Self::WriteTxn<'_>) -> EngineResult<T>;

    /// Executes `f` within a read-write transaction, allowing the engine to
    /// coalesce it with concurrently issued batch transactions into fewer
    /// physical commits.
    ///
    /// The default implementation forwards to [`KvEngine::update`]; engines
    /// with a coalescing commit path override this. Either way, `f`'s writes
    /// are committed when this method returns `Ok`.
    fn batch<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&mut Self::WriteTxn<'_>) -> EngineResult<T>,
    {
        self.update(f)
    }

    /// Executes `f` within a read-only transaction.
    fn view<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&Self::ReadTxn<'_>) -> EngineResult<T>;

    /// Closes the engine.
    ///
    /// Closing an already closed engine is a no-op.
    fn close(&self) -> EngineResult<()>;
}
