//! Sync store orchestration.

use crate::config::RemoteConfig;
use crate::error::{SyncError, SyncResult};
use crate::identity::DbIdentity;
use mirrorkv_engine::{EngineResult, KvEngine, SnapshotSource};
use mirrorkv_remote::ObjectStore;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// An embedded database whose full state is mirrored to a remote blob store.
///
/// `SyncStore` couples a local [`KvEngine`] to an [`ObjectStore`]. Opening a
/// store pulls the last uploaded snapshot (if any) into the local file before
/// the engine opens it; every committed write transaction pushes a fresh
/// full-database snapshot back out. The local file can therefore be treated
/// as ephemeral.
///
/// # Failure policy
///
/// - A missing remote snapshot at open time means "first run" and succeeds
///   with an empty database; any other remote failure fails the open.
/// - An upload failure after a committed write does NOT fail the write: the
///   local commit already succeeded and availability of local writes wins
///   over remote consistency. The failure is logged at warning level and the
///   next successful write re-uploads the full, more current state. Until
///   then local and remote diverge.
///
/// # Concurrency
///
/// Local transactions are serialized by the engine; `SyncStore` adds no
/// locking of its own. The remote store offers last-write-wins semantics
/// only: two stores sharing a configuration and database file name race
/// their uploads, and the later completing upload silently discards the
/// earlier one's content. Cross-process coordination, if required, must be
/// layered on top.
pub struct SyncStore<E: KvEngine, R: ObjectStore> {
    engine: E,
    remote: R,
    config: RemoteConfig,
    identity: DbIdentity,
}

impl<E: KvEngine, R: ObjectStore> SyncStore<E, R> {
    /// Opens a sync store on the database file at `path`.
    ///
    /// Resolves `path` to absolute form, fetches the snapshot stored under
    /// the derived remote key, materializes it at the resolved path (the
    /// remote snapshot always wins over any stale local artifact), then
    /// opens the engine there. `mode` and `options` are passed through to
    /// [`KvEngine::open`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the path cannot be
    /// resolved, the remote fetch fails for any reason other than not-found,
    /// the snapshot cannot be written locally, or the engine fails to open.
    pub fn open(
        remote: R,
        config: RemoteConfig,
        path: impl AsRef<Path>,
        mode: u32,
        options: &E::Options,
    ) -> SyncResult<Self> {
        config.validate()?;
        let identity = DbIdentity::resolve(path)?;

        load(&remote, &config, &identity)?;

        let engine = E::open(&identity.db_path(), mode, options)?;
        debug!(
            "opened database {:?} mirrored at {}/{}",
            identity.db_path(),
            config.bucket,
            identity.remote_key(&config.prefix)
        );

        Ok(Self {
            engine,
            remote,
            config,
            identity,
        })
    }

    /// Executes `f` within a read-write transaction, then uploads a snapshot.
    ///
    /// If the transaction fails its error is returned and no upload is
    /// attempted; the remote state never reflects an uncommitted local
    /// state. If the transaction commits, the full database is serialized
    /// and uploaded; an upload failure is logged and swallowed (see the type
    /// docs for the failure policy).
    pub fn update<T, F>(&self, f: F) -> SyncResult<T>
    where
        F: FnOnce(&mut E::WriteTxn<'_>) -> EngineResult<T>,
    {
        let out = self.engine.update(f)?;
        self.store_after_commit();
        Ok(out)
    }

    /// Executes `f` within a coalescable read-write transaction, then
    /// uploads a snapshot.
    ///
    /// Same external contract as [`SyncStore::update`]. The engine may merge
    /// this transaction with concurrently issued batch transactions into
    /// fewer physical commits; one upload is still attempted per call, after
    /// this call's portion of the commit has completed.
    pub fn batch<T, F>(&self, f: F) -> SyncResult<T>
    where
        F: FnOnce(&mut E::WriteTxn<'_>) -> EngineResult<T>,
    {
        let out = self.engine.batch(f)?;
        self.store_after_commit();
        Ok(out)
    }

    /// Executes `f` within a read-only transaction.
    ///
    /// Observes a consistent snapshot of local state as of call time and
    /// never triggers an upload.
    pub fn view<T, F>(&self, f: F) -> SyncResult<T>
    where
        F: FnOnce(&E::ReadTxn<'_>) -> EngineResult<T>,
    {
        Ok(self.engine.view(f)?)
    }

    /// Closes the store and its engine.
    ///
    /// No final upload is performed: writes whose upload failed since the
    /// last successful one remain un-mirrored remotely.
    pub fn close(self) -> SyncResult<()> {
        self.engine.close()?;
        Ok(())
    }

    /// Returns the remote object key this store syncs to.
    #[must_use]
    pub fn remote_key(&self) -> String {
        self.identity.remote_key(&self.config.prefix)
    }

    /// Returns the derived database identity.
    #[must_use]
    pub fn identity(&self) -> &DbIdentity {
        &self.identity
    }

    /// Returns the remote configuration.
    #[must_use]
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Uploads after a committed write, downgrading failure to a warning.
    fn store_after_commit(&self) {
        if let Err(err) = self.store() {
            warn!(
                "failed to upload snapshot {}/{}: {}; local commit retained",
                self.config.bucket,
                self.remote_key(),
                err
            );
        }
    }

    /// Serializes the full database and uploads it to the remote key.
    fn store(&self) -> SyncResult<()> {
        let mut snapshot = Vec::new();
        self.engine
            .view(|tx| tx.write_snapshot(&mut snapshot))
            .map_err(|source| SyncError::Serialization { source })?;

        let key = self.remote_key();
        self.remote
            .put_object(&self.config.bucket, &key, snapshot)?;
        debug!("uploaded snapshot {}/{}", self.config.bucket, key);
        Ok(())
    }
}

/// Fetches the remote snapshot, if any, and materializes it locally.
///
/// Not-found maps to a successful no-op: the engine starts fresh. On
/// success the bytes fully replace whatever is at the local path.
fn load<R: ObjectStore>(
    remote: &R,
    config: &RemoteConfig,
    identity: &DbIdentity,
) -> SyncResult<()> {
    let key = identity.remote_key(&config.prefix);
    let bytes = match remote.get_object(&config.bucket, &key) {
        Ok(bytes) => bytes,
        Err(err) if err.is_not_found() => {
            debug!("no snapshot at {}/{}; starting fresh", config.bucket, key);
            return Ok(());
        }
        Err(err) => return Err(SyncError::Remote(err)),
    };

    debug!(
        "loaded snapshot {}/{} ({} bytes)",
        config.bucket,
        key,
        bytes.len()
    );

    let path = identity.db_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| SyncError::SnapshotWrite {
            path: path.clone(),
            source,
        })?;
    }
    fs::write(&path, &bytes).map_err(|source| SyncError::SnapshotWrite { path, source })
}
