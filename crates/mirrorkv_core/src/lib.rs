//! # MirrorKV Core
//!
//! Snapshot sync layer coupling an embedded transactional KV engine to
//! remote object storage.
//!
//! This crate provides:
//! - Load-before-open: a [`SyncStore`] reconstructs the local database file
//!   from the last uploaded snapshot before the engine opens it
//! - Flush-after-write: every committed write transaction uploads a fresh
//!   full-database snapshot
//! - Deterministic addressing: the remote key is a pure function of
//!   configuration and database file name
//!
//! ## Architecture
//!
//! The engine and the object-store client are external collaborators behind
//! the `mirrorkv_engine::KvEngine` and `mirrorkv_remote::ObjectStore` traits.
//! `SyncStore` owns one of each and orchestrates the snapshot protocol
//! between them; it holds no process-wide state, so every store instance is
//! independently configured.
//!
//! ## Key Invariants
//!
//! - A missing remote snapshot is a valid first run, not a failure
//! - The remote state never reflects a local state that was never committed
//! - An upload failure never fails a committed local write; the divergence
//!   is logged and repaired by the next successful upload
//! - The remote store is last-write-wins; no cross-process coordination is
//!   attempted
//!
//! ## Example
//!
//! ```no_run
//! use mirrorkv_core::{RemoteConfig, SyncStore};
//! use mirrorkv_engine::{BTreeEngine, BTreeOptions};
//! use mirrorkv_remote::InMemoryStore;
//!
//! let remote = InMemoryStore::new();
//! let config = RemoteConfig::new("backups").with_prefix("databases");
//!
//! let store: SyncStore<BTreeEngine, _> =
//!     SyncStore::open(remote, config, "app.db", 0o600, &BTreeOptions::default()).unwrap();
//! store
//!     .update(|tx| {
//!         tx.put(b"greeting", b"hello");
//!         Ok(())
//!     })
//!     .unwrap();
//! store.close().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod identity;
mod store;

pub use config::{ConfigError, RemoteConfig};
pub use error::{SyncError, SyncResult};
pub use identity::DbIdentity;
pub use store::SyncStore;
