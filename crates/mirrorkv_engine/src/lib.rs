//! # MirrorKV Engine
//!
//! Transactional engine contract and reference engine for MirrorKV.
//!
//! This crate defines the seam between the sync layer and the embedded
//! key-value engine it wraps. The sync layer never interprets keys, values,
//! or on-disk formats - it only needs:
//!
//! - [`KvEngine`] - open/close plus read-write (`update`/`batch`) and
//!   read-only (`view`) transaction closures
//! - [`SnapshotSource`] - serializing the entire database to a byte sink
//!   from within one consistent read-only transaction
//!
//! ## Design Principles
//!
//! - Engines own transaction serialization (single-writer/multiple-reader);
//!   callers add no locking
//! - Snapshot bytes are the engine's own file format: writing them to a path
//!   yields a file the engine opens directly
//! - Transaction functions commit on `Ok` and discard all staged writes on
//!   `Err`
//!
//! ## Available Engines
//!
//! - [`BTreeEngine`] - a minimal file-backed engine for tests, examples, and
//!   small databases

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod btree;
mod engine;
mod error;

pub use btree::{BTreeEngine, BTreeOptions, BTreeReadTxn, BTreeWriteTxn};
pub use engine::{KvEngine, SnapshotSource};
pub use error::{EngineError, EngineResult};
