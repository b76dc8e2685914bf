//! # MirrorKV Remote
//!
//! Remote object store contract for MirrorKV.
//!
//! This crate defines the seam between the sync layer and the blob store it
//! mirrors snapshots to. The production client (AWS SDK or any S3-compatible
//! service) is supplied by the caller behind the [`ObjectStore`] trait;
//! credentials, regions, and session setup never appear in this workspace.
//!
//! ## Design Principles
//!
//! - One object per database identity; `put_object` overwrites
//!   unconditionally (last-write-wins, no conditional put)
//! - "Key does not exist" is a distinguished condition
//!   ([`RemoteError::NotFound`]), separable from every transport or service
//!   failure
//! - Calls block for their full duration; timeout policy belongs to the
//!   client implementation

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod error;
mod memory;

pub use client::ObjectStore;
pub use error::{RemoteError, RemoteResult};
pub use memory::InMemoryStore;
