//! Database identity and remote key derivation.

use crate::error::{SyncError, SyncResult};
use std::path::{Path, PathBuf};

/// The stable identity of a local database.
///
/// Derived once at open time from the caller-supplied path resolved to
/// absolute form, and immutable for the lifetime of the handle. The file
/// name is the half of the remote key the configuration does not supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbIdentity {
    directory: PathBuf,
    file_name: String,
}

impl DbIdentity {
    /// Resolves `path` to an absolute location and derives the identity.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::PathResolution`] if the path cannot be made
    /// absolute, has no terminal file name, or the file name is not valid
    /// UTF-8.
    pub fn resolve(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let abs = std::path::absolute(path)
            .map_err(|e| SyncError::path_resolution(path, e.to_string()))?;

        let file_name = abs
            .file_name()
            .ok_or_else(|| SyncError::path_resolution(path, "path has no file name"))?
            .to_str()
            .ok_or_else(|| SyncError::path_resolution(path, "file name is not valid UTF-8"))?
            .to_string();

        let directory = abs
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        Ok(Self {
            directory,
            file_name,
        })
    }

    /// Returns the directory holding the database file.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the database file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the absolute path of the database file.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    /// Derives the remote object key for this database under `prefix`.
    ///
    /// A pure function of prefix and file name: `prefix + "/" + file_name`,
    /// also when the prefix is empty.
    #[must_use]
    pub fn remote_key(&self, prefix: &str) -> String {
        format!("{}/{}", prefix, self.file_name)
    }
}
