//! Configuration for the sync store.

use thiserror::Error;

/// Errors produced by configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The bucket name is empty.
    #[error("bucket name is required")]
    MissingBucket,
}

/// Remote addressing configuration.
///
/// A configuration plus a database file name fully determines the remote
/// object key, so two handles built from equal configurations and file names
/// address the same remote object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Bucket holding the snapshots. Required.
    pub bucket: String,
    /// Key prefix inside the bucket. May be empty.
    pub prefix: String,
}

impl RemoteConfig {
    /// Creates a configuration for the given bucket with an empty prefix.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: String::new(),
        }
    }

    /// Sets the key prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingBucket`] if the bucket name is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.is_empty() {
            return Err(ConfigError::MissingBucket);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = RemoteConfig::new("backups").with_prefix("databases");
        assert_eq!(config.bucket, "backups");
        assert_eq!(config.prefix, "databases");
        config.validate().unwrap();
    }

    #[test]
    fn empty_prefix_is_valid() {
        let config = RemoteConfig::new("backups");
        assert_eq!(config.prefix, "");
        config.validate().unwrap();
    }

    #[test]
    fn empty_bucket_is_rejected() {
        let config = RemoteConfig::new("");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingBucket)
        ));
    }
}
