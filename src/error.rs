//! Error types for the file cache
//!
//! Provides unified error handling using thiserror. These errors stay inside
//! the crate boundary: the plain `FileCache` operations log and absorb them,
//! only the `try_*` forms hand them to the caller.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the file cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Reading, writing or renaming the cache file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache file content is not valid JSON
    #[error("Corrupt cache file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Cache file is valid JSON but not an object
    #[error("Cache file {path} does not contain a JSON object")]
    NotAnObject { path: PathBuf },

    /// A value could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Key would collide with an expiry marker
    #[error("Reserved key: {0}")]
    ReservedKey(String),
}

impl CacheError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the file exists but its content cannot be used as a document.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            CacheError::Corrupt { .. } | CacheError::NotAnObject { .. }
        )
    }
}

// == Result Type Alias ==
/// Convenience Result type for the file cache.
pub type Result<T> = std::result::Result<T, CacheError>;
