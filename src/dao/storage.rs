use std::{io, path::PathBuf};
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by the persisted session record store regardless of the backing medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The record file could not be read, written or removed.
    #[error("storage i/o failed for `{path}`")]
    Io {
        /// File the operation targeted.
        path: PathBuf,
        /// Underlying i/o failure.
        #[source]
        source: io::Error,
    },
    /// The stored payload is not a valid session record.
    #[error("stored session record at `{path}` is malformed")]
    Malformed {
        /// File holding the bad payload.
        path: PathBuf,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The record could not be encoded before writing.
    #[error("failed to encode session record")]
    Encode(#[source] serde_json::Error),
}

impl StorageError {
    /// Construct an i/o error bound to the path that failed.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}
