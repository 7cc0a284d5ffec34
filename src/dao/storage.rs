use std::{error::Error, path::PathBuf};
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by the on-disk collaborators (song library, round log).
#[derive(Debug, Error)]
pub enum StorageError {
    /// A filesystem call failed.
    #[error("i/o failure on `{path}`: {message}")]
    Io {
        /// File or folder the call was about.
        path: PathBuf,
        /// What was being attempted.
        message: String,
        /// Underlying error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A record could not be serialised.
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    /// The background writer is gone, so the record was dropped.
    #[error("round log writer has stopped")]
    WriterClosed,
}

impl StorageError {
    /// Construct an I/O error from any backend failure.
    pub fn io(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        StorageError::Io {
            path: path.into(),
            message: message.into(),
            source: Box::new(source),
        }
    }
}
