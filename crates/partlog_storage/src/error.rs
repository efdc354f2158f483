//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Copying one file over another failed.
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        /// Source file.
        from: PathBuf,
        /// Destination file.
        to: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file contained bytes that are not valid UTF-8.
    #[error("invalid UTF-8 on line {line} of {path}")]
    InvalidUtf8 {
        /// File being read.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
    },
}
