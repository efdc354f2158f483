//! Error types for partlog core.

use std::io;
use thiserror::Error;

/// Result type for log operations.
pub type LogResult<T> = Result<T, LogError>;

/// Errors that can occur in partition and router operations.
#[derive(Debug, Error)]
pub enum LogError {
    /// Backing file error (open, read, write, flush, copy, truncate).
    #[error("storage error: {0}")]
    Storage(#[from] partlog_storage::StorageError),

    /// I/O error outside the backing file (e.g. spawning the reset timer).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The log already holds `capacity` messages.
    #[error("capacity exceeded: log already holds {capacity} messages")]
    CapacityExceeded {
        /// Configured capacity.
        capacity: usize,
    },

    /// The log has accepted `limit` operations since the last reset.
    #[error("operation limit of {limit} reached; reset the log or create a new one")]
    OperationLimitExceeded {
        /// Configured operation limit.
        limit: usize,
    },

    /// Message is longer than the allowed number of characters.
    #[error("message too long: {len} characters, maximum is {max}")]
    MessageTooLong {
        /// Length of the rejected message in characters.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// Requested range does not lie within the populated messages.
    #[error("invalid range [{start}, {end}] for {count} messages")]
    InvalidRange {
        /// Inclusive start index.
        start: usize,
        /// Inclusive end index.
        end: usize,
        /// Number of populated messages.
        count: usize,
    },

    /// No partition with the given key.
    #[error("partition key not found: {key}")]
    KeyNotFound {
        /// Debug rendering of the requested key.
        key: String,
    },

    /// Invalid construction parameters.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// Some partitions failed to reset during a reset-all.
    #[error("{failed} of {total} partitions failed to reset; first failure: {first}")]
    ResetIncomplete {
        /// Number of partitions whose reset failed.
        failed: usize,
        /// Number of partitions attempted.
        total: usize,
        /// The first failure encountered.
        first: Box<LogError>,
    },
}

impl LogError {
    /// Creates a key-not-found error from any debuggable key.
    pub fn key_not_found(key: &impl std::fmt::Debug) -> Self {
        Self::KeyNotFound {
            key: format!("{key:?}"),
        }
    }

    /// Creates an invalid config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
