//! The capability interface shared by every log variant.

use crate::error::LogResult;
use crate::key::PartitionKey;
use std::fmt::Debug;

/// Which variant backs a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionKind {
    /// In-memory only ([`MessageLog`](crate::MessageLog)).
    Memory,
    /// Mirrored to a backing file ([`DurableLog`](crate::DurableLog)).
    Durable,
    /// Reset on a timer ([`AutoResetLog`](crate::AutoResetLog)).
    AutoReset,
}

impl PartitionKind {
    /// Short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Durable => "durable",
            Self::AutoReset => "auto-reset",
        }
    }
}

impl std::fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fixed-capacity, operation-limited log of short text messages.
///
/// Implemented by [`MessageLog`](crate::MessageLog),
/// [`DurableLog`](crate::DurableLog) and
/// [`AutoResetLog`](crate::AutoResetLog). The
/// [`Router`](crate::Router) stores partitions as `Box<dyn Partition<K>>`.
///
/// # Invariants
///
/// - `message_count() <= capacity()`
/// - `operation_count() <= operation_limit()`
/// - Every stored message is at most [`MAX_MESSAGE_LEN`](crate::MAX_MESSAGE_LEN) characters
///
/// # Concurrency
///
/// All methods take `&self`. Every implementor serializes its operations
/// with a per-instance lock, so a timer-driven `reset` never interleaves
/// with a caller's `append` or `read` on the same partition.
pub trait Partition<K: PartitionKey>: Debug + Send + Sync {
    /// Returns the partition key.
    fn key(&self) -> &K;

    /// Returns which variant this is.
    fn kind(&self) -> PartitionKind;

    /// Maximum number of stored messages.
    fn capacity(&self) -> usize;

    /// Maximum number of accepted operations between resets.
    fn operation_limit(&self) -> usize;

    /// Number of populated messages.
    fn message_count(&self) -> usize;

    /// Number of accepted appends and reads since the last reset.
    fn operation_count(&self) -> usize;

    /// Appends a message.
    ///
    /// # Errors
    ///
    /// - [`MessageTooLong`](crate::LogError::MessageTooLong) if the message exceeds the length bound
    /// - [`OperationLimitExceeded`](crate::LogError::OperationLimitExceeded) if the operation budget is spent
    /// - [`CapacityExceeded`](crate::LogError::CapacityExceeded) if the log is full
    /// - a storage error if a durable write fails after the message was accepted in memory
    fn append(&self, message: &str) -> LogResult<()>;

    /// Returns the messages in the inclusive range `start..=end`.
    ///
    /// Counts as one operation.
    ///
    /// # Errors
    ///
    /// - [`OperationLimitExceeded`](crate::LogError::OperationLimitExceeded), checked first
    /// - [`InvalidRange`](crate::LogError::InvalidRange) if either index is out of
    ///   bounds or `start > end`
    fn read(&self, start: usize, end: usize) -> LogResult<Vec<String>>;

    /// Clears the log and its operation count.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a durable restore fails.
    fn reset(&self) -> LogResult<()>;

    /// Creates an independent copy keyed by `key().successor()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy cannot be built (e.g. file copy fails).
    fn deep_copy(&self) -> LogResult<Box<dyn Partition<K>>>;

    /// Returns every populated message without counting an operation.
    fn snapshot(&self) -> Vec<String>;

    /// Flushes pending state and stops background work.
    ///
    /// Safe to call more than once. The partition stays usable for
    /// in-memory operations afterwards.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a final flush fails.
    fn close(&self) -> LogResult<()> {
        Ok(())
    }
}
