//! Partition construction parameters.

use crate::auto_reset::AutoResetLog;
use crate::durable::DurableLog;
use crate::error::LogResult;
use crate::key::PartitionKey;
use crate::log::MessageLog;
use crate::partition::{Partition, PartitionKind};
use std::path::PathBuf;
use std::time::Duration;

/// Parameters for building one partition.
///
/// The variant follows from the optional fields:
///
/// | `reset_period` | `file`  | Built partition                       |
/// |----------------|---------|---------------------------------------|
/// | `Some`         | `Some`  | [`AutoResetLog`] over a [`DurableLog`] |
/// | `Some`         | `None`  | [`AutoResetLog`] over a [`MessageLog`] |
/// | `None`         | `Some`  | [`DurableLog`]                        |
/// | `None`         | `None`  | [`MessageLog`]                        |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionConfig<K> {
    /// Maximum number of stored messages.
    pub capacity: usize,
    /// Maximum number of operations between resets.
    pub operation_limit: usize,
    /// Partition key.
    pub key: K,
    /// Backing file, for a durable partition.
    pub file: Option<PathBuf>,
    /// Auto-reset period.
    pub reset_period: Option<Duration>,
}

impl<K: PartitionKey> PartitionConfig<K> {
    /// Creates parameters for an in-memory partition.
    #[must_use]
    pub fn new(capacity: usize, operation_limit: usize, key: K) -> Self {
        Self {
            capacity,
            operation_limit,
            key,
            file: None,
            reset_period: None,
        }
    }

    /// Mirrors the partition to `path`.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Resets the partition every `period`.
    #[must_use]
    pub fn with_reset_period(mut self, period: Duration) -> Self {
        self.reset_period = Some(period);
        self
    }

    /// Kind of partition [`build`](Self::build) will produce.
    #[must_use]
    pub fn kind(&self) -> PartitionKind {
        match (&self.reset_period, &self.file) {
            (Some(_), _) => PartitionKind::AutoReset,
            (None, Some(_)) => PartitionKind::Durable,
            (None, None) => PartitionKind::Memory,
        }
    }

    /// Builds the partition.
    ///
    /// # Errors
    ///
    /// Returns an error if the bounds or period are invalid, or the backing
    /// file cannot be opened.
    pub fn build(self) -> LogResult<Box<dyn Partition<K>>> {
        let Self {
            capacity,
            operation_limit,
            key,
            file,
            reset_period,
        } = self;

        let partition: Box<dyn Partition<K>> = match (reset_period, file) {
            (Some(period), file) => Box::new(AutoResetLog::new(
                capacity,
                operation_limit,
                key,
                file.as_deref(),
                period,
            )?),
            (None, Some(file)) => Box::new(DurableLog::open(capacity, operation_limit, key, file)?),
            (None, None) => Box::new(MessageLog::new(capacity, operation_limit, key)?),
        };
        Ok(partition)
    }
}
