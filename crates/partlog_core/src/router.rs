//! Keyed dispatcher over a growable set of partitions.

use crate::config::PartitionConfig;
use crate::error::{LogError, LogResult};
use crate::key::PartitionKey;
use crate::partition::Partition;
use parking_lot::RwLock;
use tracing::{debug, warn};

/// Routes append, read and reset operations to partitions by key.
///
/// Partitions are kept in the order they were added. Lookups are linear
/// and compare keys for equality; if two partitions share a key, the first
/// one wins. Keys are not checked for uniqueness.
///
/// # Concurrency
///
/// Dispatch takes a shared lock on the partition list, so operations on
/// different partitions run in parallel. Operations on the same partition
/// are serialized by that partition's own lock. Adding a partition takes
/// the list lock exclusively.
///
/// # Ownership
///
/// The router owns its partitions. Dropping it releases each one exactly
/// once (stopping reset timers and flushing backing files);
/// [`close`](Self::close) does the same while reporting errors.
///
/// # Example
///
/// ```rust
/// use partlog_core::{PartitionConfig, Router};
///
/// let router = Router::new();
/// router.add_partition(PartitionConfig::new(3, 5, "A".to_string())).unwrap();
/// router.append_message(&"A".to_string(), "hi").unwrap();
/// assert_eq!(router.read_messages(&"A".to_string(), 0, 0).unwrap(), vec!["hi"]);
/// ```
#[derive(Debug)]
pub struct Router<K: PartitionKey> {
    partitions: RwLock<Vec<Box<dyn Partition<K>>>>,
}

impl<K: PartitionKey> Default for Router<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartitionKey> Router<K> {
    /// Creates a router with no partitions.
    #[must_use]
    pub fn new() -> Self {
        Self::with_partitions(Vec::new())
    }

    /// Creates a router over already-built partitions, in order.
    #[must_use]
    pub fn with_partitions(partitions: Vec<Box<dyn Partition<K>>>) -> Self {
        Self {
            partitions: RwLock::new(partitions),
        }
    }

    /// Builds a router from partition parameters, in order.
    ///
    /// # Errors
    ///
    /// Returns the first build failure; partitions built before it are
    /// released.
    pub fn from_configs(
        configs: impl IntoIterator<Item = PartitionConfig<K>>,
    ) -> LogResult<Self> {
        let partitions = configs
            .into_iter()
            .map(PartitionConfig::build)
            .collect::<LogResult<Vec<_>>>()?;
        Ok(Self::with_partitions(partitions))
    }

    /// Number of partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions.read().len()
    }

    /// Returns true if the router holds no partitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partitions.read().is_empty()
    }

    /// Keys of all partitions, in growth order.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.partitions
            .read()
            .iter()
            .map(|partition| partition.key().clone())
            .collect()
    }

    /// Builds a partition from `config` and appends it.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition cannot be built; the router is
    /// left unchanged.
    pub fn add_partition(&self, config: PartitionConfig<K>) -> LogResult<()> {
        let partition = config.build()?;
        self.insert(partition);
        Ok(())
    }

    /// Appends an already-built partition.
    pub fn insert(&self, partition: Box<dyn Partition<K>>) {
        debug!(key = ?partition.key(), kind = ?partition.kind(), "added partition");
        self.partitions.write().push(partition);
    }

    /// Appends `message` to the partition keyed by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::KeyNotFound`] or the partition's append error.
    pub fn append_message(&self, key: &K, message: &str) -> LogResult<()> {
        self.with_partition(key, |partition| partition.append(message))
    }

    /// Reads the inclusive range `start..=end` from the partition keyed by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::KeyNotFound`] or the partition's read error.
    pub fn read_messages(&self, key: &K, start: usize, end: usize) -> LogResult<Vec<String>> {
        self.with_partition(key, |partition| partition.read(start, end))
    }

    /// Resets the partition keyed by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::KeyNotFound`] or the partition's reset error.
    pub fn reset_one(&self, key: &K) -> LogResult<()> {
        self.with_partition(key, |partition| partition.reset())
    }

    /// Number of messages in the partition keyed by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::KeyNotFound`].
    pub fn message_count(&self, key: &K) -> LogResult<usize> {
        self.with_partition(key, |partition| Ok(partition.message_count()))
    }

    /// Capacity of the partition keyed by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::KeyNotFound`].
    pub fn capacity(&self, key: &K) -> LogResult<usize> {
        self.with_partition(key, |partition| Ok(partition.capacity()))
    }

    /// Resets every partition.
    ///
    /// A failing partition does not stop the others from being reset.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::ResetIncomplete`] carrying the first failure if
    /// any partition failed.
    pub fn reset_all(&self) -> LogResult<()> {
        let partitions = self.partitions.read();
        let results = partitions.iter().map(|partition| {
            partition.reset().map_err(|err| {
                warn!(key = ?partition.key(), error = %err, "partition reset failed");
                err
            })
        });
        collect_failures(results, partitions.len())
    }

    /// Deep-copies every partition, in order, into a new router.
    ///
    /// Each copy is keyed by its own partition's successor rule; the copies'
    /// keys are not checked against each other.
    ///
    /// # Errors
    ///
    /// Returns the first partition copy failure.
    pub fn deep_copy(&self) -> LogResult<Self> {
        let copies = self
            .partitions
            .read()
            .iter()
            .map(|partition| partition.deep_copy())
            .collect::<LogResult<Vec<_>>>()?;
        Ok(Self::with_partitions(copies))
    }

    /// Closes every partition: stops reset timers and flushes backing files.
    ///
    /// Every partition is attempted. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub fn close(&self) -> LogResult<()> {
        let partitions = self.partitions.read();
        let mut first = None;
        for partition in partitions.iter() {
            if let Err(err) = partition.close() {
                warn!(key = ?partition.key(), error = %err, "partition close failed");
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }

    fn with_partition<R>(
        &self,
        key: &K,
        op: impl FnOnce(&dyn Partition<K>) -> LogResult<R>,
    ) -> LogResult<R> {
        let partitions = self.partitions.read();
        let partition = partitions
            .iter()
            .find(|partition| partition.key() == key)
            .ok_or_else(|| LogError::key_not_found(key))?;
        op(&**partition)
    }
}

fn collect_failures(results: impl Iterator<Item = LogResult<()>>, total: usize) -> LogResult<()> {
    let mut failed = 0;
    let mut first = None;
    for result in results {
        if let Err(err) = result {
            failed += 1;
            first.get_or_insert(err);
        }
    }

    match first {
        None => Ok(()),
        Some(first) => Err(LogError::ResetIncomplete {
            failed,
            total,
            first: Box::new(first),
        }),
    }
}
