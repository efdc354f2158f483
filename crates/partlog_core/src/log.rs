//! In-memory message log.

use crate::error::{LogError, LogResult};
use crate::key::PartitionKey;
use crate::partition::{Partition, PartitionKind};
use parking_lot::Mutex;

/// Maximum length of a single message, in characters.
pub const MAX_MESSAGE_LEN: usize = 256;

/// Mutable part of a log, guarded by the log's mutex.
#[derive(Debug, Default)]
struct LogState {
    /// Populated messages, oldest first.
    messages: Vec<String>,
    /// Accepted appends and reads since the last reset.
    operation_count: usize,
}

/// A fixed-capacity, operation-limited in-memory log.
///
/// Messages are appended in order until either `capacity` messages are
/// stored or `operation_limit` operations (appends plus reads) have been
/// accepted. [`reset`](Partition::reset) empties the log and restores the
/// operation budget.
///
/// # Example
///
/// ```rust
/// use partlog_core::{MessageLog, Partition};
///
/// let log = MessageLog::new(3, 5, "A".to_string()).unwrap();
/// log.append("m1").unwrap();
/// log.append("m2").unwrap();
/// assert_eq!(log.read(0, 1).unwrap(), vec!["m1", "m2"]);
/// assert_eq!(log.operation_count(), 3);
/// ```
#[derive(Debug)]
pub struct MessageLog<K> {
    key: K,
    capacity: usize,
    operation_limit: usize,
    state: Mutex<LogState>,
}

impl<K: PartitionKey> MessageLog<K> {
    /// Creates an empty log.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] if `capacity` or
    /// `operation_limit` is zero.
    pub fn new(capacity: usize, operation_limit: usize, key: K) -> LogResult<Self> {
        if capacity == 0 {
            return Err(LogError::invalid_config("capacity must be positive"));
        }
        if operation_limit == 0 {
            return Err(LogError::invalid_config("operation limit must be positive"));
        }

        Ok(Self {
            key,
            capacity,
            operation_limit,
            state: Mutex::new(LogState {
                messages: Vec::with_capacity(capacity),
                operation_count: 0,
            }),
        })
    }

    /// Copies this log under `key.successor()`.
    ///
    /// Every populated message is re-appended through the copy's own
    /// `append`, so the copy's operation count equals the number of messages
    /// copied, whatever this log's own count is.
    ///
    /// # Errors
    ///
    /// Propagates append failures of the copy (cannot happen for a log whose
    /// invariants hold).
    pub fn deep_copy(&self) -> LogResult<Self> {
        let copy = Self::new(self.capacity, self.operation_limit, self.key.successor())?;
        for message in self.snapshot() {
            copy.append(&message)?;
        }
        Ok(copy)
    }

    /// Replaces the stored messages without going through `append`.
    ///
    /// At most `capacity` messages are kept. The operation count is left at
    /// its current value unless `charge` is set, in which case it becomes
    /// one per stored message, capped at the operation limit.
    pub(crate) fn replace_messages(&self, mut messages: Vec<String>, charge: bool) {
        messages.truncate(self.capacity);

        let mut state = self.state.lock();
        if charge {
            state.operation_count = messages.len().min(self.operation_limit);
        }
        state.messages = messages;
    }

    fn check_operation_limit(&self, state: &LogState) -> LogResult<()> {
        if state.operation_count >= self.operation_limit {
            return Err(LogError::OperationLimitExceeded {
                limit: self.operation_limit,
            });
        }
        Ok(())
    }
}

impl<K: PartitionKey> Partition<K> for MessageLog<K> {
    fn key(&self) -> &K {
        &self.key
    }

    fn kind(&self) -> PartitionKind {
        PartitionKind::Memory
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn operation_limit(&self) -> usize {
        self.operation_limit
    }

    fn message_count(&self) -> usize {
        self.state.lock().messages.len()
    }

    fn operation_count(&self) -> usize {
        self.state.lock().operation_count
    }

    fn append(&self, message: &str) -> LogResult<()> {
        let len = message.chars().count();
        if len > MAX_MESSAGE_LEN {
            return Err(LogError::MessageTooLong {
                len,
                max: MAX_MESSAGE_LEN,
            });
        }

        let mut state = self.state.lock();
        self.check_operation_limit(&state)?;
        if state.messages.len() == self.capacity {
            return Err(LogError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        state.messages.push(message.to_owned());
        state.operation_count += 1;
        Ok(())
    }

    fn read(&self, start: usize, end: usize) -> LogResult<Vec<String>> {
        let mut state = self.state.lock();
        self.check_operation_limit(&state)?;

        let count = state.messages.len();
        if start >= count || end >= count || start > end {
            return Err(LogError::InvalidRange { start, end, count });
        }

        let messages = state.messages[start..=end].to_vec();
        state.operation_count += 1;
        Ok(messages)
    }

    fn reset(&self) -> LogResult<()> {
        let mut state = self.state.lock();
        state.messages.clear();
        state.operation_count = 0;
        Ok(())
    }

    fn deep_copy(&self) -> LogResult<Box<dyn Partition<K>>> {
        Ok(Box::new(MessageLog::deep_copy(self)?))
    }

    fn snapshot(&self) -> Vec<String> {
        self.state.lock().messages.clone()
    }
}
