//! Timer-driven auto-reset wrapper.
//!
//! An [`AutoResetLog`] owns one partition and a background thread that
//! calls [`Partition::reset`] on it every `period`. The first reset happens
//! one full period after construction.
//!
//! The timer goes through the wrapped partition's own `reset`, which takes
//! the same per-instance lock as `append` and `read`, so a timer reset
//! never interleaves with a caller's operation.
//!
//! # Usage
//!
//! ```rust
//! use partlog_core::{AutoResetLog, Partition};
//! use std::time::Duration;
//!
//! let log = AutoResetLog::new(10, 100, 1u32, None, Duration::from_secs(60)).unwrap();
//! log.append("hello").unwrap();
//! assert_eq!(log.message_count(), 1);
//! log.stop();
//! ```

use crate::durable::DurableLog;
use crate::error::{LogError, LogResult};
use crate::key::PartitionKey;
use crate::log::MessageLog;
use crate::partition::{Partition, PartitionKind};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Background thread resetting a partition on a fixed period.
///
/// Dropping the timer stops it: the stop channel disconnects, the thread
/// wakes up and exits, and the drop joins it.
#[derive(Debug)]
struct ResetTimer {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ResetTimer {
    fn start<K: PartitionKey>(
        target: Arc<dyn Partition<K>>,
        period: Duration,
    ) -> LogResult<Self> {
        let (stop, stopped) = mpsc::channel::<()>();
        let name = format!("partlog-reset-{:?}", target.key());

        let handle = thread::Builder::new().name(name).spawn(move || loop {
            match stopped.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => match target.reset() {
                    Ok(()) => debug!(key = ?target.key(), "auto reset"),
                    Err(err) => warn!(key = ?target.key(), error = %err, "auto reset failed"),
                },
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        })?;

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }
}

impl Drop for ResetTimer {
    fn drop(&mut self) {
        // Disconnecting the channel wakes the thread immediately.
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("auto reset thread panicked");
            }
        }
    }
}

/// A partition that resets itself every `period`.
///
/// All operations other than the timer delegate unchanged to the wrapped
/// partition. [`deep_copy`](Partition::deep_copy) copies the wrapped
/// partition only; the copy has no timer.
#[derive(Debug)]
pub struct AutoResetLog<K: PartitionKey> {
    inner: Arc<dyn Partition<K>>,
    timer: Mutex<Option<ResetTimer>>,
    period: Duration,
}

impl<K: PartitionKey> AutoResetLog<K> {
    /// Creates an auto-reset log over a new [`MessageLog`], or over a
    /// [`DurableLog`] when `path` is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the wrapped log cannot be built, the period is
    /// zero, or the timer thread cannot be spawned.
    pub fn new(
        capacity: usize,
        operation_limit: usize,
        key: K,
        path: Option<&Path>,
        period: Duration,
    ) -> LogResult<Self> {
        let inner: Box<dyn Partition<K>> = match path {
            Some(path) => Box::new(DurableLog::open(capacity, operation_limit, key, path)?),
            None => Box::new(MessageLog::new(capacity, operation_limit, key)?),
        };
        Self::wrap(inner, period)
    }

    /// Wraps an existing partition and starts its timer.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] for a zero period, or an I/O
    /// error if the timer thread cannot be spawned.
    pub fn wrap(inner: Box<dyn Partition<K>>, period: Duration) -> LogResult<Self> {
        if period.is_zero() {
            return Err(LogError::invalid_config("reset period must be positive"));
        }

        let inner: Arc<dyn Partition<K>> = Arc::from(inner);
        let timer = ResetTimer::start(Arc::clone(&inner), period)?;
        debug!(key = ?inner.key(), ?period, "started auto reset timer");

        Ok(Self {
            inner,
            timer: Mutex::new(Some(timer)),
            period,
        })
    }

    /// Reset period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Kind of the wrapped partition.
    #[must_use]
    pub fn inner_kind(&self) -> PartitionKind {
        self.inner.kind()
    }

    /// Returns true while the timer is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timer.lock().is_some()
    }

    /// Stops the timer and waits for its thread to exit.
    ///
    /// Idempotent. The wrapped partition stays usable.
    pub fn stop(&self) {
        // Take first so the join below runs without holding the lock.
        let timer = self.timer.lock().take();
        if timer.is_some() {
            drop(timer);
            debug!(key = ?self.inner.key(), "stopped auto reset timer");
        }
    }
}

impl<K: PartitionKey> Partition<K> for AutoResetLog<K> {
    fn key(&self) -> &K {
        self.inner.key()
    }

    fn kind(&self) -> PartitionKind {
        PartitionKind::AutoReset
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn operation_limit(&self) -> usize {
        self.inner.operation_limit()
    }

    fn message_count(&self) -> usize {
        self.inner.message_count()
    }

    fn operation_count(&self) -> usize {
        self.inner.operation_count()
    }

    fn append(&self, message: &str) -> LogResult<()> {
        self.inner.append(message)
    }

    fn read(&self, start: usize, end: usize) -> LogResult<Vec<String>> {
        self.inner.read(start, end)
    }

    fn reset(&self) -> LogResult<()> {
        self.inner.reset()
    }

    fn deep_copy(&self) -> LogResult<Box<dyn Partition<K>>> {
        self.inner.deep_copy()
    }

    fn snapshot(&self) -> Vec<String> {
        self.inner.snapshot()
    }

    fn close(&self) -> LogResult<()> {
        self.stop();
        self.inner.close()
    }
}

impl<K: PartitionKey> Drop for AutoResetLog<K> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Instant;
    use tempfile::tempdir;

    const LONG: Duration = Duration::from_secs(3600);

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn wraps_memory_log_without_path() {
        let log = AutoResetLog::new(4, 10, 1u32, None, LONG).unwrap();
        assert_eq!(log.kind(), PartitionKind::AutoReset);
        assert_eq!(log.inner_kind(), PartitionKind::Memory);
        assert_eq!(log.period(), LONG);
        assert!(log.is_running());
    }

    #[test]
    fn wraps_durable_log_with_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auto.txt");

        let log = AutoResetLog::new(4, 10, 1u32, Some(&path), LONG).unwrap();
        assert_eq!(log.inner_kind(), PartitionKind::Durable);
        assert!(dir.path().join("auto_backup.txt").exists());
    }

    #[test]
    fn zero_period_rejected() {
        let result = AutoResetLog::new(4, 10, 1u32, None, Duration::ZERO);
        assert!(matches!(result, Err(LogError::InvalidConfig { .. })));
    }

    #[test]
    fn delegates_operations() {
        let log = AutoResetLog::new(2, 3, "A".to_string(), None, LONG).unwrap();
        log.append("m1").unwrap();
        assert_eq!(log.read(0, 0).unwrap(), vec!["m1"]);
        assert_eq!(log.message_count(), 1);
        assert_eq!(log.operation_count(), 2);
        assert_eq!(log.capacity(), 2);
        assert_eq!(log.operation_limit(), 3);
        assert_eq!(log.key(), "A");

        let copy = log.deep_copy().unwrap();
        assert_eq!(copy.kind(), PartitionKind::Memory);
        assert_eq!(copy.key(), "A_copy");
        assert_eq!(copy.snapshot(), vec!["m1"]);

        log.reset().unwrap();
        assert_eq!(log.message_count(), 0);
    }

    #[test]
    fn does_not_fire_immediately() {
        let log = AutoResetLog::new(4, 10, 1u32, None, Duration::from_secs(5)).unwrap();
        log.append("early").unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(log.message_count(), 1);
    }

    #[test]
    fn timer_resets_periodically() {
        let log = AutoResetLog::new(4, 10, 1u32, None, Duration::from_millis(20)).unwrap();
        log.append("first").unwrap();
        assert!(wait_until(Duration::from_secs(5), || log.message_count() == 0));

        log.append("second").unwrap();
        assert!(wait_until(Duration::from_secs(5), || log.message_count() == 0));
    }

    #[test]
    fn timer_restores_durable_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auto.txt");
        fs::write(&path, "seed\n").unwrap();

        let log =
            AutoResetLog::new(4, 10, 1u32, Some(&path), Duration::from_millis(20)).unwrap();
        log.append("extra").unwrap();
        assert!(wait_until(Duration::from_secs(5), || {
            log.snapshot() == vec!["seed".to_string()]
        }));
        assert_eq!(log.operation_count(), 0);
    }

    #[test]
    fn stop_is_idempotent_and_halts_resets() {
        let log = AutoResetLog::new(4, 10, 1u32, None, Duration::from_millis(10)).unwrap();
        log.stop();
        log.stop();
        assert!(!log.is_running());

        log.append("kept").unwrap();
        thread::sleep(Duration::from_millis(60));
        assert_eq!(log.message_count(), 1);

        log.close().unwrap();
        log.close().unwrap();
    }

    #[test]
    fn concurrent_appends_and_resets_keep_invariants() {
        let log = Arc::new(
            AutoResetLog::new(8, 1_000, 1u32, None, Duration::from_millis(1)).unwrap(),
        );

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for i in 0..200 {
                        let _ = log.append(&format!("{t}-{i}"));
                        assert!(log.message_count() <= log.capacity());
                        assert!(log.operation_count() <= log.operation_limit());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        log.stop();
    }
}
