//! File-backed message log.
//!
//! A [`DurableLog`] wraps a [`MessageLog`] and mirrors every accepted append
//! to a line-oriented backing file. A byte-for-byte backup of the file is
//! taken once, when the log is opened, and [`reset`](Partition::reset)
//! restores the file (and memory) from that backup.
//!
//! ## Files
//!
//! For a backing file `orders.txt` the log also touches:
//!
//! - `orders_backup.txt`: construction-time snapshot, overwritten on every open
//! - `orders_copy.txt`: target of [`deep_copy`](Partition::deep_copy)
//!
//! ## Write path
//!
//! The in-memory append happens first; the line is then buffered and the
//! buffer is flushed once [`FLUSH_INTERVAL`] lines are pending. A failed
//! write leaves memory ahead of disk and is reported, never rolled back.

use crate::error::LogResult;
use crate::key::PartitionKey;
use crate::log::MessageLog;
use crate::partition::{Partition, PartitionKind};
use parking_lot::Mutex;
use partlog_storage::{backup_path, copy_path, LineFile};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Number of buffered lines that triggers a flush.
///
/// Counted from the last flush, not from the number of stored messages, so
/// lines loaded at open do not shift the cadence. At most
/// `FLUSH_INTERVAL - 1` accepted messages are ever unflushed.
pub const FLUSH_INTERVAL: usize = 5;

/// A message log mirrored to a backing file.
///
/// # Locking
///
/// The backing file mutex is held for the whole of every operation and is
/// always taken before the inner log's mutex.
#[derive(Debug)]
pub struct DurableLog<K> {
    log: MessageLog<K>,
    file: Mutex<LineFile>,
    path: PathBuf,
    backup_path: PathBuf,
}

impl<K: PartitionKey> DurableLog<K> {
    /// Opens (or creates) a durable log over `path`.
    ///
    /// The in-memory state is replaced by the first `capacity` lines of the
    /// file; loading does not count as operations. The file is then copied
    /// to the backup path, overwriting any earlier backup.
    ///
    /// # Errors
    ///
    /// Returns an error if the bounds are invalid, or if the file cannot be
    /// opened, read or backed up.
    pub fn open(
        capacity: usize,
        operation_limit: usize,
        key: K,
        path: impl AsRef<Path>,
    ) -> LogResult<Self> {
        let path = path.as_ref();
        let log = MessageLog::new(capacity, operation_limit, key)?;

        let mut file = LineFile::open_with_create_dirs(path)?;
        let lines = file.read_lines(capacity)?;
        log.replace_messages(lines, false);

        let backup_path = backup_path(path);
        file.copy_to(&backup_path)?;

        debug!(
            key = ?log.key(),
            path = %path.display(),
            messages = log.message_count(),
            "opened durable log"
        );

        Ok(Self {
            log,
            file: Mutex::new(file),
            path: path.to_path_buf(),
            backup_path,
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the construction-time backup.
    #[must_use]
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Number of accepted messages not yet flushed to the file.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.file.lock().pending()
    }

    /// Flushes buffered lines to the backing file.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    pub fn flush(&self) -> LogResult<()> {
        self.file.lock().flush()?;
        Ok(())
    }

    /// Copies this log under `key.successor()`.
    ///
    /// Pending lines are flushed, the backing file is copied byte for byte
    /// to its `_copy` sibling, and a new durable log is opened over the copy
    /// (taking its own backup). The copy holds exactly the copied file's
    /// content. The copy is charged one operation per message, capped at the
    /// operation limit.
    ///
    /// An existing `_copy` file is overwritten, even if another log is open
    /// over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush, the file copy or the nested open fails.
    pub fn deep_copy(&self) -> LogResult<Self> {
        let mut file = self.file.lock();
        let copy_path = copy_path(&self.path);
        file.copy_to(&copy_path)?;

        let copy = Self::open(
            self.log.capacity(),
            self.log.operation_limit(),
            self.log.key().successor(),
            &copy_path,
        )?;

        let copied = copy.log.snapshot();
        if copied != self.log.snapshot() {
            warn!(
                key = ?self.log.key(),
                path = %copy_path.display(),
                "deep copy content differs from in-memory state; using file content"
            );
        }
        copy.log.replace_messages(copied, true);
        drop(file);

        debug!(
            key = ?self.log.key(),
            copy_key = ?copy.log.key(),
            path = %copy.path().display(),
            "deep copied durable log"
        );
        Ok(copy)
    }
}

impl<K: PartitionKey> Partition<K> for DurableLog<K> {
    fn key(&self) -> &K {
        self.log.key()
    }

    fn kind(&self) -> PartitionKind {
        PartitionKind::Durable
    }

    fn capacity(&self) -> usize {
        self.log.capacity()
    }

    fn operation_limit(&self) -> usize {
        self.log.operation_limit()
    }

    fn message_count(&self) -> usize {
        let _file = self.file.lock();
        self.log.message_count()
    }

    fn operation_count(&self) -> usize {
        let _file = self.file.lock();
        self.log.operation_count()
    }

    fn append(&self, message: &str) -> LogResult<()> {
        let mut file = self.file.lock();
        self.log.append(message)?;

        file.append_line(message)?;
        if file.pending() >= FLUSH_INTERVAL {
            file.flush()?;
        }
        Ok(())
    }

    fn read(&self, start: usize, end: usize) -> LogResult<Vec<String>> {
        let _file = self.file.lock();
        self.log.read(start, end)
    }

    fn reset(&self) -> LogResult<()> {
        let mut file = self.file.lock();
        self.log.reset()?;

        if !self.backup_path.exists() {
            warn!(
                key = ?self.log.key(),
                backup = %self.backup_path.display(),
                "backup missing; memory cleared but backing file left untouched"
            );
            return Ok(());
        }

        file.restore_from(&self.backup_path)?;
        let lines = file.read_lines(self.log.capacity())?;
        self.log.replace_messages(lines, false);

        debug!(
            key = ?self.log.key(),
            messages = self.log.message_count(),
            "restored durable log from backup"
        );
        Ok(())
    }

    fn deep_copy(&self) -> LogResult<Box<dyn Partition<K>>> {
        Ok(Box::new(DurableLog::deep_copy(self)?))
    }

    fn snapshot(&self) -> Vec<String> {
        let _file = self.file.lock();
        self.log.snapshot()
    }

    fn close(&self) -> LogResult<()> {
        self.file.lock().sync()?;
        Ok(())
    }
}

impl<K> Drop for DurableLog<K> {
    fn drop(&mut self) {
        if let Err(err) = self.file.get_mut().flush() {
            warn!(path = %self.path.display(), error = %err, "failed to flush durable log on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LogError;
    use std::fs;
    use tempfile::tempdir;

    fn open(path: &Path) -> DurableLog<String> {
        DurableLog::open(10, 100, "D".to_string(), path).unwrap()
    }

    #[test]
    fn open_creates_file_and_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");

        let log = open(&path);
        assert!(path.exists());
        assert_eq!(log.backup_path(), dir.path().join("log_backup.txt"));
        assert!(log.backup_path().exists());
        assert_eq!(log.message_count(), 0);
        assert_eq!(log.kind(), PartitionKind::Durable);
    }

    #[test]
    fn open_loads_existing_lines_up_to_capacity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "a\nb\nc\nd\n").unwrap();

        let log = DurableLog::open(3, 10, 1u32, &path).unwrap();
        assert_eq!(log.snapshot(), vec!["a", "b", "c"]);
        assert_eq!(log.operation_count(), 0);
        assert_eq!(
            fs::read_to_string(log.backup_path()).unwrap(),
            "a\nb\nc\nd\n"
        );
    }

    #[test]
    fn append_flushes_every_fifth_message() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let log = open(&path);

        for i in 0..4 {
            log.append(&format!("m{i}")).unwrap();
        }
        assert_eq!(log.pending(), 4);
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        log.append("m4").unwrap();
        assert_eq!(log.pending(), 0);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "m0\nm1\nm2\nm3\nm4\n"
        );
    }

    #[test]
    fn flush_cadence_ignores_loaded_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "a\nb\nc\n").unwrap();
        let log = open(&path);

        for i in 0..4 {
            log.append(&format!("m{i}")).unwrap();
        }
        assert_eq!(log.pending(), 4);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nc\n");

        log.append("m4").unwrap();
        assert_eq!(log.pending(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 8);
    }

    #[test]
    fn reopen_after_unterminated_seed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "seed").unwrap();

        {
            let log = DurableLog::open(5, 10, 1u32, &path).unwrap();
            log.append("x").unwrap();
            log.close().unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "seed\nx\n");

        let log = DurableLog::open(5, 10, 1u32, &path).unwrap();
        assert_eq!(log.snapshot(), vec!["seed", "x"]);

        // Unterminated backup: the restored line must stay separate.
        fs::write(log.backup_path(), "seed").unwrap();
        log.reset().unwrap();
        log.append("y").unwrap();
        log.close().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "seed\ny\n");
    }

    #[test]
    fn rejected_append_is_not_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let log = DurableLog::open(1, 10, 1u32, &path).unwrap();

        log.append("kept").unwrap();
        assert!(matches!(
            log.append("rejected"),
            Err(LogError::CapacityExceeded { .. })
        ));
        log.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "kept\n");
    }

    #[test]
    fn reopen_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");

        {
            let log = open(&path);
            log.append("one").unwrap();
            log.append("two").unwrap();
            log.close().unwrap();
        }

        let log = open(&path);
        assert_eq!(log.snapshot(), vec!["one", "two"]);
        assert_eq!(log.read(0, 1).unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn drop_flushes_pending_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");

        {
            let log = open(&path);
            log.append("buffered").unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "buffered\n");
    }

    #[test]
    fn reset_restores_empty_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let log = open(&path);

        log.append("x").unwrap();
        log.append("y").unwrap();
        log.flush().unwrap();

        log.reset().unwrap();
        assert_eq!(log.message_count(), 0);
        assert_eq!(log.operation_count(), 0);
        assert_eq!(
            fs::read(&path).unwrap(),
            fs::read(log.backup_path()).unwrap()
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn reset_discards_unflushed_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let log = open(&path);

        log.append("unflushed").unwrap();
        log.reset().unwrap();
        log.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert!(log.snapshot().is_empty());
    }

    #[test]
    fn reset_restores_construction_time_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "seed\n").unwrap();

        let log = open(&path);
        log.append("later").unwrap();
        log.flush().unwrap();
        assert_eq!(log.snapshot(), vec!["seed", "later"]);

        log.reset().unwrap();
        assert_eq!(log.snapshot(), vec!["seed"]);
        assert_eq!(log.operation_count(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "seed\n");

        log.reset().unwrap();
        assert_eq!(log.snapshot(), vec!["seed"]);
    }

    #[test]
    fn reset_without_backup_leaves_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let log = open(&path);

        log.append("x").unwrap();
        log.flush().unwrap();
        fs::remove_file(log.backup_path()).unwrap();

        log.reset().unwrap();
        assert_eq!(log.message_count(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "x\n");
    }

    #[test]
    fn deep_copy_copies_file_and_memory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let log = open(&path);

        log.append("a").unwrap();
        log.append("b").unwrap();
        log.read(0, 0).unwrap();

        let copy = DurableLog::deep_copy(&log).unwrap();
        assert_eq!(copy.key(), "D_copy");
        assert_eq!(copy.path(), dir.path().join("log_copy.txt"));
        assert_eq!(copy.snapshot(), vec!["a", "b"]);
        assert_eq!(copy.operation_count(), 2);
        assert!(dir.path().join("log_copy_backup.txt").exists());

        log.append("c").unwrap();
        assert_eq!(copy.snapshot(), vec!["a", "b"]);

        copy.append("z").unwrap();
        copy.close().unwrap();
        log.close().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nc\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("log_copy.txt")).unwrap(),
            "a\nb\nz\n"
        );
    }

    #[test]
    fn deep_copy_charge_is_capped_at_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "a\nb\nc\n").unwrap();

        let log = DurableLog::open(5, 2, 'q', &path).unwrap();
        let copy = DurableLog::deep_copy(&log).unwrap();

        assert_eq!(*copy.key(), 'r');
        assert_eq!(copy.message_count(), 3);
        assert_eq!(copy.operation_count(), 2);
    }
}
