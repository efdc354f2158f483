//! Line-oriented backing file.

use crate::error::{StorageError, StorageResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// An append-only text file holding one message per line.
///
/// Appends go through a [`BufWriter`] and are not visible on disk until
/// [`flush`](Self::flush) is called (or the buffer fills up). Every
/// operation that reads or copies the file flushes first, so readers always
/// observe every line appended so far.
///
/// The file is opened in append mode: writes always land at the end,
/// regardless of where the last read left the cursor. If the existing
/// content does not end with a newline, one is written before the next
/// line so every line stays separate.
///
/// # Ownership
///
/// A `LineFile` exclusively owns its file handle. Dropping it flushes the
/// buffer on a best-effort basis; call [`flush`](Self::flush) to observe
/// errors.
#[derive(Debug)]
pub struct LineFile {
    path: PathBuf,
    writer: BufWriter<File>,
    pending: usize,
    needs_newline: bool,
}

/// Size and line count of a backing file, gathered without opening it for
/// writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStats {
    /// On-disk size in bytes.
    pub bytes: u64,
    /// Number of lines, capped at the requested maximum.
    pub lines: usize,
}

/// Returns true if `file` is non-empty and its last byte is not `\n`.
fn ends_without_newline(mut file: &File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

impl LineFile {
    /// Opens or creates the file at `path` for reading and appending.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;
        let needs_newline = ends_without_newline(&file)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            pending: 0,
            needs_newline,
        })
    }

    /// Reads size and line count of the file at `path` without creating,
    /// truncating or writing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    pub fn stat(path: &Path, max_lines: usize) -> StorageResult<FileStats> {
        let file = File::open(path)?;
        let bytes = file.metadata()?.len();

        let mut lines = 0;
        for line in BufReader::new(file).split(b'\n').take(max_lines) {
            line?;
            lines += 1;
        }

        Ok(FileStats { bytes, lines })
    }

    /// Opens or creates the file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::open(path)
    }

    /// Number of lines appended since the last flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Buffers `line` followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer had to be written out and that failed.
    pub fn append_line(&mut self, line: &str) -> StorageResult<()> {
        if self.needs_newline {
            self.writer.write_all(b"\n")?;
            self.needs_newline = false;
        }
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.pending += 1;
        Ok(())
    }

    /// Pushes buffered lines to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. Pending lines stay buffered.
    pub fn flush(&mut self) -> StorageResult<()> {
        self.writer.flush()?;
        self.pending = 0;
        Ok(())
    }

    /// Flushes and then calls `sync_all` on the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or the sync fails.
    pub fn sync(&mut self) -> StorageResult<()> {
        self.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Reads at most `max_lines` lines from the start of the file.
    ///
    /// Line terminators (`\n` or `\r\n`) are stripped.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or read fails, or if a line is not
    /// valid UTF-8.
    pub fn read_lines(&mut self, max_lines: usize) -> StorageResult<Vec<String>> {
        self.flush()?;

        let mut file = self.writer.get_ref();
        file.seek(SeekFrom::Start(0))?;

        let reader = BufReader::new(file);
        let mut lines = Vec::new();
        for (index, line) in reader.lines().take(max_lines).enumerate() {
            let line = line.map_err(|err| match err.kind() {
                io::ErrorKind::InvalidData => StorageError::InvalidUtf8 {
                    path: self.path.clone(),
                    line: index + 1,
                },
                _ => StorageError::Io(err),
            })?;
            lines.push(line);
        }

        Ok(lines)
    }

    /// Replaces the whole file content with the content of `source`.
    ///
    /// Pending lines are flushed first so they cannot reappear after the
    /// truncation. Returns the number of bytes copied.
    ///
    /// # Errors
    ///
    /// Returns an error if `source` cannot be opened, or if truncating or
    /// writing fails. A failure after truncation leaves the file short.
    pub fn restore_from(&mut self, source: &Path) -> StorageResult<u64> {
        self.flush()?;

        let mut input = File::open(source).map_err(|err| StorageError::Copy {
            from: source.to_path_buf(),
            to: self.path.clone(),
            source: err,
        })?;

        let file = self.writer.get_mut();
        file.set_len(0)?;
        let copied = io::copy(&mut input, &mut *file)?;
        file.flush()?;
        self.needs_newline = ends_without_newline(file)?;

        Ok(copied)
    }

    /// Copies the file byte for byte to `dest`, overwriting it.
    ///
    /// Returns the number of bytes copied.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or the copy fails.
    pub fn copy_to(&mut self, dest: &Path) -> StorageResult<u64> {
        self.flush()?;

        fs::copy(&self.path, dest).map_err(|err| StorageError::Copy {
            from: self.path.clone(),
            to: dest.to_path_buf(),
            source: err,
        })
    }
}
