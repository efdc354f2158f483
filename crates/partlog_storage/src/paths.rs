//! Sibling path derivation for backups and copies.

use std::path::{Path, PathBuf};

/// Suffix inserted before the extension of a backup file.
pub const BACKUP_SUFFIX: &str = "_backup";

/// Suffix inserted before the extension of a deep-copy file.
pub const COPY_SUFFIX: &str = "_copy";

/// Inserts `suffix` between the file stem and the extension.
///
/// The result lives in the same directory as `path`.
/// `logs/orders.txt` with `_backup` becomes `logs/orders_backup.txt`;
/// a path without an extension just gains the suffix.
#[must_use]
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };

    path.with_file_name(name)
}

/// Returns the backup path for a backing file.
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, BACKUP_SUFFIX)
}

/// Returns the deep-copy path for a backing file.
#[must_use]
pub fn copy_path(path: &Path) -> PathBuf {
    with_suffix(path, COPY_SUFFIX)
}
