//! # partlog Storage
//!
//! Backing-file primitives for durable partitions.
//!
//! This crate is the lowest layer of partlog. It knows how to keep a text
//! file of one-message-per-line records open, append to it through a
//! buffer, read it back, and snapshot or restore it byte for byte. It does
//! not know about capacities, operation limits or partition keys.
//!
//! ## File Format
//!
//! - UTF-8 text, one message per line, `\n` terminated
//! - No escaping: messages must not contain line terminators
//! - Reconstruction reads lines back in order
//!
//! ## Example
//!
//! ```no_run
//! use partlog_storage::{backup_path, LineFile};
//! use std::path::Path;
//!
//! let mut file = LineFile::open(Path::new("orders.log")).unwrap();
//! file.append_line("hello").unwrap();
//! file.flush().unwrap();
//! file.copy_to(&backup_path(Path::new("orders.log"))).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod paths;

pub use error::{StorageError, StorageResult};
pub use file::{FileStats, LineFile};
pub use paths::{backup_path, copy_path, with_suffix, BACKUP_SUFFIX, COPY_SUFFIX};
