//! # partlog Core
//!
//! Partitioned message logs.
//!
//! This crate provides:
//! - [`MessageLog`]: fixed-capacity, operation-limited in-memory log
//! - [`DurableLog`]: a `MessageLog` mirrored to an append-only file, with a
//!   construction-time backup used by reset
//! - [`AutoResetLog`]: a wrapper resetting any partition on a timer
//! - [`Router`]: keyed dispatch over a growable set of partitions
//!
//! All variants implement the [`Partition`] trait. Deep copies are keyed by
//! [`PartitionKey::successor`].
//!
//! ## Example
//!
//! ```rust
//! use partlog_core::{LogError, PartitionConfig, Router};
//!
//! let router = Router::from_configs([
//!     PartitionConfig::new(3, 5, "A".to_string()),
//!     PartitionConfig::new(3, 5, "B".to_string()),
//! ])
//! .unwrap();
//!
//! let c = "C".to_string();
//! assert!(matches!(router.append_message(&c, "hi"), Err(LogError::KeyNotFound { .. })));
//!
//! router.add_partition(PartitionConfig::new(3, 5, c.clone())).unwrap();
//! router.append_message(&c, "hi").unwrap();
//! assert_eq!(router.read_messages(&c, 0, 0).unwrap(), vec!["hi"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auto_reset;
mod config;
mod durable;
mod error;
mod key;
mod log;
mod partition;
mod router;

pub use auto_reset::AutoResetLog;
pub use config::PartitionConfig;
pub use durable::{DurableLog, FLUSH_INTERVAL};
pub use error::{LogError, LogResult};
pub use key::{PartitionKey, STRING_KEY_SUFFIX};
pub use log::{MessageLog, MAX_MESSAGE_LEN};
pub use partition::{Partition, PartitionKind};
pub use router::Router;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
