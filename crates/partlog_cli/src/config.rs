//! JSON router configuration.
//!
//! ```json
//! {
//!   "partitions": [
//!     { "capacity": 10, "operationLimit": 100, "partitionKey": "orders" },
//!     { "capacity": 10, "operationLimit": 100, "partitionKey": "audit",
//!       "filename": "audit.txt", "resetPeriodSeconds": 60 }
//!   ]
//! }
//! ```
//!
//! A bare top-level array of partition records is accepted as well.

use partlog_core::PartitionConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path:?}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One partition record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartitionEntry {
    /// Maximum number of stored messages.
    pub capacity: usize,
    /// Maximum number of operations between resets.
    pub operation_limit: usize,
    /// Partition key.
    pub partition_key: String,
    /// Backing file for a durable partition.
    #[serde(default)]
    pub filename: Option<PathBuf>,
    /// Auto-reset period in seconds.
    #[serde(default)]
    pub reset_period_seconds: Option<u64>,
}

impl From<PartitionEntry> for PartitionConfig<String> {
    fn from(entry: PartitionEntry) -> Self {
        let mut config = PartitionConfig::new(entry.capacity, entry.operation_limit, entry.partition_key);
        if let Some(filename) = entry.filename {
            config = config.with_file(filename);
        }
        if let Some(seconds) = entry.reset_period_seconds {
            config = config.with_reset_period(Duration::from_secs(seconds));
        }
        config
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RouterFile {
    Wrapped { partitions: Vec<PartitionEntry> },
    Bare(Vec<PartitionEntry>),
}

/// Parses configuration JSON into partition parameters, in file order.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed JSON or records.
pub fn parse(json: &str) -> Result<Vec<PartitionConfig<String>>, ConfigError> {
    let entries = match serde_json::from_str::<RouterFile>(json)? {
        RouterFile::Wrapped { partitions } | RouterFile::Bare(partitions) => partitions,
    };
    Ok(entries.into_iter().map(PartitionConfig::from).collect())
}

/// Loads and parses a configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<Vec<PartitionConfig<String>>, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_wrapped_records() {
        let configs = parse(
            r#"{
                "partitions": [
                    { "capacity": 3, "operationLimit": 5, "partitionKey": "A" },
                    { "capacity": 4, "operationLimit": 8, "partitionKey": "B",
                      "filename": "b.txt", "resetPeriodSeconds": 30 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0], PartitionConfig::new(3, 5, "A".to_string()));
        assert_eq!(
            configs[1],
            PartitionConfig::new(4, 8, "B".to_string())
                .with_file("b.txt")
                .with_reset_period(Duration::from_secs(30))
        );
    }

    #[test]
    fn parses_bare_array() {
        let configs = parse(
            r#"[{ "capacity": 1, "operationLimit": 2, "partitionKey": "solo", "filename": null }]"#,
        )
        .unwrap();
        assert_eq!(configs, vec![PartitionConfig::new(1, 2, "solo".to_string())]);
    }

    #[test]
    fn rejects_missing_fields() {
        let result = parse(r#"[{ "capacity": 1, "partitionKey": "x" }]"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempdir().unwrap();
        let result = load(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("router.json");
        std::fs::write(
            &path,
            r#"{ "partitions": [{ "capacity": 2, "operationLimit": 2, "partitionKey": "k" }] }"#,
        )
        .unwrap();

        let configs = load(&path).unwrap();
        assert_eq!(configs[0].key, "k");
    }
}
