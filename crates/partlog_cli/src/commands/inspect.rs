//! Inspect command implementation.
//!
//! Reads the configuration and the backing files only; no partition is
//! opened, so nothing is created, no backup is taken and no timer starts.

use partlog_core::PartitionConfig;
use partlog_storage::LineFile;
use serde::Serialize;
use std::io::Write;

/// Configuration inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Number of partitions.
    pub partition_count: usize,
    /// Messages a fresh open would load, across partitions.
    pub message_count: usize,
    /// Per-partition statistics.
    pub partitions: Vec<PartitionStats>,
}

/// Statistics for a single partition.
#[derive(Debug, Serialize)]
pub struct PartitionStats {
    /// Partition key.
    pub key: String,
    /// Variant the configuration builds.
    pub kind: &'static str,
    /// Maximum stored messages.
    pub capacity: usize,
    /// Maximum operations between resets.
    pub operation_limit: usize,
    /// Messages a fresh open would load (lines in the backing file, capped
    /// at capacity; zero for in-memory partitions).
    pub message_count: usize,
    /// Backing file path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Backing file size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Auto-reset period in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_period_seconds: Option<u64>,
}

fn partition_stats(
    config: &PartitionConfig<String>,
) -> Result<PartitionStats, Box<dyn std::error::Error>> {
    let mut stats = PartitionStats {
        key: config.key.clone(),
        kind: config.kind().as_str(),
        capacity: config.capacity,
        operation_limit: config.operation_limit,
        message_count: 0,
        file: None,
        file_size: None,
        reset_period_seconds: config.reset_period.map(|period| period.as_secs()),
    };

    if let Some(path) = &config.file {
        if !path.exists() {
            return Err(format!(
                "No backing file found for partition {:?} at {:?}",
                config.key, path
            )
            .into());
        }
        let file = LineFile::stat(path, config.capacity)?;
        stats.message_count = file.lines;
        stats.file = Some(path.display().to_string());
        stats.file_size = Some(file.bytes);
    }

    Ok(stats)
}

/// Collects statistics for every configured partition.
///
/// # Errors
///
/// Returns an error if a backing file is missing or unreadable.
pub fn collect(
    configs: &[PartitionConfig<String>],
) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let partitions = configs
        .iter()
        .map(partition_stats)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(InspectResult {
        partition_count: partitions.len(),
        message_count: partitions.iter().map(|p| p.message_count).sum(),
        partitions,
    })
}

/// Runs the inspect command.
pub fn run(
    configs: &[PartitionConfig<String>],
    format: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = collect(configs)?;

    match format {
        "json" => writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?,
        _ => print_text_output(&result, out)?,
    }

    Ok(())
}

fn print_text_output(result: &InspectResult, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Partitions: {}", result.partition_count)?;
    writeln!(out, "Messages:   {}", result.message_count)?;

    if result.partitions.is_empty() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(
        out,
        "{:<16} {:<10} {:>9} {:>6} {:>10}  FILE",
        "KEY", "KIND", "MESSAGES", "LIMIT", "BYTES"
    )?;
    for p in &result.partitions {
        writeln!(
            out,
            "{:<16} {:<10} {:>4}/{:<4} {:>6} {:>10}  {}",
            p.key,
            p.kind,
            p.message_count,
            p.capacity,
            p.operation_limit,
            p.file_size.map_or_else(|| "-".to_string(), |size| size.to_string()),
            p.file.as_deref().unwrap_or("-"),
        )?;
    }
    Ok(())
}
