//! Batch deletion outcomes.

use serde::Serialize;
use std::path::PathBuf;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Convert bytes to megabytes, rounded to two decimals.
pub fn to_mb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

/// Outcome for one virtual reference.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefResult {
    /// The reference as the caller sent it.
    pub path: String,
    pub success: bool,
    pub deleted_count: usize,
    pub deleted_files: Vec<PathBuf>,
    pub bytes_freed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_title: Option<String>,
    pub operation_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RefResult {
    pub(crate) fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub(crate) fn failed(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(path)
        }
    }
}

/// Outcome of one `delete` call.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// True when every reference succeeded.
    pub success: bool,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub bytes_freed: u64,
    pub mb_freed: f64,
    /// Name of the backup group, if anything was backed up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_group: Option<String>,
    pub results: Vec<RefResult>,
}

impl BatchResult {
    pub(crate) fn from_results(results: Vec<RefResult>, backup_group: Option<String>) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        let bytes_freed = results.iter().map(|r| r.bytes_freed).sum();
        Self {
            success: successful == results.len(),
            total: results.len(),
            successful,
            failed: results.len() - successful,
            bytes_freed,
            mb_freed: to_mb(bytes_freed),
            backup_group,
            results,
        }
    }

    pub fn operation_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.results.iter().flat_map(|r| r.operation_ids.iter().copied())
    }
}
