//! Age-based cleanup and "empty trash" for backup groups.

use crate::backup::{tree_size, BackupGroup};
use crate::deletion::to_mb;
use crate::error::Result;
use crate::journal::OperationsJournal;
use chrono::{Local, TimeDelta};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a cleanup pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub success: bool,
    pub removed_count: usize,
    /// Names of the removed groups.
    pub removed: Vec<String>,
    pub bytes_freed: u64,
    pub mb_freed: f64,
    /// Journal entries that lost their backup.
    pub invalidated_operations: usize,
}

/// Size of everything under the backup root.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackupInfo {
    pub total_size_bytes: u64,
    pub total_size_mb: f64,
    pub file_count: usize,
    pub group_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_group: Option<String>,
}

pub struct RetentionManager {
    backup_root: PathBuf,
    journal: Arc<OperationsJournal>,
}

impl RetentionManager {
    pub fn new(backup_root: impl Into<PathBuf>, journal: Arc<OperationsJournal>) -> Self {
        Self {
            backup_root: backup_root.into(),
            journal,
        }
    }

    /// Remove every group created more than `days` days ago.
    ///
    /// `days = 0` removes every group created before now.
    pub async fn clean_older_than(&self, days: u32) -> Result<CleanupReport> {
        let cutoff = TimeDelta::try_days(i64::from(days))
            .and_then(|age| Local::now().naive_local().checked_sub_signed(age));
        let Some(cutoff) = cutoff else {
            info!("No backup group can be older than {} days", days);
            return Ok(CleanupReport {
                success: true,
                ..CleanupReport::default()
            });
        };
        info!("Cleaning backup groups older than {} days (before {})", days, cutoff);
        self.remove_groups(|group| group.created < cutoff).await
    }

    /// Remove every group.
    pub async fn empty_trash(&self) -> Result<CleanupReport> {
        info!("Emptying trash under {}", self.backup_root.display());
        self.remove_groups(|_| true).await
    }

    /// Measure the backup root.
    pub fn backup_info(&self) -> Result<BackupInfo> {
        let groups = BackupGroup::list(&self.backup_root)?;
        let (mut bytes, mut files) = (0u64, 0usize);
        for group in &groups {
            let size = group.size();
            bytes += size.bytes;
            files += size.files;
        }

        Ok(BackupInfo {
            total_size_bytes: bytes,
            total_size_mb: to_mb(bytes),
            file_count: files,
            group_count: groups.len(),
            oldest_group: groups.first().map(|g| g.name.clone()),
            newest_group: groups.last().map(|g| g.name.clone()),
        })
    }

    /// Remove matching groups while holding the journal's writer lock, so
    /// an undo cannot read a backup that is being deleted.
    async fn remove_groups(&self, selected: impl Fn(&BackupGroup) -> bool) -> Result<CleanupReport> {
        let mut txn = self.journal.begin().await;
        let groups = BackupGroup::list(&self.backup_root)?;

        let mut report = CleanupReport {
            success: true,
            ..CleanupReport::default()
        };
        for group in groups.iter().filter(|g| selected(g)) {
            let size = tree_size(&group.path);
            if let Err(e) = fs::remove_dir_all(&group.path) {
                warn!("Failed to remove backup group {}: {}", group.path.display(), e);
                report.success = false;
                // Part of the tree may already be gone
                report.invalidated_operations += txn.invalidate_missing_under(&group.path);
                continue;
            }
            report.bytes_freed += size.bytes;
            report.removed.push(group.name.clone());
            report.invalidated_operations += txn.invalidate_under(&group.path);
        }

        if report.invalidated_operations > 0 {
            txn.commit()?;
        }

        report.removed_count = report.removed.len();
        report.mb_freed = to_mb(report.bytes_freed);
        info!(
            "Removed {} backup groups ({} bytes, {} operations no longer undoable)",
            report.removed_count, report.bytes_freed, report.invalidated_operations
        );
        Ok(report)
    }
}
