//! Undo, journal and backup retention methods on ArtkeepApi.

use crate::error::{ArtkeepError, Result};
use crate::journal::OperationEntry;
use crate::models::{DiscardResponse, UndoResponse};
use crate::retention::{BackupInfo, CleanupReport};
use crate::ArtkeepApi;

impl ArtkeepApi {
    // ========================================
    // Journal
    // ========================================

    /// Restore the file removed by delete operation `id`.
    ///
    /// Expected refusals (unknown id, already restored, backup gone) come
    /// back as `success: false`; anything else is an error.
    pub async fn undo(&self, id: u64) -> Result<UndoResponse> {
        match self.state.journal.undo(id).await {
            Ok(outcome) => Ok(UndoResponse {
                success: true,
                operation_id: id,
                message: Some(format!("Restored {}", outcome.restored_path.display())),
                error: None,
                restored_path: Some(outcome.restored_path),
            }),
            Err(e @ (ArtkeepError::NotFound { .. } | ArtkeepError::AlreadyRestored { .. })) => {
                Ok(UndoResponse {
                    success: false,
                    operation_id: id,
                    message: None,
                    error: Some(e.to_string()),
                    restored_path: None,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Most recent journal entries first.
    pub fn operations(&self, limit: usize) -> Vec<OperationEntry> {
        self.state.journal.recent(limit)
    }

    pub fn operation(&self, id: u64) -> Option<OperationEntry> {
        self.state.journal.get(id)
    }

    /// Permanently delete the backup of operation `id`.
    pub async fn discard_backup(&self, id: u64) -> Result<DiscardResponse> {
        match self.state.journal.discard(id).await {
            Ok(outcome) => Ok(DiscardResponse {
                success: true,
                operation_id: id,
                bytes_freed: outcome.bytes_freed,
                message: Some(format!(
                    "Permanently deleted {}",
                    outcome.backup_path.display()
                )),
                error: None,
            }),
            Err(e @ ArtkeepError::NotFound { .. }) => Ok(DiscardResponse {
                success: false,
                operation_id: id,
                bytes_freed: 0,
                message: None,
                error: Some(e.to_string()),
            }),
            Err(e) => Err(e),
        }
    }

    // ========================================
    // Retention
    // ========================================

    pub async fn clean_backups(&self, days: u32) -> Result<CleanupReport> {
        self.state.retention.clean_older_than(days).await
    }

    pub async fn empty_trash(&self) -> Result<CleanupReport> {
        self.state.retention.empty_trash().await
    }

    pub fn backup_info(&self) -> Result<BackupInfo> {
        self.state.retention.backup_info()
    }
}
