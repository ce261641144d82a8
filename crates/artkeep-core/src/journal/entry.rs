//! Journal entry types.
//!
//! Field names match the `operations.json` files written by earlier
//! releases, so an existing journal loads unchanged.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationAction {
    Delete,
    Undo,
}

/// One persisted journal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationEntry {
    pub id: u64,
    /// Name of the backup group directory the file went into.
    #[serde(rename = "timestamp")]
    pub timestamp_folder: String,
    pub action: OperationAction,
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
    #[serde(default)]
    pub reason: String,
    pub can_undo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_key: Option<String>,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Local>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undone_at: Option<DateTime<Local>>,
    /// For `undo` entries: the delete entry that was restored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undo_of: Option<u64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub permanently_deleted: bool,
}

/// Everything about a new entry except the id, which the journal assigns.
#[derive(Debug, Clone)]
pub struct NewOperation {
    pub action: OperationAction,
    pub timestamp_folder: String,
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
    pub reason: String,
    pub rating_key: Option<String>,
    pub size_bytes: u64,
    pub can_undo: bool,
    pub undo_of: Option<u64>,
}

impl NewOperation {
    /// A reversible delete of `original_path`, backed up at `backup_path`.
    pub fn delete(
        timestamp_folder: impl Into<String>,
        original_path: impl Into<PathBuf>,
        backup_path: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            action: OperationAction::Delete,
            timestamp_folder: timestamp_folder.into(),
            original_path: original_path.into(),
            backup_path: backup_path.into(),
            reason: reason.into(),
            rating_key: None,
            size_bytes: 0,
            can_undo: true,
            undo_of: None,
        }
    }

    pub fn with_rating_key(mut self, rating_key: impl Into<String>) -> Self {
        self.rating_key = Some(rating_key.into());
        self
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    pub(crate) fn into_entry(self, id: u64) -> OperationEntry {
        OperationEntry {
            id,
            timestamp_folder: self.timestamp_folder,
            action: self.action,
            original_path: self.original_path,
            backup_path: self.backup_path,
            reason: self.reason,
            can_undo: self.can_undo,
            rating_key: self.rating_key,
            size_bytes: self.size_bytes,
            created_at: Some(Local::now()),
            undone_at: None,
            undo_of: self.undo_of,
            permanently_deleted: false,
        }
    }
}

/// Result of a successful undo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndoOutcome {
    pub operation_id: u64,
    pub undo_entry_id: u64,
    pub restored_path: PathBuf,
}

/// Result of permanently discarding one backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscardOutcome {
    pub operation_id: u64,
    pub backup_path: PathBuf,
    pub bytes_freed: u64,
}
