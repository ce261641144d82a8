//! Reversible deletion of custom artwork.
//!
//! Per file: back up, verify the copy, journal it, then remove the original.
//! A file is never removed before its verified copy exists in the batch's
//! backup group.

use super::result::{BatchResult, RefResult};
use crate::artwork::{ArtworkFile, PathResolver, Resolution, Selector, VirtualArtworkRef};
use crate::backup::BackupGroup;
use crate::error::{ArtkeepError, Result};
use crate::journal::{NewOperation, OperationsJournal};
use crate::storage::{durable_copy, files_match};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Executes backup-then-remove for batches of virtual references.
pub struct DeletionEngine {
    resolver: PathResolver,
    journal: Arc<OperationsJournal>,
    backup_root: PathBuf,
}

/// State shared by every reference in one batch.
struct Batch<'a> {
    reason: &'a str,
    /// Created on first use so a batch that deletes nothing leaves no group.
    group: Option<BackupGroup>,
}

impl DeletionEngine {
    pub fn new(
        resolver: PathResolver,
        journal: Arc<OperationsJournal>,
        backup_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            journal,
            backup_root: backup_root.into(),
        }
    }

    /// Delete everything `refs` address, sharing one backup group.
    ///
    /// Per-reference and per-file problems are reported in the result. Only
    /// a journal write failure aborts the batch.
    pub async fn delete_all(&self, refs: &[String], reason: &str) -> Result<BatchResult> {
        let mut batch = Batch {
            reason,
            group: None,
        };
        let mut results = Vec::with_capacity(refs.len());

        for raw in refs {
            let result = match raw.parse::<VirtualArtworkRef>() {
                Ok(reference) => self.delete_ref(raw, &reference, &mut batch).await?,
                Err(e) => RefResult::failed(raw.as_str(), e.to_string()),
            };
            results.push(result);
        }

        let batch_result =
            BatchResult::from_results(results, batch.group.map(|g| g.name));
        info!(
            "Deleted {} of {} references, {} bytes freed{}",
            batch_result.successful,
            batch_result.total,
            batch_result.bytes_freed,
            batch_result
                .backup_group
                .as_deref()
                .map(|g| format!(" (backup group {})", g))
                .unwrap_or_default()
        );
        Ok(batch_result)
    }

    async fn delete_ref(
        &self,
        raw: &str,
        reference: &VirtualArtworkRef,
        batch: &mut Batch<'_>,
    ) -> Result<RefResult> {
        let (details, resolution) = match self.resolver.resolve(reference).await {
            Ok(resolved) => resolved,
            Err(e) => return Ok(RefResult::failed(raw, e.to_string())),
        };

        let mut result = RefResult::new(raw);
        result.item_title = Some(details.item.title.clone());

        let selected = resolution.select(reference.selector);
        if selected.is_empty() {
            result.message = Some(empty_message(&resolution, reference.selector));
            return Ok(result);
        }

        let mut failures = Vec::new();
        for file in &selected {
            match self.delete_file(file, &resolution, reference, batch).await? {
                Ok(id) => {
                    result.deleted_count += 1;
                    result.bytes_freed += file.size_bytes;
                    result.deleted_files.push(file.path.clone());
                    result.operation_ids.push(id);
                }
                Err(e) => {
                    warn!("{}", e);
                    failures.push(e.to_string());
                }
            }
        }

        if result.deleted_count > 0 {
            self.spawn_refresh(&reference.rating_key);
        }

        result.success = failures.is_empty();
        if failures.is_empty() {
            result.message = Some(format!(
                "Deleted {} file(s) from {}",
                result.deleted_count, details.item.title
            ));
        } else {
            result.error = Some(format!(
                "{} of {} file(s) failed: {}",
                failures.len(),
                selected.len(),
                failures.join("; ")
            ));
        }
        Ok(result)
    }

    /// Back up, journal and remove one file.
    ///
    /// The outer `Result` carries batch-fatal journal errors; the inner one
    /// a per-file backup or removal failure.
    async fn delete_file(
        &self,
        file: &ArtworkFile,
        resolution: &Resolution,
        reference: &VirtualArtworkRef,
        batch: &mut Batch<'_>,
    ) -> Result<std::result::Result<u64, ArtkeepError>> {
        // Retention waits on this transaction, so it cannot remove the group
        // between the backup and the entry that records it.
        let mut txn = self.journal.begin().await;

        let group = match &batch.group {
            Some(group) => group.clone(),
            None => match BackupGroup::create(&self.backup_root) {
                Ok(group) => {
                    batch.group = Some(group.clone());
                    group
                }
                Err(e) => {
                    return Ok(Err(ArtkeepError::BackupWriteFailed {
                        path: file.path.clone(),
                        message: format!("cannot create backup group: {}", e),
                    }))
                }
            },
        };

        let relative = file
            .path
            .strip_prefix(resolution.uploads_dir())
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| file.path.file_name().map(PathBuf::from).unwrap_or_default());
        let backup_path = group.path.join(&reference.rating_key).join(relative);

        if let Err(e) = backup_verified(&file.path, &backup_path) {
            return Ok(Err(e));
        }
        debug!("Backed up {} -> {}", file.path.display(), backup_path.display());

        let id = txn.append(
            NewOperation::delete(&group.name, &file.path, &backup_path, batch.reason)
                .with_rating_key(&reference.rating_key)
                .with_size(file.size_bytes),
        );
        txn.commit()?;

        if let Err(e) = fs::remove_file(&file.path) {
            self.journal.revoke(id).await?;
            return Ok(Err(ArtkeepError::DeleteFailed {
                path: file.path.clone(),
                backup: backup_path,
                message: e.to_string(),
            }));
        }

        debug!("Removed {} (operation {})", file.path.display(), id);
        Ok(Ok(id))
    }

    fn spawn_refresh(&self, rating_key: &str) {
        let provider = Arc::clone(self.resolver.provider());
        let rating_key = rating_key.to_string();
        tokio::spawn(async move {
            if let Err(e) = provider.refresh(&rating_key).await {
                warn!("Refresh of item {} failed: {}", rating_key, e);
            }
        });
    }
}

fn empty_message(resolution: &Resolution, selector: Selector) -> String {
    if !resolution.uploads_present {
        return "No Uploads folder found".to_string();
    }
    match selector {
        Selector::Index(i) if !resolution.files.is_empty() => format!(
            "No artwork at index {} ({} found)",
            i,
            resolution.files.len()
        ),
        _ => "No custom artwork found".to_string(),
    }
}

/// Durable copy plus content check. A bad copy is removed again.
fn backup_verified(original: &Path, backup: &Path) -> Result<()> {
    let failed = |message: String| ArtkeepError::BackupWriteFailed {
        path: original.to_path_buf(),
        message,
    };

    durable_copy(original, backup).map_err(|e| failed(e.to_string()))?;
    match files_match(original, backup) {
        Ok(true) => Ok(()),
        Ok(false) => {
            let _ = fs::remove_file(backup);
            Err(failed("backup copy does not match original".to_string()))
        }
        Err(e) => {
            let _ = fs::remove_file(backup);
            Err(failed(e.to_string()))
        }
    }
}
