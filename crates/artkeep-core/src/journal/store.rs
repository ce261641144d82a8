//! The operations journal: `operations.json` plus its lock file.

use super::entry::{
    DiscardOutcome, NewOperation, OperationAction, OperationEntry, UndoOutcome,
};
use crate::config::PathsConfig;
use crate::error::{ArtkeepError, Result};
use crate::storage::{atomic_read_json, atomic_write_json, durable_copy, files_match};
use chrono::Local;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

struct JournalState {
    entries: Vec<OperationEntry>,
    next_id: u64,
}

/// Append-only record of deletions and undos.
///
/// One handle per backup root. The handle holds an exclusive advisory lock
/// on `operations.lock` for its whole lifetime; a second handle (in this or
/// another process) fails to open with [`ArtkeepError::JournalLocked`].
pub struct OperationsJournal {
    path: PathBuf,
    _lock: File,
    state: Mutex<JournalState>,
    /// Last committed entries, readable without waiting on a writer.
    snapshot: RwLock<Arc<Vec<OperationEntry>>>,
}

impl OperationsJournal {
    /// Open (or create) the journal in `backup_root`.
    pub fn open(backup_root: &Path) -> Result<Self> {
        fs::create_dir_all(backup_root)
            .map_err(|e| ArtkeepError::io_with_path(e, backup_root))?;

        let lock_path = backup_root.join(PathsConfig::JOURNAL_LOCK_FILENAME);
        let lock = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| ArtkeepError::io_with_path(e, &lock_path))?;
        if let Err(e) = lock.try_lock_exclusive() {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Err(ArtkeepError::JournalLocked { path: lock_path });
            }
            return Err(ArtkeepError::io_with_path(e, &lock_path));
        }

        let path = backup_root.join(PathsConfig::JOURNAL_FILENAME);
        let mut entries: Vec<OperationEntry> = atomic_read_json(&path)?.unwrap_or_default();
        let next_id = entries.iter().map(|e| e.id + 1).max().unwrap_or(0);

        let stale = revoke_missing(&mut entries, |_| true);
        if stale > 0 {
            warn!(
                "{} journal entries lost their backup while closed; undo disabled for them",
                stale
            );
            atomic_write_json(&path, &entries)?;
        }
        info!(
            "Opened operations journal at {} ({} entries, next id {})",
            path.display(),
            entries.len(),
            next_id
        );

        Ok(Self {
            path,
            _lock: lock,
            snapshot: RwLock::new(Arc::new(entries.clone())),
            state: Mutex::new(JournalState { entries, next_id }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start a write transaction. Holds the journal's writer lock until the
    /// transaction is committed or dropped.
    pub async fn begin(&self) -> JournalTxn<'_> {
        let guard = self.state.lock().await;
        let working = guard.entries.clone();
        let next_id = guard.next_id;
        JournalTxn {
            journal: self,
            guard,
            working,
            next_id,
        }
    }

    /// Append one entry and persist it. Returns the assigned id.
    pub async fn append(&self, op: NewOperation) -> Result<u64> {
        let mut txn = self.begin().await;
        let id = txn.append(op);
        txn.commit()?;
        Ok(id)
    }

    /// Mark a delete entry as not undoable, e.g. because the original could
    /// not be removed and a restore would overwrite it.
    pub async fn revoke(&self, id: u64) -> Result<()> {
        let mut txn = self.begin().await;
        let entry = txn.entry_mut(id)?;
        entry.can_undo = false;
        txn.commit()
    }

    /// Restore the file recorded by delete entry `id`.
    ///
    /// The backup is copied back byte-for-byte and kept. The entry is then
    /// flipped to `can_undo = false` and an `undo` entry is appended. A
    /// failed restore leaves the entry undoable.
    pub async fn undo(&self, id: u64) -> Result<UndoOutcome> {
        let mut txn = self.begin().await;
        let entry = txn.entry(id)?.clone();

        if entry.action != OperationAction::Delete || !entry.can_undo {
            return Err(ArtkeepError::AlreadyRestored { id });
        }
        if !entry.backup_path.is_file() {
            return Err(ArtkeepError::not_found(format!(
                "Backup file {} no longer exists",
                entry.backup_path.display()
            )));
        }

        restore_file(&entry.backup_path, &entry.original_path)?;

        let undone = txn.entry_mut(id)?;
        undone.can_undo = false;
        undone.undone_at = Some(Local::now());

        let undo_entry_id = txn.append(NewOperation {
            action: OperationAction::Undo,
            timestamp_folder: entry.timestamp_folder.clone(),
            original_path: entry.original_path.clone(),
            backup_path: entry.backup_path.clone(),
            reason: format!("Undo of operation {}", id),
            rating_key: entry.rating_key.clone(),
            size_bytes: entry.size_bytes,
            can_undo: false,
            undo_of: Some(id),
        });
        txn.commit()?;

        info!("Restored {} (operation {})", entry.original_path.display(), id);
        Ok(UndoOutcome {
            operation_id: id,
            undo_entry_id,
            restored_path: entry.original_path,
        })
    }

    /// Permanently delete the backup recorded by entry `id`.
    pub async fn discard(&self, id: u64) -> Result<DiscardOutcome> {
        let mut txn = self.begin().await;
        let entry = txn.entry(id)?.clone();
        if entry.action != OperationAction::Delete {
            return Err(ArtkeepError::Validation {
                field: "operation_id".to_string(),
                message: format!("operation {} is not a delete", id),
            });
        }

        let (present, bytes_freed) = match fs::metadata(&entry.backup_path) {
            Ok(meta) => (true, meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (false, 0),
            Err(e) => return Err(ArtkeepError::io_with_path(e, &entry.backup_path)),
        };

        // The entry must stop promising an undo before its backup goes.
        let discarded = txn.entry_mut(id)?;
        discarded.can_undo = false;
        discarded.permanently_deleted = true;
        txn.commit()?;

        if present {
            fs::remove_file(&entry.backup_path)
                .map_err(|e| ArtkeepError::io_with_path(e, &entry.backup_path))?;
        }

        info!(
            "Discarded backup {} ({} bytes)",
            entry.backup_path.display(),
            bytes_freed
        );
        Ok(DiscardOutcome {
            operation_id: id,
            backup_path: entry.backup_path,
            bytes_freed,
        })
    }

    /// Most recent entries first.
    pub fn recent(&self, limit: usize) -> Vec<OperationEntry> {
        self.snapshot()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: u64) -> Option<OperationEntry> {
        self.snapshot().iter().find(|e| e.id == id).cloned()
    }

    /// All committed entries, oldest first.
    pub fn snapshot(&self) -> Arc<Vec<OperationEntry>> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn publish(&self, entries: &[OperationEntry]) {
        let fresh = Arc::new(entries.to_vec());
        match self.snapshot.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
    }
}

/// Flip `can_undo` off for selected entries whose backup file is gone.
fn revoke_missing(
    entries: &mut [OperationEntry],
    selected: impl Fn(&OperationEntry) -> bool,
) -> usize {
    let mut changed = 0;
    for entry in entries
        .iter_mut()
        .filter(|e| e.can_undo && selected(e) && !e.backup_path.is_file())
    {
        entry.can_undo = false;
        changed += 1;
    }
    changed
}

/// Copy a backup over `original`, then check the bytes.
fn restore_file(backup: &Path, original: &Path) -> Result<()> {
    let failed = |message: String| ArtkeepError::RestoreFailed {
        path: original.to_path_buf(),
        message,
    };

    durable_copy(backup, original).map_err(|e| failed(e.to_string()))?;
    match files_match(backup, original) {
        Ok(true) => Ok(()),
        Ok(false) => Err(failed("restored file does not match backup".to_string())),
        Err(e) => Err(failed(e.to_string())),
    }
}

/// An in-progress change to the journal.
///
/// Edits apply to a working copy. [`JournalTxn::commit`] persists them and
/// publishes a new snapshot; dropping the transaction discards them.
pub struct JournalTxn<'a> {
    journal: &'a OperationsJournal,
    guard: MutexGuard<'a, JournalState>,
    working: Vec<OperationEntry>,
    next_id: u64,
}

impl JournalTxn<'_> {
    pub fn entries(&self) -> &[OperationEntry] {
        &self.working
    }

    pub fn append(&mut self, op: NewOperation) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.working.push(op.into_entry(id));
        id
    }

    /// Flip `can_undo` off for every entry whose backup lies under `dir`.
    /// Returns how many entries changed.
    pub fn invalidate_under(&mut self, dir: &Path) -> usize {
        let mut changed = 0;
        for entry in self
            .working
            .iter_mut()
            .filter(|e| e.can_undo && e.backup_path.starts_with(dir))
        {
            entry.can_undo = false;
            changed += 1;
        }
        changed
    }

    /// Like [`JournalTxn::invalidate_under`], but only for entries whose
    /// backup file no longer exists.
    pub fn invalidate_missing_under(&mut self, dir: &Path) -> usize {
        revoke_missing(&mut self.working, |e| e.backup_path.starts_with(dir))
    }

    fn entry(&self, id: u64) -> Result<&OperationEntry> {
        self.working
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| ArtkeepError::not_found(format!("Operation {} not found", id)))
    }

    fn entry_mut(&mut self, id: u64) -> Result<&mut OperationEntry> {
        self.working
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ArtkeepError::not_found(format!("Operation {} not found", id)))
    }

    /// Write the working copy to disk and make it current.
    pub fn commit(mut self) -> Result<()> {
        atomic_write_json(&self.journal.path, &self.working)?;
        self.journal.publish(&self.working);
        debug!("Journal committed ({} entries)", self.working.len());
        self.guard.entries = std::mem::take(&mut self.working);
        self.guard.next_id = self.next_id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backed_up_file(root: &Path, name: &str, bytes: &[u8]) -> (PathBuf, PathBuf) {
        let original = root.join("bundle").join("Uploads").join("posters").join(name);
        let backup = root.join("backups").join("20250101_000000_000000").join(name);
        fs::create_dir_all(backup.parent().unwrap()).unwrap();
        fs::write(&backup, bytes).unwrap();
        (original, backup)
    }

    #[tokio::test]
    async fn test_ids_increase_across_reopen() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("backups");

        let journal = OperationsJournal::open(&root).unwrap();
        let a = journal.append(NewOperation::delete("g", "/o/1", "/b/1", "r")).await.unwrap();
        let b = journal.append(NewOperation::delete("g", "/o/2", "/b/2", "r")).await.unwrap();
        assert!(b > a);
        drop(journal);

        let journal = OperationsJournal::open(&root).unwrap();
        let c = journal.append(NewOperation::delete("g", "/o/3", "/b/3", "r")).await.unwrap();
        assert!(c > b);
        assert_eq!(journal.recent(10).iter().map(|e| e.id).collect::<Vec<_>>(), vec![c, b, a]);
    }

    #[tokio::test]
    async fn test_second_handle_is_locked_out() {
        let tmp = TempDir::new().unwrap();
        let _journal = OperationsJournal::open(tmp.path()).unwrap();
        let err = OperationsJournal::open(tmp.path()).err().unwrap();
        assert!(matches!(err, ArtkeepError::JournalLocked { .. }));
    }

    #[tokio::test]
    async fn test_undo_restores_and_only_once() {
        let tmp = TempDir::new().unwrap();
        let (original, backup) = backed_up_file(tmp.path(), "a3c5e7", b"poster bytes");
        let journal = OperationsJournal::open(&tmp.path().join("backups")).unwrap();
        let id = journal
            .append(NewOperation::delete("20250101_000000_000000", &original, &backup, "test"))
            .await
            .unwrap();

        let outcome = journal.undo(id).await.unwrap();
        assert_eq!(outcome.restored_path, original);
        assert_eq!(fs::read(&original).unwrap(), b"poster bytes");
        assert!(backup.exists());

        let entry = journal.get(id).unwrap();
        assert!(!entry.can_undo);
        assert!(entry.undone_at.is_some());
        let audit = journal.get(outcome.undo_entry_id).unwrap();
        assert_eq!(audit.action, OperationAction::Undo);
        assert_eq!(audit.undo_of, Some(id));

        fs::write(&original, b"changed since").unwrap();
        let err = journal.undo(id).await.unwrap_err();
        assert!(matches!(err, ArtkeepError::AlreadyRestored { .. }));
        assert_eq!(fs::read(&original).unwrap(), b"changed since");
    }

    #[tokio::test]
    async fn test_undo_missing_backup_has_no_side_effect() {
        let tmp = TempDir::new().unwrap();
        let (original, backup) = backed_up_file(tmp.path(), "x", b"1");
        let journal = OperationsJournal::open(&tmp.path().join("backups")).unwrap();
        let id = journal
            .append(NewOperation::delete("g", &original, &backup, "r"))
            .await
            .unwrap();
        fs::remove_file(&backup).unwrap();

        assert!(matches!(
            journal.undo(id).await,
            Err(ArtkeepError::NotFound { .. })
        ));
        assert!(journal.get(id).unwrap().can_undo);
        assert!(!original.exists());
        assert!(matches!(
            journal.undo(999).await,
            Err(ArtkeepError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_discard_removes_backup() {
        let tmp = TempDir::new().unwrap();
        let (original, backup) = backed_up_file(tmp.path(), "y", b"12345");
        let journal = OperationsJournal::open(&tmp.path().join("backups")).unwrap();
        let id = journal
            .append(NewOperation::delete("g", &original, &backup, "r"))
            .await
            .unwrap();

        let outcome = journal.discard(id).await.unwrap();
        assert_eq!(outcome.bytes_freed, 5);
        assert!(!backup.exists());
        let entry = journal.get(id).unwrap();
        assert!(entry.permanently_deleted);
        assert!(matches!(
            journal.undo(id).await,
            Err(ArtkeepError::AlreadyRestored { .. })
        ));
    }

    #[tokio::test]
    async fn test_reopen_revokes_entries_without_backup() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("backups");
        let (original, backup) = backed_up_file(tmp.path(), "gone", b"1");
        let (kept_original, kept) = backed_up_file(tmp.path(), "kept", b"2");

        let journal = OperationsJournal::open(&root).unwrap();
        let lost = journal
            .append(NewOperation::delete("20250101_000000_000000", &original, &backup, "r"))
            .await
            .unwrap();
        let alive = journal
            .append(NewOperation::delete("20250101_000000_000000", &kept_original, &kept, "r"))
            .await
            .unwrap();
        drop(journal);
        fs::remove_file(&backup).unwrap();

        let journal = OperationsJournal::open(&root).unwrap();
        assert!(!journal.get(lost).unwrap().can_undo);
        assert!(journal.get(alive).unwrap().can_undo);
        drop(journal);

        // The repair is persisted
        let on_disk: Vec<OperationEntry> =
            atomic_read_json(&root.join(PathsConfig::JOURNAL_FILENAME)).unwrap().unwrap();
        assert!(!on_disk.iter().find(|e| e.id == lost).unwrap().can_undo);
    }

    #[tokio::test]
    async fn test_discard_keeps_backup_when_journal_write_fails() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("backups");
        let (original, backup) = backed_up_file(tmp.path(), "z", b"abc");
        let journal = OperationsJournal::open(&root).unwrap();
        let id = journal
            .append(NewOperation::delete("g", &original, &backup, "r"))
            .await
            .unwrap();

        // A directory in place of the journal file makes every commit fail
        let journal_file = root.join(PathsConfig::JOURNAL_FILENAME);
        fs::remove_file(&journal_file).unwrap();
        fs::create_dir(&journal_file).unwrap();

        assert!(journal.discard(id).await.is_err());
        assert!(backup.is_file());
        assert!(journal.get(id).unwrap().can_undo);
    }

    #[tokio::test]
    async fn test_dropped_transaction_changes_nothing() {
        let tmp = TempDir::new().unwrap();
        let journal = OperationsJournal::open(tmp.path()).unwrap();
        let id = journal
            .append(NewOperation::delete("g", "/o", tmp.path().join("g").join("f"), "r"))
            .await
            .unwrap();

        {
            let mut txn = journal.begin().await;
            assert_eq!(txn.invalidate_under(&tmp.path().join("g")), 1);
        }
        assert!(journal.get(id).unwrap().can_undo);

        let mut txn = journal.begin().await;
        txn.invalidate_under(&tmp.path().join("g"));
        txn.commit().unwrap();
        assert!(!journal.get(id).unwrap().can_undo);
    }
}
