//! Backup groups: one timestamp-named directory per delete batch.

use crate::config::RetentionConfig;
use crate::error::{ArtkeepError, Result};
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A backup group directory under the backup root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupGroup {
    pub name: String,
    pub path: PathBuf,
    /// Local time the group was created, parsed from its name.
    pub created: NaiveDateTime,
}

/// Bytes and file count of a directory tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeSize {
    pub bytes: u64,
    pub files: usize,
}

impl BackupGroup {
    /// Parse a group directory name. Both the current and the legacy
    /// (second precision) formats are accepted.
    pub fn parse_name(name: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(name, RetentionConfig::GROUP_NAME_FORMAT)
            .or_else(|_| {
                NaiveDateTime::parse_from_str(name, RetentionConfig::LEGACY_GROUP_NAME_FORMAT)
            })
            .ok()
    }

    /// Create a new, empty group named after the current local time.
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).map_err(|e| ArtkeepError::io_with_path(e, root))?;

        // Two batches in the same microsecond get distinct directories.
        for _ in 0..16 {
            let now = Local::now().naive_local();
            let name = now.format(RetentionConfig::GROUP_NAME_FORMAT).to_string();
            let path = root.join(&name);
            match fs::create_dir(&path) {
                Ok(()) => {
                    debug!("Created backup group {}", path.display());
                    return Ok(Self {
                        name,
                        path,
                        created: now,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    std::thread::sleep(std::time::Duration::from_micros(1));
                }
                Err(e) => return Err(ArtkeepError::io_with_path(e, &path)),
            }
        }
        Err(ArtkeepError::Other(format!(
            "Could not allocate a unique backup group under {}",
            root.display()
        )))
    }

    /// All groups under `root`, oldest first. Directories whose names do
    /// not parse are ignored; a missing root has no groups.
    pub fn list(root: &Path) -> Result<Vec<Self>> {
        let read_dir = match fs::read_dir(root) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ArtkeepError::io_with_path(e, root)),
        };

        let mut groups = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| ArtkeepError::io_with_path(e, root))?;
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if let Some(created) = Self::parse_name(&name) {
                groups.push(Self {
                    name,
                    path: entry.path(),
                    created,
                });
            }
        }
        groups.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.name.cmp(&b.name)));
        Ok(groups)
    }

    pub fn size(&self) -> TreeSize {
        tree_size(&self.path)
    }
}

/// Sum file sizes under `dir`. Unreadable entries are skipped.
pub fn tree_size(dir: &Path) -> TreeSize {
    let mut size = TreeSize::default();
    for entry in WalkDir::new(dir) {
        match entry {
            Ok(e) if e.file_type().is_file() => {
                size.files += 1;
                size.bytes += e.metadata().map(|m| m.len()).unwrap_or(0);
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable entry under {}: {}", dir.display(), e),
        }
    }
    size
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_both_formats() {
        let new = BackupGroup::parse_name("20250314_092653_123456").unwrap();
        assert_eq!(new.format("%H:%M:%S%.6f").to_string(), "09:26:53.123456");
        let legacy = BackupGroup::parse_name("20240105_101500").unwrap();
        assert_eq!(legacy.format("%Y-%m-%d").to_string(), "2024-01-05");
        assert!(BackupGroup::parse_name("operations.json").is_none());
        assert!(BackupGroup::parse_name("notes").is_none());
    }

    #[test]
    fn test_create_is_unique_and_listed() {
        let tmp = TempDir::new().unwrap();
        let a = BackupGroup::create(tmp.path()).unwrap();
        let b = BackupGroup::create(tmp.path()).unwrap();
        assert_ne!(a.name, b.name);

        fs::create_dir(tmp.path().join("not-a-group")).unwrap();
        fs::write(tmp.path().join("operations.json"), "[]").unwrap();

        let groups = BackupGroup::list(tmp.path()).unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups[0].created <= groups[1].created);
    }

    #[test]
    fn test_list_missing_root() {
        let tmp = TempDir::new().unwrap();
        assert!(BackupGroup::list(&tmp.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_tree_size() {
        let tmp = TempDir::new().unwrap();
        let group = BackupGroup::create(tmp.path()).unwrap();
        fs::create_dir_all(group.path.join("70791/posters")).unwrap();
        fs::write(group.path.join("70791/posters/a"), [0u8; 100]).unwrap();
        fs::write(group.path.join("70791/b"), [0u8; 23]).unwrap();
        assert_eq!(group.size(), TreeSize { bytes: 123, files: 2 });
    }
}
