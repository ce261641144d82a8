//! Atomic file operations for safe persistence.
//!
//! Implements atomic writes using:
//! 1. Write to temp file with unique PID+TID suffix
//! 2. fsync to ensure data reaches disk
//! 3. Atomic rename to target path
//!
//! The same temp-then-rename sequence backs [`durable_copy`], which is used
//! for artwork backups and restores.

use crate::config::PathsConfig;
use crate::{ArtkeepError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use tracing::{debug, warn};

/// Read and parse a JSON file.
///
/// Returns `None` if the file doesn't exist, or an error if parsing fails.
pub fn atomic_read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let mut file = File::open(path).map_err(|e| ArtkeepError::Io {
        message: format!("Failed to open {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| ArtkeepError::Io {
            message: format!("Failed to read {}", path.display()),
            path: Some(path.to_path_buf()),
            source: Some(e),
        })?;

    let data: T = serde_json::from_str(&contents).map_err(|e| ArtkeepError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    Ok(Some(data))
}

/// Write data to a JSON file atomically.
///
/// Serializes with pretty printing, writes to a temp sibling, fsyncs, and
/// renames over the target. Readers never observe a half-written file.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    ensure_parent(path)?;

    let serialized = serde_json::to_string_pretty(data).map_err(|e| ArtkeepError::Json {
        message: format!("Failed to serialize data: {}", e),
        source: Some(e),
    })?;

    let temp_path = temp_sibling(path);
    write_synced(&temp_path, |file| file.write_all(serialized.as_bytes()))?;
    rename_into_place(&temp_path, path)?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

/// Copy `src` to `dest` so that `dest` either does not exist or holds the
/// complete, fsynced contents of `src`.
///
/// Parent directories of `dest` are created as needed. Returns the number of
/// bytes copied.
pub fn durable_copy(src: &Path, dest: &Path) -> Result<u64> {
    ensure_parent(dest)?;

    let mut source = File::open(src).map_err(|e| ArtkeepError::io_with_path(e, src))?;
    let temp_path = temp_sibling(dest);

    let mut copied = 0u64;
    write_synced(&temp_path, |file| {
        copied = io::copy(&mut source, file)?;
        Ok(())
    })?;
    rename_into_place(&temp_path, dest)?;
    sync_dir(dest.parent());

    debug!("Copied {} bytes {} -> {}", copied, src.display(), dest.display());
    Ok(copied)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| ArtkeepError::Io {
                message: format!("Failed to create directory {}", parent.display()),
                path: Some(parent.to_path_buf()),
                source: Some(e),
            })?;
        }
    }
    Ok(())
}

/// Create `temp_path`, run `fill`, then flush and fsync. The temp file is
/// removed again if anything fails.
fn write_synced(temp_path: &Path, fill: impl FnOnce(&mut File) -> io::Result<()>) -> Result<()> {
    let result = (|| -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)?;
        fill(&mut file)?;
        file.flush()?;
        file.sync_all()
    })();

    result.map_err(|e| {
        let _ = fs::remove_file(temp_path);
        ArtkeepError::Io {
            message: format!("Failed to write temp file {}", temp_path.display()),
            path: Some(temp_path.to_path_buf()),
            source: Some(e),
        }
    })
}

fn rename_into_place(temp_path: &Path, path: &Path) -> Result<()> {
    fs::rename(temp_path, path).map_err(|e| {
        let _ = fs::remove_file(temp_path);
        ArtkeepError::Io {
            message: format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            ),
            path: Some(path.to_path_buf()),
            source: Some(e),
        }
    })
}

/// Persist a rename by syncing the containing directory. Not supported on
/// every platform, so failures are only logged.
fn sync_dir(dir: Option<&Path>) {
    #[cfg(unix)]
    if let Some(dir) = dir {
        if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
            warn!("Failed to sync directory {}: {}", dir.display(), e);
        }
    }
    #[cfg(not(unix))]
    let _ = dir;
}

/// Temp file next to `path` with a unique PID+TID suffix.
fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(
        ".{}.{}.{}{}",
        file_name,
        process::id(),
        thread_id(),
        PathsConfig::TEMP_SUFFIX
    ))
}

/// Get a unique thread identifier.
fn thread_id() -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    format!("{:?}", thread::current().id()).hash(&mut hasher);
    hasher.finish()
}
