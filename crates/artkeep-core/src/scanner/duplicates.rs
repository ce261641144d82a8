//! Duplicate artwork detection by content hash.

use super::library::ScannedItem;
use crate::artwork::ArtworkKind;
use crate::error::{ArtkeepError, Result};
use crate::storage::compute_blake3;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateFile {
    pub rating_key: String,
    pub title: String,
    pub path: PathBuf,
    pub kind: ArtworkKind,
}

/// Files with identical content, in scan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// BLAKE3 of the shared content.
    pub hash: String,
    pub size_bytes: u64,
    pub files: Vec<DuplicateFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateReport {
    pub success: bool,
    pub library: String,
    pub groups: Vec<DuplicateGroup>,
    /// Files beyond the first copy of each group.
    pub duplicate_count: usize,
    pub wasted_bytes: u64,
}

impl DuplicateReport {
    pub fn new(library: &str, groups: Vec<DuplicateGroup>) -> Self {
        let duplicate_count = groups.iter().map(|g| g.files.len() - 1).sum();
        let wasted_bytes = groups
            .iter()
            .map(|g| g.size_bytes * (g.files.len() as u64 - 1))
            .sum();
        Self {
            success: true,
            library: library.to_string(),
            groups,
            duplicate_count,
            wasted_bytes,
        }
    }
}

/// Group the artwork of scanned items by content. Only groups with at least
/// two files are returned, ordered by their first file.
pub async fn find_duplicates(items: Vec<ScannedItem>) -> Result<Vec<DuplicateGroup>> {
    tokio::task::spawn_blocking(move || group_by_content(&items))
        .await
        .map_err(|e| ArtkeepError::Other(format!("Duplicate scan task failed: {}", e)))
}

fn group_by_content(items: &[ScannedItem]) -> Vec<DuplicateGroup> {
    // Files of different sizes cannot match, so only same-size files are hashed.
    let mut by_size: HashMap<u64, Vec<(usize, DuplicateFile)>> = HashMap::new();
    let files = items.iter().flat_map(|item| {
        item.artwork.iter().map(move |file| {
            (
                file.size_bytes,
                DuplicateFile {
                    rating_key: item.rating_key.clone(),
                    title: item.title.clone(),
                    path: file.path.clone(),
                    kind: file.kind,
                },
            )
        })
    });
    for (order, (size, file)) in files.enumerate() {
        by_size.entry(size).or_default().push((order, file));
    }

    let mut groups: Vec<(usize, DuplicateGroup)> = Vec::new();
    for (size, candidates) in by_size.into_iter().filter(|(_, c)| c.len() > 1) {
        let mut by_hash: HashMap<String, Vec<(usize, DuplicateFile)>> = HashMap::new();
        for (order, file) in candidates {
            match compute_blake3(&file.path) {
                Ok(hash) => by_hash.entry(hash).or_default().push((order, file)),
                Err(e) => warn!("Skipping {} in duplicate scan: {}", file.path.display(), e),
            }
        }

        for (hash, mut matched) in by_hash.into_iter().filter(|(_, m)| m.len() > 1) {
            matched.sort_by_key(|(order, _)| *order);
            let first = matched[0].0;
            groups.push((
                first,
                DuplicateGroup {
                    hash,
                    size_bytes: size,
                    files: matched.into_iter().map(|(_, file)| file).collect(),
                },
            ));
        }
    }

    groups.sort_by_key(|(first, _)| *first);
    debug!("Found {} groups of duplicate artwork", groups.len());
    groups.into_iter().map(|(_, group)| group).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::ArtworkFile;
    use crate::provider::ItemType;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn item(dir: &Path, key: &str, files: &[(&str, &[u8])]) -> ScannedItem {
        let artwork: Vec<ArtworkFile> = files
            .iter()
            .map(|(name, bytes)| {
                let path = dir.join(key).join(name);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, bytes).unwrap();
                ArtworkFile {
                    path,
                    kind: ArtworkKind::Poster,
                    size_bytes: bytes.len() as u64,
                    media_type: None,
                    season_index: None,
                }
            })
            .collect();
        ScannedItem {
            rating_key: key.to_string(),
            title: format!("Title {}", key),
            item_type: ItemType::Movie,
            year: None,
            base_dir: dir.join(key),
            artwork_count: artwork.len(),
            total_bytes: artwork.iter().map(|f| f.size_bytes).sum(),
            artwork,
        }
    }

    #[tokio::test]
    async fn test_groups_identical_content_across_items() {
        let tmp = TempDir::new().unwrap();
        let items = vec![
            item(tmp.path(), "1", &[("a", b"same poster"), ("b", b"other bytes")]),
            item(tmp.path(), "2", &[("c", b"same poster"), ("d", b"unique")]),
            item(tmp.path(), "3", &[("e", b"same poster"), ("f", b"other bytes")]),
        ];

        let groups = find_duplicates(items).await.unwrap();
        assert_eq!(groups.len(), 2);

        let keys: Vec<_> = groups[0].files.iter().map(|f| f.rating_key.as_str()).collect();
        assert_eq!(keys, vec!["1", "2", "3"]);
        assert_eq!(groups[0].size_bytes, 11);
        assert_eq!(groups[0].hash, compute_blake3(tmp.path().join("1").join("a")).unwrap());
        assert_eq!(groups[1].files[1].path, tmp.path().join("3").join("f"));

        let report = DuplicateReport::new("Movies", groups);
        assert_eq!(report.duplicate_count, 3);
        assert_eq!(report.wasted_bytes, 2 * 11 + 11);
    }

    #[tokio::test]
    async fn test_same_size_different_content_is_not_a_duplicate() {
        let tmp = TempDir::new().unwrap();
        let items = vec![
            item(tmp.path(), "1", &[("a", b"abcd")]),
            item(tmp.path(), "2", &[("b", b"wxyz")]),
        ];
        assert!(find_duplicates(items).await.unwrap().is_empty());
    }
}
