//! End-to-end artwork lifecycle: scan, delete, undo, retention.

use artkeep_core::config::RetentionConfig;
use artkeep_core::{ArtkeepApi, ArtkeepError, ItemType, OperationAction, StaticProvider};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

struct Env {
    tmp: TempDir,
    provider: Arc<StaticProvider>,
    api: ArtkeepApi,
}

impl Env {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(StaticProvider::new());
        let api = ArtkeepApi::builder(tmp.path().join("data"))
            .provider(provider.clone())
            .auto_create_dirs(true)
            .build()
            .unwrap();
        Self { tmp, provider, api }
    }

    fn bundle(&self, name: &str) -> PathBuf {
        self.tmp.path().join("Metadata").join(name)
    }

    fn add_item(&self, library: &str, key: &str, title: &str, item_type: ItemType) -> PathBuf {
        let bundle = self.bundle(&format!("{}.bundle", key));
        fs::create_dir_all(&bundle).unwrap();
        self.provider.insert(library, key, title, item_type, &bundle);
        bundle
    }
}

fn upload(bundle: &Path, rel: &str, bytes: &[u8]) -> PathBuf {
    let path = bundle.join("Uploads").join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, bytes).unwrap();
    path
}

fn patterned(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

#[tokio::test]
async fn test_delete_all_backs_up_every_file() {
    let env = Env::new();
    let bundle = env.add_item("TV Shows", "70791", "Severance", ItemType::Show);
    let a_bytes = patterned(500_000, 1);
    let b_bytes = patterned(300_000, 2);
    let a = upload(&bundle, "posters/4f2c9e1b7d", &a_bytes);
    let b = upload(&bundle, "art/com.plexapp.agents.localmedia_77", &b_bytes);

    let batch = env
        .api
        .delete(&["70791/all/all".to_string()], "test")
        .await
        .unwrap();

    let result = &batch.results[0];
    assert!(result.success);
    assert_eq!(result.deleted_count, 2);
    assert_eq!(result.bytes_freed, 800_000);
    assert_eq!(batch.bytes_freed, 800_000);
    assert_eq!(result.operation_ids.len(), 2);
    assert_eq!(env.api.operations(10).len(), 2);
    assert!(!a.exists() && !b.exists());

    let group = env.api.backup_root().join(batch.backup_group.as_ref().unwrap());
    let backed_up = files_under(&group);
    assert_eq!(backed_up.len(), 2);
    assert_eq!(fs::read(group.join("70791/posters/4f2c9e1b7d")).unwrap(), a_bytes);
    assert_eq!(
        fs::read(group.join("70791/art/com.plexapp.agents.localmedia_77")).unwrap(),
        b_bytes
    );
}

#[tokio::test]
async fn test_undo_restores_identical_bytes_once() {
    let env = Env::new();
    let bundle = env.add_item("TV Shows", "70791", "Severance", ItemType::Show);
    let a_bytes = patterned(500_000, 9);
    let a = upload(&bundle, "posters/4f2c9e1b7d", &a_bytes);
    upload(&bundle, "art/b", &patterned(300_000, 3));

    let batch = env
        .api
        .delete(&["70791/all/all".to_string()], "test")
        .await
        .unwrap();
    let id_for_a = env
        .api
        .operations(10)
        .into_iter()
        .find(|e| e.original_path == a)
        .map(|e| e.id)
        .unwrap();
    assert!(batch.operation_ids().any(|id| id == id_for_a));

    let undo = env.api.undo(id_for_a).await.unwrap();
    assert!(undo.success);
    assert_eq!(undo.restored_path.as_deref(), Some(a.as_path()));
    assert_eq!(fs::read(&a).unwrap(), a_bytes);
    assert!(!env.api.operation(id_for_a).unwrap().can_undo);

    let latest = &env.api.operations(1)[0];
    assert_eq!(latest.action, OperationAction::Undo);
    assert_eq!(latest.undo_of, Some(id_for_a));

    let again = env.api.undo(id_for_a).await.unwrap();
    assert!(!again.success);
    assert!(again.restored_path.is_none());
    assert_eq!(fs::read(&a).unwrap(), a_bytes);
}

#[tokio::test]
async fn test_clean_backups_zero_days_then_idempotent() {
    let env = Env::new();
    let bundle = env.add_item("Movies", "42", "Arrival", ItemType::Movie);
    upload(&bundle, "posters/p", &patterned(1234, 0));
    upload(&bundle, "backgrounds/bg", &patterned(4321, 0));

    let batch = env.api.delete(&["42/all/all".to_string()], "test").await.unwrap();
    let group_name = batch.backup_group.clone().unwrap();
    let info = env.api.backup_info().unwrap();
    assert_eq!(info.group_count, 1);
    assert_eq!(info.total_size_bytes, 5555);

    // Groups are named to the microsecond; make sure "now" has moved past it.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let report = env.api.clean_backups(0).await.unwrap();
    assert_eq!(report.removed, vec![group_name]);
    assert_eq!(report.bytes_freed, info.total_size_bytes);
    assert!(env.api.operations(10).iter().all(|e| !e.can_undo));

    let again = env.api.clean_backups(0).await.unwrap();
    assert_eq!((again.removed_count, again.bytes_freed), (0, 0));
}

#[tokio::test]
async fn test_scan_large_library_window() {
    let env = Env::new();
    let with_art: Vec<usize> = (0..57).map(|i| i * 39 + 3).collect();
    assert!(with_art.iter().all(|&i| i < 2262));

    for i in 0..2262usize {
        let key = (100_000 + i).to_string();
        if with_art.contains(&i) {
            let bundle = env.add_item("TV Shows", &key, &format!("Show {}", i), ItemType::Show);
            upload(&bundle, "posters/custom", b"\xFF\xD8\xFF\xE0");
            if i % 2 == 0 {
                upload(&bundle, "posters/seasons/1/s1", b"\xFF\xD8\xFF\xE0");
            }
        } else {
            // Items whose bundle never got uploads have no directory at all.
            env.provider.insert(
                "TV Shows",
                key.clone(),
                format!("Show {}", i),
                ItemType::Show,
                env.bundle(&format!("{}.bundle", key)),
            );
        }
    }

    let scan = env.api.scan("TV Shows", Some(100), 0).await.unwrap();
    assert!(scan.items.len() <= 100);
    assert_eq!(scan.items.len(), with_art.iter().filter(|&&i| i < 100).count());
    assert!(scan.items.iter().all(|item| item.artwork_count >= 1));
    assert_eq!(scan.stats.total_count, 2262);

    let again = env.api.scan("TV Shows", Some(100), 0).await.unwrap();
    assert_eq!(again.items, scan.items);
    assert_eq!(again.stats, scan.stats);

    let full = env.api.scan("TV Shows", None, 0).await.unwrap();
    assert_eq!(full.stats.total_items, 57);
    assert_eq!(full.stats.total_artwork, 57 + with_art.iter().filter(|&&i| i % 2 == 0).count());
    assert!(!env.api.scan_progress().scanning);
}

#[tokio::test]
async fn test_missing_uploads_folder_creates_no_entry() {
    let env = Env::new();
    env.add_item("Movies", "99999", "Nothing Custom", ItemType::Movie);

    let batch = env
        .api
        .delete(&["99999/all/all".to_string()], "test")
        .await
        .unwrap();

    assert!(!batch.success);
    let result = &batch.results[0];
    assert!(!result.success);
    assert_eq!(result.deleted_count, 0);
    assert_eq!(result.message.as_deref(), Some("No Uploads folder found"));
    assert!(env.api.operations(10).is_empty());
    assert!(env.api.backup_info().unwrap().group_count == 0);
}

#[tokio::test]
async fn test_journal_survives_restart() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(StaticProvider::new());
    let bundle = tmp.path().join("m.bundle");
    provider.insert("Movies", "7", "Heat", ItemType::Movie, &bundle);
    upload(&bundle, "posters/one", b"1");
    upload(&bundle, "posters/two", b"2");

    let build = || {
        ArtkeepApi::builder(tmp.path().join("data"))
            .provider(provider.clone())
            .auto_create_dirs(true)
            .build()
    };

    let api = build().unwrap();
    assert!(matches!(build(), Err(ArtkeepError::JournalLocked { .. })));
    let first = api.delete(&["7/posters/0".to_string()], "r").await.unwrap();
    let first_id = first.operation_ids().next().unwrap();
    drop(api);

    let api = build().unwrap();
    let second = api.delete(&["7/posters/0".to_string()], "r").await.unwrap();
    let second_id = second.operation_ids().next().unwrap();
    assert!(second_id > first_id);
    assert!(api.undo(first_id).await.unwrap().success);
}

#[tokio::test]
async fn test_themes_policy() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(StaticProvider::new());
    let bundle = tmp.path().join("s.bundle");
    provider.insert("TV Shows", "5", "Show", ItemType::Show, &bundle);
    let theme = upload(&bundle, "themes/t", b"ID3\x03");
    upload(&bundle, "posters/p", b"\xFF\xD8\xFF");

    let api = ArtkeepApi::builder(tmp.path().join("data"))
        .provider(provider)
        .include_themes(false)
        .auto_create_dirs(true)
        .build()
        .unwrap();

    let rejected = api.delete(&["5/themes/all".to_string()], "r").await.unwrap();
    assert!(rejected.results[0].error.is_some());

    let all = api.delete(&["5/all/all".to_string()], "r").await.unwrap();
    assert_eq!(all.results[0].deleted_count, 1);
    assert!(theme.exists());
}

#[test]
fn test_group_name_format_is_sortable() {
    let a = chrono::NaiveDate::from_ymd_opt(2025, 1, 2)
        .unwrap()
        .and_hms_micro_opt(3, 4, 5, 6)
        .unwrap();
    let b = a + chrono::TimeDelta::microseconds(1);
    let fa = a.format(RetentionConfig::GROUP_NAME_FORMAT).to_string();
    let fb = b.format(RetentionConfig::GROUP_NAME_FORMAT).to_string();
    assert_eq!(fa, "20250102_030405_000006");
    assert!(fa < fb);
}
