use std::fs;
use std::path::Path;

use sweepfile_cache::{CacheLoad, SnapshotCache};
use sweepfile_core::ScanSnapshot;
use sweepfile_scan::{CancellationToken, ScanConfig, TreeWalker};
use tempfile::TempDir;

fn scan(root: &Path) -> ScanSnapshot {
    TreeWalker::new()
        .walk(&ScanConfig::new(root), &CancellationToken::new(), |_| {})
        .unwrap()
        .snapshot
}

fn create_storage() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("a/deep")).unwrap();
    fs::write(root.join("a/b.txt"), vec![0u8; 40]).unwrap();
    fs::write(root.join("a/deep/c.jpg"), vec![1u8; 60]).unwrap();
    fs::write(root.join("top.mp3"), vec![2u8; 5]).unwrap();
    temp
}

#[test]
fn test_round_trip_preserves_records() {
    let storage = create_storage();
    let cache_dir = TempDir::new().unwrap();
    let cache = SnapshotCache::new(cache_dir.path().join("nested/scan_cache.json"));

    let snapshot = scan(storage.path());
    cache.save(&snapshot).unwrap();

    match cache.load() {
        CacheLoad::Loaded {
            snapshot: loaded,
            pruned,
        } => {
            assert_eq!(pruned, 0);
            assert_eq!(loaded.inventory, snapshot.inventory);
            assert_eq!(loaded.tree, snapshot.tree);
        }
        other => panic!("unexpected load result: {other:?}"),
    }
}

#[test]
fn test_missing_cache_is_absent() {
    let cache_dir = TempDir::new().unwrap();
    let cache = SnapshotCache::new(cache_dir.path().join("scan_cache.json"));
    assert!(matches!(cache.load(), CacheLoad::Absent));
}

#[test]
fn test_ghost_entries_are_pruned() {
    let storage = create_storage();
    let cache_dir = TempDir::new().unwrap();
    let cache = SnapshotCache::new(cache_dir.path().join("scan_cache.json"));

    let snapshot = scan(storage.path());
    cache.save(&snapshot).unwrap();

    // Deleted behind the cache's back.
    let ghost = storage.path().canonicalize().unwrap().join("a/b.txt");
    fs::remove_file(&ghost).unwrap();

    let CacheLoad::Loaded {
        snapshot: loaded,
        pruned,
    } = cache.load()
    else {
        panic!("cache should load");
    };

    assert_eq!(pruned, 1);
    assert!(loaded.inventory.iter().all(|f| f.path != ghost));
    assert!(loaded.tree.aggregates_consistent());

    let parent = loaded.tree.find(ghost.parent().unwrap()).unwrap();
    assert!(parent.files.is_empty());
    assert_eq!(parent.total_size, 60);
    assert_eq!(parent.total_file_count, 1);
    assert_eq!(loaded.tree.total_size, 65);
}

#[test]
fn test_corrupt_cache_is_discarded_and_deleted() {
    let cache_dir = TempDir::new().unwrap();
    let path = cache_dir.path().join("scan_cache.json");
    fs::write(&path, b"{ not json").unwrap();

    let cache = SnapshotCache::new(&path);
    assert!(matches!(cache.load(), CacheLoad::Discarded { .. }));
    assert!(!path.exists());

    // Nothing left to discard the second time.
    assert!(matches!(cache.load(), CacheLoad::Absent));
}

#[test]
fn test_version_mismatch_is_discarded() {
    let storage = create_storage();
    let cache_dir = TempDir::new().unwrap();
    let path = cache_dir.path().join("scan_cache.json");
    let cache = SnapshotCache::new(&path);
    cache.save(&scan(storage.path())).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    value["version"] = serde_json::json!(99);
    fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();

    match cache.load() {
        CacheLoad::Discarded { reason } => assert!(reason.contains("version")),
        other => panic!("unexpected load result: {other:?}"),
    }
    assert!(!path.exists());
}

#[test]
fn test_removed_root_is_discarded() {
    let storage = create_storage();
    let cache_dir = TempDir::new().unwrap();
    let cache = SnapshotCache::new(cache_dir.path().join("scan_cache.json"));
    cache.save(&scan(storage.path())).unwrap();

    fs::remove_dir_all(storage.path()).unwrap();
    assert!(matches!(cache.load(), CacheLoad::Discarded { .. }));
}

#[test]
fn test_deep_tree_survives_round_trip() {
    let storage = TempDir::new().unwrap();
    let mut dir = storage.path().to_path_buf();
    for i in 0..200 {
        dir = dir.join(format!("d{i}"));
    }
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("leaf.bin"), vec![0u8; 7]).unwrap();

    let cache_dir = TempDir::new().unwrap();
    let cache = SnapshotCache::new(cache_dir.path().join("scan_cache.json"));
    cache.save(&scan(storage.path())).unwrap();

    let loaded = cache.load().into_snapshot().unwrap();
    assert_eq!(loaded.tree.total_size, 7);
    assert_eq!(loaded.tree.directory_count(), 201);
}

#[test]
fn test_failed_save_leaves_no_temp_file() {
    let storage = create_storage();
    let cache_dir = TempDir::new().unwrap();
    let target = cache_dir.path().join("scan_cache.json");
    // A non-empty directory in the way makes the final rename fail.
    fs::create_dir_all(target.join("blocker")).unwrap();

    let cache = SnapshotCache::new(&target);
    assert!(cache.save(&scan(storage.path())).is_err());

    assert!(!cache_dir.path().join("scan_cache.json.tmp").exists());
    assert!(target.join("blocker").is_dir());
}
