use std::collections::HashSet;
use std::path::{Path, PathBuf};

use strum::IntoEnumIterator;
use sweepfile_core::{
    Category, DirectoryNode, FileRecord, ScanSnapshot, ScanState, StorageStats, TreeBuilder,
    classify,
};

/// Builds /r with files spread across three levels plus an empty branch.
fn build_tree() -> (Vec<FileRecord>, DirectoryNode) {
    let mut builder = TreeBuilder::for_root("/r");
    let root = builder.root();
    let photos = builder.add_directory(root, "/r/photos".into(), "photos".into());
    let trips = builder.add_directory(photos, "/r/photos/trips".into(), "trips".into());
    builder.add_directory(root, "/r/empty".into(), "empty".into());

    let files = vec![
        (root, FileRecord::new("/r/notes.txt", 5, 1)),
        (photos, FileRecord::new("/r/photos/a.jpg", 1_000, 2)),
        (trips, FileRecord::new("/r/photos/trips/b.jpg", 2_000, 3)),
        (trips, FileRecord::new("/r/photos/trips/c.mp4", 4_000, 4)),
    ];

    let mut inventory = Vec::new();
    for (dir, record) in files {
        builder.add_file(dir, record.clone());
        inventory.push(record);
    }
    (inventory, builder.finish())
}

#[test]
fn test_every_node_satisfies_aggregate_invariant() {
    let (_, tree) = build_tree();
    assert!(tree.aggregates_consistent());
    assert_eq!(tree.total_size, 7_005);
    assert_eq!(tree.total_file_count, 4);

    let photos = tree.find(Path::new("/r/photos")).unwrap();
    assert_eq!(photos.total_size, 7_000);
    assert_eq!(photos.own_size(), 1_000);

    let empty = tree.find(Path::new("/r/empty")).unwrap();
    assert_eq!(empty.total_size, 0);
    assert_eq!(empty.total_file_count, 0);
    assert_eq!(empty.depth, 1);
}

#[test]
fn test_tree_files_are_inventory_files() {
    let (inventory, tree) = build_tree();
    let from_tree: HashSet<&PathBuf> = tree.all_files().map(|f| &f.path).collect();
    let from_inventory: HashSet<&PathBuf> = inventory.iter().map(|f| &f.path).collect();
    assert_eq!(from_tree, from_inventory);
    assert_eq!(tree.directory_count(), 4);
}

#[test]
fn test_pruning_updates_every_ancestor() {
    let (inventory, tree) = build_tree();
    let snapshot = ScanSnapshot::new(inventory, tree);
    let removed = HashSet::from([PathBuf::from("/r/photos/trips/c.mp4")]);
    let snapshot = snapshot.without_paths(&removed);

    assert_eq!(snapshot.file_count(), 3);
    assert!(snapshot.tree.aggregates_consistent());
    assert_eq!(snapshot.tree.total_size, 3_005);
    let trips = snapshot.tree.find(Path::new("/r/photos/trips")).unwrap();
    assert_eq!(trips.total_size, 2_000);
    assert_eq!(trips.total_file_count, 1);
    let photos = snapshot.tree.find(Path::new("/r/photos")).unwrap();
    assert_eq!(photos.total_size, 3_000);
}

#[test]
fn test_deep_tree_builds_without_recursion() {
    let mut builder = TreeBuilder::for_root("/deep");
    let mut dir = builder.root();
    let mut path = PathBuf::from("/deep");
    for level in 0..1_000 {
        path.push(format!("d{level}"));
        dir = builder.add_directory(dir, path.clone(), format!("d{level}").into());
    }
    builder.add_file(dir, FileRecord::new(path.join("leaf.bin"), 42, 0));

    let tree = builder.finish();
    assert_eq!(tree.total_size, 42);
    assert_eq!(tree.total_file_count, 1);
    assert_eq!(tree.iter().map(|n| n.depth).max(), Some(1_000));

    let pruned = tree.retain_files(|_| false);
    assert_eq!(pruned.total_size, 0);
    assert_eq!(pruned.directory_count(), 1_001);
}

#[test]
fn test_record_serde_round_trip() {
    let record = FileRecord::new("/sd/Download/thing.apk", 123, 1_700_000_000_000)
        .with_duplicate_group(4);
    let json = serde_json::to_string(&record).unwrap();
    assert!(json.contains("\"category\":\"APK\""));
    let back: FileRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
}

#[test]
fn test_missing_duplicate_group_defaults_to_none() {
    let json = r#"{"path":"/a","name":"a","size":1,"modified_ms":2,"category":"OTHER"}"#;
    let record: FileRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.duplicate_group, None);
}

#[test]
fn test_every_category_has_label() {
    for category in Category::iter() {
        assert!(!category.label().is_empty());
    }
    assert_eq!(classify(Path::new("/x/y.PDF")), Category::Document);
}

#[test]
fn test_scan_state_default_and_stats_default() {
    assert_eq!(ScanState::default(), ScanState::Idle);
    assert_eq!(StorageStats::default().total_size, 0);
}
