use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use sweepfile_scan::{CancellationToken, ScanConfig, ScanError, TreeWalker, WarningKind};
use tempfile::TempDir;

/// Layout resembling shared storage, including directories that must be skipped.
fn create_storage() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    for dir in [
        "DCIM/Camera",
        "Download",
        "Android/data/com.app",
        "Android/database",
        "Music/.hidden",
        ".thumbnails",
        "lost+found",
    ] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }

    fs::write(root.join("DCIM/Camera/IMG_1.jpg"), vec![0u8; 300]).unwrap();
    fs::write(root.join("DCIM/Camera/IMG_2.jpg"), vec![1u8; 200]).unwrap();
    fs::write(root.join("Download/setup.bin"), vec![2u8; 50]).unwrap();
    fs::write(root.join("Android/data/com.app/cache.db"), vec![3u8; 999]).unwrap();
    fs::write(root.join("Android/database/keep.db"), vec![4u8; 10]).unwrap();
    fs::write(root.join("Music/.hidden/secret.mp3"), vec![5u8; 77]).unwrap();
    fs::write(root.join("Music/.nomedia"), b"").unwrap();
    fs::write(root.join(".thumbnails/t.jpg"), vec![6u8; 11]).unwrap();
    fs::write(root.join("lost+found/orphan"), vec![7u8; 12]).unwrap();
    fs::write(root.join("readme.txt"), b"hi").unwrap();

    temp
}

fn relative_names(root: &Path, paths: impl Iterator<Item = PathBuf>) -> HashSet<String> {
    let root = root.canonicalize().unwrap();
    paths
        .map(|p| p.strip_prefix(&root).unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_inventory_excludes_skipped_and_hidden_directories() {
    let temp = create_storage();
    let output = TreeWalker::new()
        .walk(&ScanConfig::new(temp.path()), &CancellationToken::new(), |_| {})
        .unwrap();

    let found = relative_names(
        temp.path(),
        output.snapshot.inventory.iter().map(|f| f.path.clone()),
    );
    let expected: HashSet<String> = [
        "DCIM/Camera/IMG_1.jpg",
        "DCIM/Camera/IMG_2.jpg",
        "Download/setup.bin",
        "Android/database/keep.db",
        // Hidden files are kept; only hidden directories are skipped.
        "Music/.nomedia",
        "readme.txt",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(found, expected);

    let dirs = relative_names(
        temp.path(),
        output.snapshot.tree.iter().skip(1).map(|n| n.path.clone()),
    );
    assert!(!dirs.contains("Android/data"));
    assert!(!dirs.contains("Music/.hidden"));
    assert!(!dirs.contains(".thumbnails"));
    assert!(!dirs.contains("lost+found"));
    assert!(dirs.contains("Android"));
}

#[test]
fn test_tree_matches_inventory_and_invariant() {
    let temp = create_storage();
    let output = TreeWalker::new()
        .walk(&ScanConfig::new(temp.path()), &CancellationToken::new(), |_| {})
        .unwrap();
    let snapshot = output.snapshot;

    assert!(snapshot.tree.aggregates_consistent());
    assert_eq!(snapshot.tree.total_size, snapshot.total_size());
    assert_eq!(snapshot.tree.total_file_count, snapshot.file_count() as u64);

    let tree_paths: HashSet<_> = snapshot.tree.all_files().map(|f| f.path.clone()).collect();
    let inventory_paths: HashSet<_> = snapshot.inventory.iter().map(|f| f.path.clone()).collect();
    assert_eq!(tree_paths, inventory_paths);

    let camera = snapshot
        .tree
        .iter()
        .find(|n| n.name.as_str() == "Camera")
        .unwrap();
    assert_eq!(camera.depth, 2);
    assert_eq!(camera.total_size, 500);
}

#[test]
fn test_categories_assigned_during_walk() {
    let temp = create_storage();
    let output = TreeWalker::new()
        .walk(&ScanConfig::new(temp.path()), &CancellationToken::new(), |_| {})
        .unwrap();

    let setup = output
        .snapshot
        .inventory
        .iter()
        .find(|f| f.name.as_str() == "setup.bin")
        .unwrap();
    assert_eq!(setup.category, sweepfile_core::Category::Download);
}

#[test]
fn test_progress_is_periodic_and_increasing() {
    let temp = TempDir::new().unwrap();
    for i in 0..25 {
        fs::write(temp.path().join(format!("f{i}.dat")), b"x").unwrap();
    }

    let config = ScanConfig::builder()
        .root(temp.path())
        .progress_interval(10u64)
        .build()
        .unwrap();

    let mut reports = Vec::new();
    TreeWalker::new()
        .walk(&config, &CancellationToken::new(), |p| reports.push(p.files_scanned))
        .unwrap();

    // Every tenth file, then a final report.
    assert_eq!(reports, vec![10, 20, 25]);
}

#[test]
fn test_cancellation_mid_walk_yields_no_snapshot() {
    let temp = TempDir::new().unwrap();
    for d in 0..5 {
        let dir = temp.path().join(format!("d{d}"));
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("a.txt"), b"a").unwrap();
        fs::write(dir.join("b.txt"), b"b").unwrap();
    }

    let config = ScanConfig::builder()
        .root(temp.path())
        .progress_interval(1u64)
        .build()
        .unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let result = TreeWalker::new().walk(&config, &cancel, |_| trigger.cancel());
    assert!(matches!(result, Err(ScanError::Cancelled)));
}

#[cfg(unix)]
#[test]
fn test_symlink_cycle_is_not_followed() {
    let temp = TempDir::new().unwrap();
    let inner = temp.path().join("inner");
    fs::create_dir(&inner).unwrap();
    fs::write(inner.join("data.bin"), vec![0u8; 8]).unwrap();
    std::os::unix::fs::symlink(temp.path(), inner.join("loop")).unwrap();

    let output = TreeWalker::new()
        .walk(&ScanConfig::new(temp.path()), &CancellationToken::new(), |_| {})
        .unwrap();

    assert_eq!(output.snapshot.file_count(), 1);
    assert!(
        output
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::SkippedSymlink)
    );
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_becomes_empty_leaf() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let locked = temp.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("hidden.txt"), b"secret").unwrap();
    fs::write(temp.path().join("open.txt"), b"ok").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can still list the directory; nothing to check then.
    let listable = fs::read_dir(&locked).is_ok();

    let output = TreeWalker::new()
        .walk(&ScanConfig::new(temp.path()), &CancellationToken::new(), |_| {})
        .unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    if listable {
        return;
    }

    assert_eq!(output.snapshot.file_count(), 1);
    let leaf = output
        .snapshot
        .tree
        .iter()
        .find(|n| n.name.as_str() == "locked")
        .unwrap();
    assert_eq!(leaf.total_file_count, 0);
    assert!(leaf.children.is_empty());
    assert!(
        output
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::PermissionDenied)
    );
}

#[cfg(unix)]
#[test]
fn test_special_files_are_not_inventoried() {
    use std::os::unix::net::UnixListener;

    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), b"abc").unwrap();
    let _listener = UnixListener::bind(temp.path().join("app.sock")).unwrap();

    let output = TreeWalker::new()
        .walk(&ScanConfig::new(temp.path()), &CancellationToken::new(), |_| {})
        .unwrap();

    assert_eq!(output.snapshot.file_count(), 1);
    assert_eq!(output.snapshot.inventory[0].name.as_str(), "a.txt");
    assert_eq!(output.snapshot.tree.total_size, 3);
    assert!(output.warnings.is_empty());
}
