use std::fs;
use std::path::PathBuf;

use sweepfile_ops::{
    DeleteOptions, DeleteResult, MoveResult, OperationComplete, RenameResult, start_deletion,
    start_move, start_rename,
};
use tempfile::TempDir;

async fn finish_delete(items: Vec<(PathBuf, u64)>) -> (OperationComplete, usize) {
    let mut rx = start_deletion(items, DeleteOptions::default());
    let mut updates = 0;
    while let Some(result) = rx.recv().await {
        match result {
            DeleteResult::Progress(_) => updates += 1,
            DeleteResult::Complete(complete) => return (complete, updates),
        }
    }
    panic!("deletion ended without completion");
}

#[tokio::test]
async fn test_partial_failure_reports_only_deleted_paths() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("a.bin");
    let b = temp.path().join("b.bin");
    fs::write(&a, vec![0u8; 100]).unwrap();

    let (complete, updates) = finish_delete(vec![(a.clone(), 100), (b.clone(), 200)]).await;

    assert_eq!(updates, 2);
    assert_eq!(complete.completed, vec![a.clone()]);
    assert_eq!(complete.bytes_processed, 100);
    assert_eq!(complete.failed(), 1);
    assert_eq!(complete.errors[0].path, b);
    assert!(!a.exists());
}

#[tokio::test]
async fn test_path_replaced_by_directory_is_not_deleted() {
    let temp = TempDir::new().unwrap();
    let report = temp.path().join("report.pdf");
    fs::create_dir(&report).unwrap();
    fs::write(report.join("precious.txt"), vec![7u8; 5000]).unwrap();

    let (complete, _) = finish_delete(vec![(report.clone(), 10)]).await;

    assert!(complete.completed.is_empty());
    assert_eq!(complete.bytes_processed, 0);
    assert_eq!(complete.failed(), 1);
    assert_eq!(complete.errors[0].message, "Not a file");
    assert!(report.join("precious.txt").exists());
}

#[tokio::test]
async fn test_empty_batch_completes() {
    let (complete, updates) = finish_delete(Vec::new()).await;
    assert_eq!(updates, 0);
    assert!(complete.is_success());
    assert_eq!(complete.succeeded(), 0);
}

#[tokio::test]
async fn test_rename_reports_new_path() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("old.jpg");
    fs::write(&source, b"img").unwrap();

    let mut rx = start_rename(source.clone(), "new.jpg".to_string());
    let mut complete = None;
    while let Some(result) = rx.recv().await {
        if let RenameResult::Complete(c) = result {
            complete = Some(c);
        }
    }

    let complete = complete.unwrap();
    assert!(complete.is_success());
    assert_eq!(complete.completed, vec![temp.path().join("new.jpg")]);
    assert!(!source.exists());
}

#[tokio::test]
async fn test_rename_rejects_invalid_name() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("old.jpg");
    fs::write(&source, b"img").unwrap();

    let mut rx = start_rename(source.clone(), "../escape.jpg".to_string());
    let mut complete = None;
    while let Some(result) = rx.recv().await {
        if let RenameResult::Complete(c) = result {
            complete = Some(c);
        }
    }

    let complete = complete.unwrap();
    assert_eq!(complete.failed(), 1);
    assert!(source.exists());
}

#[tokio::test]
async fn test_move_reports_new_path() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("song.mp3");
    let music = temp.path().join("Music");
    fs::write(&source, vec![9u8; 64]).unwrap();
    fs::create_dir(&music).unwrap();

    let mut rx = start_move(source.clone(), music.clone());
    let mut complete = None;
    while let Some(result) = rx.recv().await {
        if let MoveResult::Complete(c) = result {
            complete = Some(c);
        }
    }

    let complete = complete.unwrap();
    assert!(complete.is_success());
    assert_eq!(complete.completed, vec![music.join("song.mp3")]);
    assert_eq!(complete.bytes_processed, 64);
    assert!(!source.exists());
}
