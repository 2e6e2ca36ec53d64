//! Delete operation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::progress::{OperationComplete, OperationProgress, OperationType};
use crate::{OPERATION_CHANNEL_SIZE, OperationError};

/// Options for delete operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteOptions {
    /// Move files to the system trash instead of unlinking them.
    pub use_trash: bool,
}

/// Result sent through the channel during delete operations.
#[derive(Debug)]
pub enum DeleteResult {
    /// Progress update.
    Progress(OperationProgress),
    /// The operation completed.
    Complete(OperationComplete),
}

/// Start background deletion of `(path, size)` items.
///
/// Each item is attempted independently; a failure never stops the batch.
/// The final [`DeleteResult::Complete`] lists exactly the paths that were
/// removed and counts only their sizes as freed.
pub fn start_deletion(
    items: Vec<(PathBuf, u64)>,
    options: DeleteOptions,
) -> mpsc::Receiver<DeleteResult> {
    let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);

    tokio::spawn(async move {
        delete_impl(items, options, tx).await;
    });

    rx
}

async fn delete_impl(
    items: Vec<(PathBuf, u64)>,
    options: DeleteOptions,
    tx: mpsc::Sender<DeleteResult>,
) {
    let bytes_total = items.iter().map(|(_, size)| size).sum();
    let mut progress = OperationProgress::new(OperationType::Delete, items.len(), bytes_total);
    let mut completed = Vec::new();

    for (path, size) in items {
        progress.set_current_file(Some(path.clone()));
        let _ = tx.send(DeleteResult::Progress(progress.clone())).await;

        // Perform deletion in blocking task to not block the async runtime
        let target = path.clone();
        let result = tokio::task::spawn_blocking(move || remove_path(&target, options.use_trash))
            .await
            .map_err(|e| format!("Task failed: {e}"))
            .and_then(|r| r);

        match result {
            Ok(()) => {
                debug!(path = %path.display(), size, "Deleted");
                progress.complete_file(size);
                completed.push(path);
            }
            Err(message) => {
                warn!(path = %path.display(), %message, "Delete failed");
                progress.add_error(OperationError::new(path, message));
            }
        }
    }

    let _ = tx
        .send(DeleteResult::Complete(OperationComplete {
            operation_type: OperationType::Delete,
            completed,
            bytes_processed: progress.bytes_processed,
            errors: progress.errors,
        }))
        .await;
}

/// Remove one file, either permanently or into the trash.
///
/// Only files are ever removed: a path that has become a directory since
/// it was scanned is refused for both backends.
fn remove_path(path: &Path, use_trash: bool) -> Result<(), String> {
    // A missing path is a failure for both backends.
    let metadata = fs::symlink_metadata(path).map_err(|e| describe(&e))?;
    if metadata.is_dir() {
        return Err("Not a file".to_string());
    }

    if use_trash {
        return trash::delete(path).map_err(|e| format!("Trash failed: {e}"));
    }

    fs::remove_file(path).map_err(|e| describe(&e))
}

fn describe(error: &io::Error) -> String {
    match error.kind() {
        io::ErrorKind::NotFound => "File not found".to_string(),
        io::ErrorKind::PermissionDenied => "Permission denied".to_string(),
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_missing_path() {
        let temp = TempDir::new().unwrap();
        let err = remove_path(&temp.path().join("nope"), false).unwrap_err();
        assert_eq!(err, "File not found");
    }

    #[test]
    fn test_remove_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.txt");
        fs::write(&path, b"abc").unwrap();
        remove_path(&path, false).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_directory_is_refused() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("photos");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("keep.jpg"), b"x").unwrap();

        assert_eq!(remove_path(&dir, false).unwrap_err(), "Not a file");
        assert_eq!(remove_path(&dir, true).unwrap_err(), "Not a file");
        assert!(dir.join("keep.jpg").exists());
    }
}
