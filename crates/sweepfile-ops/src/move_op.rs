//! Move operation.

use std::fs;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::debug;

use crate::progress::{OperationComplete, OperationProgress, OperationType};
use crate::{OPERATION_CHANNEL_SIZE, OperationError};

/// Result sent through the channel during move operations.
#[derive(Debug)]
pub enum MoveResult {
    /// Progress update.
    Progress(OperationProgress),
    /// The operation completed.
    Complete(OperationComplete),
}

/// Start an async move of one file into `destination`.
///
/// The file keeps its name. On success the completion carries the new path.
pub fn start_move(source: PathBuf, destination: PathBuf) -> mpsc::Receiver<MoveResult> {
    let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);

    tokio::spawn(async move {
        move_impl(source, destination, tx).await;
    });

    rx
}

async fn move_impl(source: PathBuf, destination: PathBuf, tx: mpsc::Sender<MoveResult>) {
    let mut progress = OperationProgress::new(OperationType::Move, 1, 0);
    progress.set_current_file(Some(source.clone()));

    let _ = tx.send(MoveResult::Progress(progress.clone())).await;

    let target = source.clone();
    let result = tokio::task::spawn_blocking(move || move_blocking(&target, &destination))
        .await
        .map_err(|e| format!("Task failed: {e}"))
        .and_then(|r| r);

    let complete = match result {
        Ok((new_path, bytes)) => {
            debug!(from = %source.display(), to = %new_path.display(), "Moved");
            OperationComplete {
                operation_type: OperationType::Move,
                completed: vec![new_path],
                bytes_processed: bytes,
                errors: vec![],
            }
        }
        Err(message) => OperationComplete {
            operation_type: OperationType::Move,
            completed: vec![],
            bytes_processed: 0,
            errors: vec![OperationError::new(source, message)],
        },
    };

    let _ = tx.send(MoveResult::Complete(complete)).await;
}

/// Move the file at `source` into the existing directory `destination`,
/// refusing to replace an existing entry. Returns the new path and the
/// number of bytes moved.
pub fn move_blocking(source: &Path, destination: &Path) -> Result<(PathBuf, u64), String> {
    let metadata = fs::symlink_metadata(source).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => "File not found".to_string(),
        _ => e.to_string(),
    })?;
    if metadata.is_dir() {
        return Err("Not a file".into());
    }
    if !destination.is_dir() {
        return Err(format!("'{}' is not a directory", destination.display()));
    }

    let name = source.file_name().ok_or("Invalid source path")?;
    let new_path = destination.join(name);

    if new_path == source {
        return Ok((new_path, metadata.len()));
    }

    if new_path.symlink_metadata().is_ok() {
        return Err(format!(
            "'{}' already exists in destination",
            name.to_string_lossy()
        ));
    }

    // Try rename first (fast path for same filesystem)
    if fs::rename(source, &new_path).is_ok() {
        return Ok((new_path, metadata.len()));
    }

    // Fall back to copy + delete for cross-filesystem moves
    fs::copy(source, &new_path).map_err(|e| format!("Failed to copy: {e}"))?;
    if let Err(e) = fs::remove_file(source) {
        let _ = fs::remove_file(&new_path);
        return Err(format!("Failed to remove source: {e}"));
    }

    Ok((new_path, metadata.len()))
}
