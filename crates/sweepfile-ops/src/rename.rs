//! Rename operation.

use std::fs;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::debug;

use crate::progress::{OperationComplete, OperationProgress, OperationType};
use crate::{OPERATION_CHANNEL_SIZE, OperationError};

/// Result sent through the channel during rename operations.
#[derive(Debug)]
pub enum RenameResult {
    /// Progress update.
    Progress(OperationProgress),
    /// The operation completed.
    Complete(OperationComplete),
}

/// Start an async rename operation.
///
/// Renames a single file within its directory. On success the completion
/// carries the new path.
pub fn start_rename(source: PathBuf, new_name: String) -> mpsc::Receiver<RenameResult> {
    let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);

    tokio::spawn(async move {
        rename_impl(source, new_name, tx).await;
    });

    rx
}

async fn rename_impl(source: PathBuf, new_name: String, tx: mpsc::Sender<RenameResult>) {
    let mut progress = OperationProgress::new(OperationType::Rename, 1, 0);
    progress.set_current_file(Some(source.clone()));

    let _ = tx.send(RenameResult::Progress(progress.clone())).await;

    let target = source.clone();
    let result = tokio::task::spawn_blocking(move || rename_blocking(&target, &new_name))
        .await
        .map_err(|e| format!("Task failed: {e}"))
        .and_then(|r| r);

    let complete = match result {
        Ok(new_path) => {
            debug!(from = %source.display(), to = %new_path.display(), "Renamed");
            OperationComplete {
                operation_type: OperationType::Rename,
                completed: vec![new_path],
                bytes_processed: 0,
                errors: vec![],
            }
        }
        Err(message) => OperationComplete {
            operation_type: OperationType::Rename,
            completed: vec![],
            bytes_processed: 0,
            errors: vec![OperationError::new(source, message)],
        },
    };

    let _ = tx.send(RenameResult::Complete(complete)).await;
}

/// Rename `source` to `new_name` in the same directory, refusing to replace
/// an existing entry.
pub fn rename_blocking(source: &Path, new_name: &str) -> Result<PathBuf, String> {
    validate_filename(new_name)?;

    let parent = source.parent().unwrap_or(Path::new(""));
    let new_path = parent.join(new_name);

    if new_path == source {
        return Ok(new_path);
    }

    if new_path.symlink_metadata().is_ok() {
        return Err(format!("'{new_name}' already exists"));
    }

    fs::rename(source, &new_path).map_err(|e| format!("Rename failed: {e}"))?;
    Ok(new_path)
}

/// Validate a filename for cross-platform compatibility.
pub fn validate_filename(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }

    if name.len() > 255 {
        return Err("Name is too long (max 255 bytes)".into());
    }

    // Check for invalid characters
    let invalid_chars = ['/', '\\', '\0'];
    for c in invalid_chars {
        if name.contains(c) {
            return Err(format!("Name cannot contain '{}'", c.escape_default()));
        }
    }

    #[cfg(target_os = "windows")]
    {
        let windows_invalid = [':', '*', '?', '"', '<', '>', '|'];
        for c in windows_invalid {
            if name.contains(c) {
                return Err(format!("Name cannot contain '{}'", c));
            }
        }
    }

    // Check for . and .. which are reserved
    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }

    if name.starts_with(' ') || name.ends_with(' ') {
        return Err("Name cannot start or end with spaces".into());
    }

    if name.ends_with('.') {
        return Err("Name cannot end with a dot".into());
    }

    Ok(())
}
