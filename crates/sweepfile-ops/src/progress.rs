//! Progress reporting types for file operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::OperationError;

/// The type of operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    Delete,
    Rename,
    Move,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delete => write!(f, "Delete"),
            Self::Rename => write!(f, "Rename"),
            Self::Move => write!(f, "Move"),
        }
    }
}

/// Progress information for an ongoing operation.
#[derive(Debug, Clone)]
pub struct OperationProgress {
    /// The type of operation.
    pub operation_type: OperationType,
    /// Number of items attempted so far.
    pub files_completed: usize,
    /// Total number of items to process.
    pub files_total: usize,
    /// Bytes freed or moved by successful items.
    pub bytes_processed: u64,
    /// Total bytes to process (may be 0 if unknown).
    pub bytes_total: u64,
    /// The file currently being processed.
    pub current_file: Option<PathBuf>,
    /// Errors encountered so far.
    pub errors: Vec<OperationError>,
}

impl OperationProgress {
    /// Create a new progress tracker for an operation.
    pub fn new(operation_type: OperationType, files_total: usize, bytes_total: u64) -> Self {
        Self {
            operation_type,
            files_completed: 0,
            files_total,
            bytes_processed: 0,
            bytes_total,
            current_file: None,
            errors: Vec::new(),
        }
    }

    /// Add an error to the progress.
    pub fn add_error(&mut self, error: OperationError) {
        self.files_completed += 1;
        self.errors.push(error);
    }

    /// Update the current file being processed.
    pub fn set_current_file(&mut self, path: Option<PathBuf>) {
        self.current_file = path;
    }

    /// Increment the completed count and add bytes.
    pub fn complete_file(&mut self, bytes: u64) {
        self.files_completed += 1;
        self.bytes_processed += bytes;
    }
}

/// Result of a completed operation.
#[derive(Debug, Clone)]
pub struct OperationComplete {
    /// The type of operation.
    pub operation_type: OperationType,
    /// Paths produced by successful items: deleted paths, or the new path of
    /// a rename or move.
    pub completed: Vec<PathBuf>,
    /// Bytes freed by successful items.
    pub bytes_processed: u64,
    /// One entry per failed item.
    pub errors: Vec<OperationError>,
}

impl OperationComplete {
    /// Number of items successfully processed.
    pub fn succeeded(&self) -> usize {
        self.completed.len()
    }

    /// Number of items that failed.
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    /// Check if the operation was fully successful.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let complete = OperationComplete {
            operation_type: OperationType::Delete,
            completed: vec![PathBuf::from("/a")],
            bytes_processed: 100,
            errors: vec![OperationError::new(PathBuf::from("/b"), "gone")],
        };
        assert!(!complete.is_success());
        assert_eq!(complete.succeeded(), 1);
        assert_eq!(complete.failed(), 1);
    }

    #[test]
    fn test_failed_item_counts_as_attempted() {
        let mut progress = OperationProgress::new(OperationType::Delete, 4, 0);
        progress.complete_file(10);
        progress.add_error(OperationError::new(PathBuf::from("/x"), "denied"));
        assert_eq!(progress.files_completed, 2);
        assert_eq!(progress.bytes_processed, 10);
    }
}
