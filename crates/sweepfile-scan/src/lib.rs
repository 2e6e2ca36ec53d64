//! Filesystem walker for sweepfile.
//!
//! This crate visits a directory subtree exactly once and produces a
//! [`ScanSnapshot`]: the flat, classified file inventory and the directory
//! tree with bottom-up aggregated totals.
//!
//! # Overview
//!
//! - **Explicit work-list** traversal, so stack use does not grow with
//!   filesystem depth
//! - **Skip set** of root-relative system/cache directories, plus hidden
//!   (dot-prefixed) directories
//! - **Cooperative cancellation** via [`CancellationToken`], checked once per
//!   directory
//! - **Progress callbacks** every N files
//! - **Per-directory recovery**: unreadable directories become empty leaves
//!
//! # Example
//!
//! ```rust,no_run
//! use sweepfile_scan::{CancellationToken, ScanConfig, TreeWalker};
//!
//! let config = ScanConfig::new("/storage/emulated/0");
//! let cancel = CancellationToken::new();
//! let output = TreeWalker::new()
//!     .walk(&config, &cancel, |p| eprintln!("{} files", p.files_scanned))
//!     .unwrap();
//!
//! println!("Total size: {} bytes", output.snapshot.tree.total_size);
//! println!("Total files: {}", output.snapshot.file_count());
//! ```

mod progress;
mod walker;

pub use progress::ScanProgress;
pub use walker::{TreeWalker, WalkOutput};

pub use tokio_util::sync::CancellationToken;

// Re-export core types for convenience
pub use sweepfile_core::{
    DirectoryNode, FileRecord, ScanConfig, ScanError, ScanSnapshot, ScanWarning, WarningKind,
};
