//! Analysis algorithms for sweepfile.
//!
//! Every analysis here is a pure function of a scanned inventory:
//!
//! - **Duplicate detection** - Partition files into groups with identical
//!   content using BLAKE3 hashing
//! - **Junk detection** - Flag temporary, cache and empty files
//! - **Large files** - Filter by a size threshold
//! - **Categories** - Group files by content category
//!
//! # Duplicate Detection
//!
//! Uses a three-phase algorithm for efficiency:
//!
//! 1. Group files by size (instant)
//! 2. Compute partial hash (first + last 4KB) for size-matched files
//! 3. Compute full BLAKE3 hash for partial-hash matches
//!
//! ```rust,ignore
//! use sweepfile_analyze::{DuplicateFinder, select_all_except_newest};
//! use sweepfile_scan::{CancellationToken, ScanConfig, TreeWalker};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let output = TreeWalker::new().walk(&config, &CancellationToken::new(), |_| {})?;
//!
//! let report = DuplicateFinder::new().find_duplicates(&output.snapshot.inventory);
//! println!("Found {} duplicate groups", report.group_count);
//! println!("Wasted space: {} bytes", report.total_wasted_space);
//!
//! let deletable = select_all_except_newest(&report.records());
//! ```

mod categories;
mod duplicates;
mod error;
mod junk;
mod large;

pub use categories::{CategoryMap, CategorySummary, group_by_category, summarize};
pub use duplicates::{
    DuplicateConfig, DuplicateConfigBuilder, DuplicateFinder, DuplicateGroup, DuplicateReport,
    select_all_except_newest,
};
pub use error::AnalyzeError;
pub use junk::{
    DEFAULT_CACHE_DIRS, DEFAULT_JUNK_PATTERNS, JunkConfig, JunkConfigBuilder, JunkFinder,
    JunkReason,
};
pub use large::{DEFAULT_LARGE_FILE_THRESHOLD, find_large_files};

// Re-export core types
pub use sweepfile_core::{Category, ContentHash, FileRecord};
