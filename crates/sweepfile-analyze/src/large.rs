//! Large file filter.

use sweepfile_core::FileRecord;

/// Default threshold for the large file view (50 MiB).
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 50 * 1024 * 1024;

/// Files at least `threshold` bytes in size, in inventory order.
pub fn find_large_files(inventory: &[FileRecord], threshold: u64) -> Vec<FileRecord> {
    inventory
        .iter()
        .filter(|f| f.size >= threshold)
        .cloned()
        .collect()
}
