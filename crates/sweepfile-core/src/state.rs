//! Scan lifecycle state and storage statistics.

use serde::{Deserialize, Serialize};

use crate::record::FileRecord;

/// Lifecycle of a scan.
///
/// `Idle → Scanning → Done`, or `Idle/Scanning → Error`. `Done` and `Error`
/// are terminal; a new scan always restarts at `Scanning { files_found: 0 }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScanState {
    #[default]
    Idle,
    /// A walk is in flight; the counter never decreases within one scan.
    Scanning { files_found: u64 },
    Done,
    Error { message: String },
}

impl ScanState {
    pub fn is_scanning(&self) -> bool {
        matches!(self, Self::Scanning { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }

    /// Progress counter while scanning.
    pub fn files_found(&self) -> Option<u64> {
        match self {
            Self::Scanning { files_found } => Some(*files_found),
            _ => None,
        }
    }
}

/// Totals shown on the storage dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageStats {
    pub total_files: u64,
    pub total_size: u64,
    pub junk_size: u64,
    pub duplicate_size: u64,
    pub large_size: u64,
}

impl StorageStats {
    /// Recompute every total from the authoritative lists.
    pub fn from_views(
        inventory: &[FileRecord],
        junk: &[FileRecord],
        duplicates: &[FileRecord],
        large: &[FileRecord],
    ) -> Self {
        Self {
            total_files: inventory.len() as u64,
            total_size: sum_sizes(inventory),
            junk_size: sum_sizes(junk),
            duplicate_size: sum_sizes(duplicates),
            large_size: sum_sizes(large),
        }
    }
}

fn sum_sizes(records: &[FileRecord]) -> u64 {
    records.iter().map(|f| f.size).sum()
}
