//! Flat file records produced by the walker.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::category::{Category, classify};

/// Identifier shared by every member of one duplicate group.
pub type DuplicateGroupId = u32;

/// BLAKE3 content hash used as the duplicate equivalence key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// One classified file. The path is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path.
    pub path: PathBuf,
    /// Base name.
    pub name: CompactString,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, milliseconds since the Unix epoch.
    pub modified_ms: i64,
    pub category: Category,
    /// Set only on records returned by duplicate detection.
    #[serde(default)]
    pub duplicate_group: Option<DuplicateGroupId>,
}

impl FileRecord {
    /// Create a record, classifying it from its path.
    pub fn new(path: impl Into<PathBuf>, size: u64, modified_ms: i64) -> Self {
        let path = path.into();
        let name = base_name(&path);
        let category = classify(&path);
        Self {
            path,
            name,
            size,
            modified_ms,
            category,
            duplicate_group: None,
        }
    }

    /// Build a record from filesystem metadata.
    pub fn from_metadata(path: impl Into<PathBuf>, metadata: &std::fs::Metadata) -> Self {
        let modified_ms = metadata.modified().map(system_time_to_millis).unwrap_or(0);
        Self::new(path, metadata.len(), modified_ms)
    }

    /// Copy of this record tagged with a duplicate group.
    pub fn with_duplicate_group(&self, group: DuplicateGroupId) -> Self {
        Self {
            duplicate_group: Some(group),
            ..self.clone()
        }
    }

    /// Copy of this record at a new location. Name and category follow the new path.
    pub fn relocated(&self, new_path: impl Into<PathBuf>) -> Self {
        let path = new_path.into();
        Self {
            name: base_name(&path),
            category: classify(&path),
            path,
            ..self.clone()
        }
    }

    /// Copy of this record with no duplicate group, as stored in the inventory.
    pub fn without_duplicate_group(&self) -> Self {
        Self {
            duplicate_group: None,
            ..self.clone()
        }
    }

    pub fn is_duplicate(&self) -> bool {
        self.duplicate_group.is_some()
    }

    /// Modification time as a UTC timestamp.
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.modified_ms)
    }
}

/// Milliseconds since the epoch; negative for times before it.
pub fn system_time_to_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_millis()).unwrap_or(i64::MAX),
    }
}

fn base_name(path: &Path) -> CompactString {
    path.file_name()
        .map(|n| CompactString::new(n.to_string_lossy()))
        .unwrap_or_else(|| CompactString::new(path.to_string_lossy()))
}
