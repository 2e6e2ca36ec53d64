//! The (inventory, tree) pair produced by one walk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::node::DirectoryNode;
use crate::record::FileRecord;

/// Result of one walk: the flat inventory and the directory tree.
///
/// Every record reachable from `tree` is also present in `inventory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSnapshot {
    /// Files in visitation order.
    pub inventory: Vec<FileRecord>,
    /// Root directory with aggregated totals.
    pub tree: DirectoryNode,
    /// When the walk finished.
    pub scanned_at: DateTime<Utc>,
}

impl ScanSnapshot {
    pub fn new(inventory: Vec<FileRecord>, tree: DirectoryNode) -> Self {
        Self {
            inventory,
            tree,
            scanned_at: Utc::now(),
        }
    }

    /// Path the snapshot was taken from.
    pub fn root_path(&self) -> &Path {
        &self.tree.path
    }

    pub fn file_count(&self) -> usize {
        self.inventory.len()
    }

    /// Combined size of the inventory.
    pub fn total_size(&self) -> u64 {
        self.inventory.iter().map(|f| f.size).sum()
    }

    /// Drop every file not accepted by `keep` from both views.
    pub fn retain_files(self, mut keep: impl FnMut(&FileRecord) -> bool) -> Self {
        let inventory = self.inventory.into_iter().filter(|f| keep(f)).collect();
        let tree = self.tree.retain_files(keep);
        Self {
            inventory,
            tree,
            scanned_at: self.scanned_at,
        }
    }

    /// Remove exactly the given paths from both views.
    pub fn without_paths(self, removed: &HashSet<PathBuf>) -> Self {
        self.retain_files(|f| !removed.contains(&f.path))
    }

    /// Swap the record at `old_path` for `replacement` in both views.
    ///
    /// The stored copy carries no duplicate group.
    pub fn replace_file(self, old_path: &Path, replacement: &FileRecord) -> Self {
        let replacement = replacement.without_duplicate_group();
        let swap = |record: FileRecord| {
            if record.path == old_path {
                replacement.clone()
            } else {
                record
            }
        };
        let inventory = self.inventory.into_iter().map(swap).collect();
        let tree = self.tree.map_files(|record| Some(swap(record)));
        Self {
            inventory,
            tree,
            scanned_at: self.scanned_at,
        }
    }

    /// Relocate the record at `old_path` to `moved.path`, placing it under
    /// the directory node that now contains it.
    ///
    /// When the destination directory is not part of the tree (outside the
    /// root, or in a skipped directory) the file has left the scanned set and
    /// is dropped from both views.
    pub fn move_file(self, old_path: &Path, moved: &FileRecord) -> Self {
        let moved = moved.without_duplicate_group();
        let tree = self.tree.retain_files(|f| f.path != old_path);
        let (tree, placed) = match moved.path.parent() {
            Some(dir) => tree.insert_file(dir, moved.clone()),
            None => (tree, false),
        };

        let inventory = self
            .inventory
            .into_iter()
            .filter_map(|record| {
                if record.path != old_path {
                    Some(record)
                } else {
                    placed.then(|| moved.clone())
                }
            })
            .collect();

        Self {
            inventory,
            tree,
            scanned_at: self.scanned_at,
        }
    }
}
