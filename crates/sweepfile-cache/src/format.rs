//! On-disk representation of a snapshot.
//!
//! The tree is stored as a flat pre-order list of directories, each naming
//! its parent by index, so neither encoding nor decoding recurses.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use sweepfile_core::{DirId, DirectoryNode, FileRecord, ScanSnapshot, TreeBuilder};

/// Current artifact version. Anything else is discarded on load.
pub const CACHE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CacheEnvelope {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub scanned_at: DateTime<Utc>,
    pub root: PathBuf,
    pub files: Vec<FileRecord>,
    pub directories: Vec<StoredDirectory>,
}

/// One directory of the flattened tree. Aggregates are written for
/// inspection but never read back as truth.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredDirectory {
    pub path: PathBuf,
    pub name: CompactString,
    pub depth: u32,
    pub parent: Option<usize>,
    pub files: Vec<FileRecord>,
    pub total_size: u64,
    pub total_file_count: u64,
}

impl CacheEnvelope {
    pub fn encode(snapshot: &ScanSnapshot) -> Self {
        let mut directories = Vec::with_capacity(snapshot.tree.directory_count());
        let mut stack: Vec<(&DirectoryNode, Option<usize>)> = vec![(&snapshot.tree, None)];

        while let Some((node, parent)) = stack.pop() {
            let index = directories.len();
            directories.push(StoredDirectory {
                path: node.path.clone(),
                name: node.name.clone(),
                depth: node.depth,
                parent,
                files: node.files.clone(),
                total_size: node.total_size,
                total_file_count: node.total_file_count,
            });
            for child in node.children.iter().rev() {
                stack.push((child, Some(index)));
            }
        }

        Self {
            version: CACHE_VERSION,
            saved_at: Utc::now(),
            scanned_at: snapshot.scanned_at,
            root: snapshot.root_path().to_path_buf(),
            files: snapshot.inventory.clone(),
            directories,
        }
    }

    /// Rebuild a snapshot, keeping only files accepted by `exists`.
    ///
    /// Returns the snapshot and the number of inventory records dropped, or a
    /// description of the structural problem.
    pub fn decode(
        self,
        mut exists: impl FnMut(&Path) -> bool,
    ) -> Result<(ScanSnapshot, usize), String> {
        if self.version != CACHE_VERSION {
            return Err(format!(
                "unsupported cache version {} (expected {CACHE_VERSION})",
                self.version
            ));
        }

        let mut dirs = self.directories.into_iter();
        let root = dirs.next().ok_or("cache has no root directory")?;
        if root.parent.is_some() || root.depth != 0 || root.path != self.root {
            return Err("root directory entry is inconsistent".to_string());
        }

        let total = self.files.len();
        let inventory: Vec<FileRecord> = self
            .files
            .into_iter()
            .filter(|f| exists(f.path.as_path()))
            .collect();
        let pruned = total - inventory.len();
        let surviving: HashSet<&Path> = inventory.iter().map(|f| f.path.as_path()).collect();

        let mut builder = TreeBuilder::new(root.path, root.name);
        let root_id = builder.root();
        let mut ids: Vec<DirId> = vec![root_id];
        add_surviving(&mut builder, root_id, root.files, &surviving);

        for (offset, dir) in dirs.enumerate() {
            let index = offset + 1;
            let parent = match dir.parent {
                Some(p) if p < index => ids[p],
                _ => return Err(format!("directory {index} does not follow its parent")),
            };
            if dir.depth != builder.depth(parent) + 1 {
                return Err(format!("directory {index} has inconsistent depth"));
            }
            let id = builder.add_directory(parent, dir.path, dir.name);
            add_surviving(&mut builder, id, dir.files, &surviving);
            ids.push(id);
        }

        let tree = builder.finish();
        let mut snapshot = ScanSnapshot::new(inventory, tree);
        snapshot.scanned_at = self.scanned_at;
        Ok((snapshot, pruned))
    }
}

fn add_surviving(
    builder: &mut TreeBuilder,
    dir: DirId,
    files: Vec<FileRecord>,
    surviving: &HashSet<&Path>,
) {
    for file in files {
        if surviving.contains(file.path.as_path()) {
            builder.add_file(dir, file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScanSnapshot {
        let a = FileRecord::new("/r/a.txt", 10, 1);
        let b = FileRecord::new("/r/sub/b.txt", 20, 2);
        let mut builder = TreeBuilder::for_root("/r");
        let root = builder.root();
        builder.add_file(root, a.clone());
        let sub = builder.add_directory(root, PathBuf::from("/r/sub"), "sub".into());
        builder.add_file(sub, b.clone());
        ScanSnapshot::new(vec![a, b], builder.finish())
    }

    #[test]
    fn test_encode_is_preorder_with_parents() {
        let envelope = CacheEnvelope::encode(&sample());
        assert_eq!(envelope.directories.len(), 2);
        assert_eq!(envelope.directories[0].parent, None);
        assert_eq!(envelope.directories[1].parent, Some(0));
        assert_eq!(envelope.directories[1].depth, 1);
    }

    #[test]
    fn test_decode_restores_tree() {
        let snapshot = sample();
        let (decoded, pruned) = CacheEnvelope::encode(&snapshot).decode(|_| true).unwrap();
        assert_eq!(pruned, 0);
        assert_eq!(decoded.inventory, snapshot.inventory);
        assert_eq!(decoded.tree, snapshot.tree);
        assert_eq!(decoded.scanned_at, snapshot.scanned_at);
    }

    #[test]
    fn test_decode_ignores_stored_aggregates() {
        let mut envelope = CacheEnvelope::encode(&sample());
        envelope.directories[0].total_size = 9999;
        let (decoded, _) = envelope.decode(|_| true).unwrap();
        assert_eq!(decoded.tree.total_size, 30);
    }

    #[test]
    fn test_decode_rejects_forward_parent() {
        let mut envelope = CacheEnvelope::encode(&sample());
        envelope.directories[1].parent = Some(1);
        assert!(envelope.decode(|_| true).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_depth() {
        let mut envelope = CacheEnvelope::encode(&sample());
        envelope.directories[1].depth = 5;
        assert!(envelope.decode(|_| true).is_err());
    }

    #[test]
    fn test_decode_rejects_other_version() {
        let mut envelope = CacheEnvelope::encode(&sample());
        envelope.version = 0;
        assert!(envelope.decode(|_| true).is_err());
    }
}
