//! Directory nodes with bottom-up aggregated statistics.

use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::record::FileRecord;
use crate::tree::{DirId, TreeBuilder};

/// One directory: its direct files, owned child directories, and the
/// recursive size/count totals of the whole subtree.
///
/// Nodes are only created through [`TreeBuilder::finish`], which computes
/// the aggregates deepest-first, so `total_size` always equals the own file
/// sizes plus every child's `total_size` (likewise for `total_file_count`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    /// Absolute path, unique within a scan.
    pub path: PathBuf,
    /// Base name.
    pub name: CompactString,
    /// Files directly inside this directory.
    pub files: Vec<FileRecord>,
    /// Child directories.
    pub children: Vec<DirectoryNode>,
    /// Size of own files plus all descendants.
    pub total_size: u64,
    /// Number of own files plus all descendants.
    pub total_file_count: u64,
    /// Distance from the scan root (root = 0).
    pub depth: u32,
}

impl DirectoryNode {
    /// Assemble a node from finished children, computing aggregates.
    pub(crate) fn from_parts(
        path: PathBuf,
        name: CompactString,
        depth: u32,
        files: Vec<FileRecord>,
        children: Vec<DirectoryNode>,
    ) -> Self {
        let total_size = files.iter().map(|f| f.size).sum::<u64>()
            + children.iter().map(|c| c.total_size).sum::<u64>();
        let total_file_count =
            files.len() as u64 + children.iter().map(|c| c.total_file_count).sum::<u64>();

        Self {
            path,
            name,
            files,
            children,
            total_size,
            total_file_count,
            depth,
        }
    }

    /// An empty directory with no files and no children.
    pub fn empty_leaf(path: impl Into<PathBuf>, depth: u32) -> Self {
        let path = path.into();
        let name = crate::tree::dir_name(&path);
        Self::from_parts(path, name, depth, Vec::new(), Vec::new())
    }

    /// Combined size of the files directly in this directory.
    pub fn own_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Pre-order traversal of this node and all descendants.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Every file in the subtree, in pre-order directory order.
    pub fn all_files(&self) -> impl Iterator<Item = &FileRecord> {
        self.iter().flat_map(|node| node.files.iter())
    }

    /// Number of directories in the subtree, including this one.
    pub fn directory_count(&self) -> usize {
        self.iter().count()
    }

    /// Find the node for `path` by descending through matching prefixes.
    pub fn find(&self, path: &Path) -> Option<&DirectoryNode> {
        let mut current = self;
        loop {
            if current.path == path {
                return Some(current);
            }
            current = current
                .children
                .iter()
                .find(|child| path.starts_with(&child.path))?;
        }
    }

    /// Check the aggregate invariant at every node of the subtree.
    pub fn aggregates_consistent(&self) -> bool {
        self.iter().all(|node| {
            let size = node.own_size() + node.children.iter().map(|c| c.total_size).sum::<u64>();
            let count = node.files.len() as u64
                + node.children.iter().map(|c| c.total_file_count).sum::<u64>();
            node.total_size == size && node.total_file_count == count
        })
    }

    /// Keep only the files accepted by `keep`, recomputing every aggregate.
    pub fn retain_files(self, mut keep: impl FnMut(&FileRecord) -> bool) -> DirectoryNode {
        self.map_files(|record| keep(&record).then_some(record))
    }

    /// Rebuild the tree passing each file through `f`; `None` drops the file.
    ///
    /// The structure is decomposed into a [`TreeBuilder`] without recursion
    /// and finished again, so aggregates and depths are never carried over.
    pub fn map_files(self, f: impl FnMut(FileRecord) -> Option<FileRecord>) -> DirectoryNode {
        self.rebuild(f, None).0
    }

    /// Add `record` to the directory at `dir`, recomputing every aggregate.
    ///
    /// Returns the tree and whether a directory at `dir` existed to take the
    /// record; when none did, the tree is returned unchanged.
    pub fn insert_file(self, dir: &Path, record: FileRecord) -> (DirectoryNode, bool) {
        self.rebuild(Some, Some((dir, record)))
    }

    fn rebuild(
        self,
        mut f: impl FnMut(FileRecord) -> Option<FileRecord>,
        mut extra: Option<(&Path, FileRecord)>,
    ) -> (DirectoryNode, bool) {
        let mut inserted = false;
        let mut builder = TreeBuilder::new(self.path.clone(), self.name.clone());
        let mut stack: Vec<(DirectoryNode, Option<DirId>)> = vec![(self, None)];

        while let Some((node, parent)) = stack.pop() {
            let DirectoryNode {
                path,
                name,
                files,
                children,
                ..
            } = node;

            let id = match parent {
                Some(parent) => builder.add_directory(parent, path, name),
                None => builder.root(),
            };

            for record in files.into_iter().filter_map(&mut f) {
                builder.add_file(id, record);
            }
            let here = extra.as_ref().is_some_and(|(dir, _)| *dir == builder.path(id));
            if let Some((_, record)) = extra.take_if(|_| here) {
                builder.add_file(id, record);
                inserted = true;
            }

            // Reversed so children pop, and register, in their original order.
            for child in children.into_iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        (builder.finish(), inserted)
    }
}

/// Pre-order iterator over a directory subtree.
pub struct Iter<'a> {
    stack: Vec<&'a DirectoryNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a DirectoryNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DirectoryNode {
        let mut builder = TreeBuilder::new("/r".into(), "r".into());
        let root = builder.root();
        let a = builder.add_directory(root, "/r/a".into(), "a".into());
        let b = builder.add_directory(a, "/r/a/b".into(), "b".into());
        builder.add_file(root, FileRecord::new("/r/top.txt", 10, 0));
        builder.add_file(a, FileRecord::new("/r/a/mid.txt", 20, 0));
        builder.add_file(b, FileRecord::new("/r/a/b/deep.txt", 30, 0));
        builder.finish()
    }

    #[test]
    fn test_aggregates() {
        let tree = sample();
        assert_eq!(tree.total_size, 60);
        assert_eq!(tree.total_file_count, 3);
        let a = tree.find(Path::new("/r/a")).unwrap();
        assert_eq!(a.total_size, 50);
        assert_eq!(a.depth, 1);
        assert!(tree.aggregates_consistent());
    }

    #[test]
    fn test_iter_is_preorder() {
        let tree = sample();
        let paths: Vec<_> = tree.iter().map(|n| n.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/r"),
                PathBuf::from("/r/a"),
                PathBuf::from("/r/a/b")
            ]
        );
        assert_eq!(tree.all_files().count(), 3);
    }

    #[test]
    fn test_retain_files_recomputes_ancestors() {
        let tree = sample().retain_files(|f| f.name != "deep.txt");
        assert_eq!(tree.total_size, 30);
        assert_eq!(tree.total_file_count, 2);
        let b = tree.find(Path::new("/r/a/b")).unwrap();
        assert_eq!(b.total_size, 0);
        assert_eq!(b.depth, 2);
        assert!(tree.aggregates_consistent());
    }

    #[test]
    fn test_insert_file_updates_ancestors() {
        let (tree, inserted) =
            sample().insert_file(Path::new("/r/a/b"), FileRecord::new("/r/a/b/new.txt", 5, 0));
        assert!(inserted);
        assert_eq!(tree.total_size, 65);
        assert_eq!(tree.find(Path::new("/r/a")).unwrap().total_file_count, 3);
        assert!(tree.aggregates_consistent());

        let (tree, inserted) =
            tree.insert_file(Path::new("/r/zzz"), FileRecord::new("/r/zzz/x.txt", 7, 0));
        assert!(!inserted);
        assert_eq!(tree.total_size, 65);
    }

    #[test]
    fn test_inconsistent_aggregates_detected() {
        let mut tree = sample();
        tree.children[0].total_size += 1;
        assert!(!tree.aggregates_consistent());
    }

    #[test]
    fn test_find_missing() {
        assert!(sample().find(Path::new("/r/zzz")).is_none());
        assert!(sample().find(Path::new("/elsewhere")).is_none());
    }
}
