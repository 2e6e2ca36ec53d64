//! Arena used to assemble directory trees without back-references.

use std::path::{Path, PathBuf};

use compact_str::CompactString;

use crate::node::DirectoryNode;
use crate::record::FileRecord;

/// Handle to a directory registered in a [`TreeBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirId(usize);

/// Mutable build record for one directory.
#[derive(Debug)]
struct PendingDirectory {
    path: PathBuf,
    name: CompactString,
    depth: u32,
    files: Vec<FileRecord>,
    children: Vec<usize>,
}

/// Flat arena of pending directories.
///
/// Parents register children by index while a walk (or a cache load) is in
/// progress; [`finish`](Self::finish) then converts the arena into an owned
/// [`DirectoryNode`] tree, deepest directories first, so every child's
/// aggregate is final before its parent is assembled.
#[derive(Debug)]
pub struct TreeBuilder {
    dirs: Vec<PendingDirectory>,
}

impl TreeBuilder {
    /// Create a builder holding only the root directory.
    pub fn new(root: PathBuf, name: CompactString) -> Self {
        Self {
            dirs: vec![PendingDirectory {
                path: root,
                name,
                depth: 0,
                files: Vec::new(),
                children: Vec::new(),
            }],
        }
    }

    /// Create a builder for `root`, deriving its name from the path.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = dir_name(&root);
        Self::new(root, name)
    }

    pub fn root(&self) -> DirId {
        DirId(0)
    }

    /// Register a child directory of `parent`.
    pub fn add_directory(&mut self, parent: DirId, path: PathBuf, name: CompactString) -> DirId {
        let id = self.dirs.len();
        let depth = self.dirs[parent.0].depth + 1;
        self.dirs.push(PendingDirectory {
            path,
            name,
            depth,
            files: Vec::new(),
            children: Vec::new(),
        });
        self.dirs[parent.0].children.push(id);
        DirId(id)
    }

    /// Attach a file directly to `dir`.
    pub fn add_file(&mut self, dir: DirId, record: FileRecord) {
        self.dirs[dir.0].files.push(record);
    }

    pub fn path(&self, dir: DirId) -> &Path {
        &self.dirs[dir.0].path
    }

    pub fn depth(&self, dir: DirId) -> u32 {
        self.dirs[dir.0].depth
    }

    /// Number of registered directories, root included.
    pub fn directory_count(&self) -> usize {
        self.dirs.len()
    }

    /// Finalize the arena into an immutable tree.
    pub fn finish(self) -> DirectoryNode {
        let mut order: Vec<usize> = (0..self.dirs.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(self.dirs[i].depth));

        let mut pending: Vec<Option<PendingDirectory>> = self.dirs.into_iter().map(Some).collect();
        let mut built: Vec<Option<DirectoryNode>> = (0..pending.len()).map(|_| None).collect();

        for index in order {
            let Some(dir) = pending[index].take() else {
                continue;
            };
            let children = dir
                .children
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[index] = Some(DirectoryNode::from_parts(
                dir.path, dir.name, dir.depth, dir.files, children,
            ));
        }

        built
            .into_iter()
            .next()
            .flatten()
            .unwrap_or_else(|| DirectoryNode::empty_leaf(PathBuf::new(), 0))
    }
}

/// Display name for a directory path: its final component, or the whole
/// path for roots such as `/`.
pub fn dir_name(path: &Path) -> CompactString {
    path.file_name()
        .map(|n| CompactString::new(n.to_string_lossy()))
        .unwrap_or_else(|| CompactString::new(path.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_gives_empty_root() {
        let tree = TreeBuilder::for_root("/data").finish();
        assert_eq!(tree.name.as_str(), "data");
        assert_eq!(tree.total_size, 0);
        assert!(tree.children.is_empty());
    }

    #[test]
    fn test_children_keep_registration_order() {
        let mut builder = TreeBuilder::for_root("/r");
        let root = builder.root();
        builder.add_directory(root, "/r/z".into(), "z".into());
        builder.add_directory(root, "/r/a".into(), "a".into());
        let tree = builder.finish();
        let names: Vec<_> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn test_depths_follow_parents() {
        let mut builder = TreeBuilder::for_root("/r");
        let a = builder.add_directory(builder.root(), "/r/a".into(), "a".into());
        let b = builder.add_directory(a, "/r/a/b".into(), "b".into());
        assert_eq!(builder.depth(b), 2);
        assert_eq!(builder.path(b), Path::new("/r/a/b"));
        assert_eq!(builder.directory_count(), 3);
    }

    #[test]
    fn test_root_name_for_filesystem_root() {
        assert_eq!(dir_name(Path::new("/")).as_str(), "/");
    }
}
