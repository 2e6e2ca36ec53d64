//! Iterative directory walker.

use std::fs;
use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use sweepfile_core::{
    DirId, FileRecord, ScanConfig, ScanError, ScanSnapshot, ScanWarning, TreeBuilder,
};

use crate::progress::{ProgressTracker, ScanProgress};

/// Everything a successful walk produces.
#[derive(Debug)]
pub struct WalkOutput {
    /// Flat inventory plus aggregated tree.
    pub snapshot: ScanSnapshot,
    /// Directories and entries that could not be read.
    pub warnings: Vec<ScanWarning>,
    /// Wall-clock time of the walk.
    pub duration: Duration,
}

/// Single-pass walker driven by an explicit directory work-list.
///
/// Stack depth stays constant however deep the filesystem is. Symbolic links
/// are never followed, so link cycles cannot trap the walk.
#[derive(Debug, Default)]
pub struct TreeWalker;

impl TreeWalker {
    /// Create a new walker.
    pub fn new() -> Self {
        Self
    }

    /// Walk `config.root`, reporting progress every `config.progress_interval`
    /// files and once more on completion.
    ///
    /// `cancel` is polled once per directory; a cancelled walk returns
    /// [`ScanError::Cancelled`] and no partial snapshot.
    pub fn walk<F>(
        &self,
        config: &ScanConfig,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<WalkOutput, ScanError>
    where
        F: FnMut(&ScanProgress),
    {
        let root = fs::canonicalize(&config.root).map_err(|e| ScanError::io(&config.root, e))?;
        if !root.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        info!(root = %root.display(), "Starting walk");

        let interval = config.progress_interval.max(1);
        let mut tracker = ProgressTracker::new();
        let mut builder = TreeBuilder::for_root(&root);
        let mut inventory: Vec<FileRecord> = Vec::new();
        let mut warnings: Vec<ScanWarning> = Vec::new();
        let mut work: Vec<DirId> = vec![builder.root()];

        while let Some(dir) = work.pop() {
            if cancel.is_cancelled() {
                debug!(files = tracker.files_scanned(), "Walk cancelled");
                return Err(ScanError::Cancelled);
            }

            let dir_path = builder.path(dir).to_path_buf();
            tracker.record_dir();
            tracker.set_current_path(dir_path.clone());

            // An unreadable directory stays in the tree as an empty leaf.
            let entries = match fs::read_dir(&dir_path) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!(path = %dir_path.display(), error = %err, "Cannot list directory");
                    warnings.push(ScanWarning::unreadable_dir(&dir_path, &err));
                    tracker.record_error();
                    continue;
                }
            };

            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warnings.push(ScanWarning::unreadable_dir(&dir_path, &err));
                        tracker.record_error();
                        continue;
                    }
                };

                let path = entry.path();
                let file_type = match entry.file_type() {
                    Ok(t) => t,
                    Err(err) => {
                        warnings.push(ScanWarning::metadata_error(&path, &err));
                        tracker.record_error();
                        continue;
                    }
                };

                if file_type.is_symlink() {
                    trace!(path = %path.display(), "Skipping symlink");
                    warnings.push(ScanWarning::skipped_symlink(&path));
                    continue;
                }

                if file_type.is_dir() {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if self.should_skip_dir(config, &root, &path, &name) {
                        trace!(path = %path.display(), "Skipping directory");
                        continue;
                    }
                    let child = builder.add_directory(dir, path, name.into());
                    work.push(child);
                } else if file_type.is_file() {
                    let metadata = match entry.metadata() {
                        Ok(m) => m,
                        Err(err) => {
                            warnings.push(ScanWarning::metadata_error(&path, &err));
                            tracker.record_error();
                            continue;
                        }
                    };

                    let record = FileRecord::from_metadata(path, &metadata);
                    tracker.record_file(record.size);
                    builder.add_file(dir, record.clone());
                    inventory.push(record);

                    if tracker.files_scanned() % interval == 0 {
                        on_progress(&tracker.snapshot());
                    }
                } else {
                    // FIFOs, sockets and device nodes hold no stored content.
                    trace!(path = %path.display(), "Skipping special file");
                }
            }
        }

        on_progress(&tracker.snapshot());

        let duration = tracker.elapsed();
        let directories = builder.directory_count();
        let snapshot = ScanSnapshot::new(inventory, builder.finish());

        info!(
            files = snapshot.file_count(),
            directories,
            bytes = snapshot.tree.total_size,
            warnings = warnings.len(),
            elapsed_ms = duration.as_millis() as u64,
            "Walk complete"
        );

        Ok(WalkOutput {
            snapshot,
            warnings,
            duration,
        })
    }

    /// Skip-set prefixes are matched against the root-relative path.
    fn should_skip_dir(&self, config: &ScanConfig, root: &Path, path: &Path, name: &str) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        config.is_skipped(relative) || config.should_skip_hidden(name)
    }
}
