//! Views derived from a snapshot and the pipeline that computes them.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::debug;

use sweepfile_analyze::{
    CategoryMap, DuplicateConfig, DuplicateFinder, JunkConfig, JunkFinder, find_large_files,
    group_by_category,
};
use sweepfile_core::{FileRecord, ScanSnapshot, StorageStats};

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Everything observers read after a scan, published as one value.
///
/// Every list is a subset of `snapshot.inventory` (the duplicate list carries
/// group ids) and `stats` is always computed from these lists.
#[derive(Debug, Clone)]
pub struct DerivedViews {
    pub snapshot: ScanSnapshot,
    pub by_category: CategoryMap,
    pub duplicates: Vec<FileRecord>,
    pub large: Vec<FileRecord>,
    pub junk: Vec<FileRecord>,
    pub stats: StorageStats,
}

impl DerivedViews {
    pub fn inventory(&self) -> &[FileRecord] {
        &self.snapshot.inventory
    }

    /// Remove exactly `removed` from every view and recompute the totals.
    pub fn without_paths(&self, removed: &HashSet<PathBuf>) -> Self {
        let keep = |r: &FileRecord| !removed.contains(&r.path);
        let filter = |records: &[FileRecord]| -> Vec<FileRecord> {
            records.iter().filter(|r| keep(r)).cloned().collect()
        };

        let snapshot = self.snapshot.clone().retain_files(keep);
        let by_category = self
            .by_category
            .iter()
            .map(|(category, files)| (*category, filter(files)))
            .filter(|(_, files)| !files.is_empty())
            .collect();

        Self::assemble(
            snapshot,
            by_category,
            filter(&self.duplicates),
            filter(&self.large),
            filter(&self.junk),
        )
    }

    /// Apply a completed rename: `renamed` replaces the record at `old_path`.
    ///
    /// Category, junk and large views are rederived since the new name may
    /// change them; duplicate membership is content-based and carries over.
    pub fn with_renamed(
        &self,
        old_path: &Path,
        renamed: &FileRecord,
        pipeline: &Pipeline,
    ) -> Result<Self, EngineError> {
        let snapshot = self.snapshot.clone().replace_file(old_path, renamed);
        self.rederive(snapshot, old_path, renamed, pipeline)
    }

    /// Apply a completed move: the record at `old_path` now lives at
    /// `moved.path`.
    ///
    /// A file moved outside the scanned tree leaves every view.
    pub fn with_moved(
        &self,
        old_path: &Path,
        moved: &FileRecord,
        pipeline: &Pipeline,
    ) -> Result<Self, EngineError> {
        let snapshot = self.snapshot.clone().move_file(old_path, moved);
        self.rederive(snapshot, old_path, moved, pipeline)
    }

    fn rederive(
        &self,
        snapshot: ScanSnapshot,
        old_path: &Path,
        relocated: &FileRecord,
        pipeline: &Pipeline,
    ) -> Result<Self, EngineError> {
        let kept = snapshot.inventory.iter().any(|r| r.path == relocated.path);
        let duplicates = self
            .duplicates
            .iter()
            .filter_map(|r| {
                if r.path != old_path {
                    Some(r.clone())
                } else {
                    kept.then(|| r.relocated(&relocated.path))
                }
            })
            .collect();

        let junk = pipeline.junk_finder(snapshot.root_path())?.find_junk(&snapshot.inventory);
        let large = find_large_files(&snapshot.inventory, pipeline.large_threshold);
        let by_category = group_by_category(&snapshot.inventory);

        Ok(Self::assemble(snapshot, by_category, duplicates, large, junk))
    }

    fn assemble(
        snapshot: ScanSnapshot,
        by_category: CategoryMap,
        duplicates: Vec<FileRecord>,
        large: Vec<FileRecord>,
        junk: Vec<FileRecord>,
    ) -> Self {
        let stats = StorageStats::from_views(&snapshot.inventory, &junk, &duplicates, &large);
        Self {
            snapshot,
            by_category,
            duplicates,
            large,
            junk,
            stats,
        }
    }
}

/// The analysis stages run after every walk.
#[derive(Debug, Clone)]
pub struct Pipeline {
    duplicates: DuplicateConfig,
    large_threshold: u64,
}

impl Pipeline {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            duplicates: config.duplicate_config(),
            large_threshold: config.large_file_threshold,
        }
    }

    fn junk_finder(&self, root: &Path) -> Result<JunkFinder, EngineError> {
        let config = JunkConfig {
            root: Some(root.to_path_buf()),
            ..JunkConfig::default()
        };
        Ok(JunkFinder::with_config(config)?)
    }

    /// Category grouping, duplicates, large files, junk, then totals.
    pub fn run(&self, snapshot: ScanSnapshot) -> Result<DerivedViews, EngineError> {
        let start = Instant::now();
        let inventory = &snapshot.inventory;

        let by_category = group_by_category(inventory);
        let categorized = start.elapsed();

        let finder = DuplicateFinder::with_config(self.duplicates.clone());
        let report = finder.find_duplicates(inventory);
        let duplicates = report.records();
        let hashed = start.elapsed();

        let large = find_large_files(inventory, self.large_threshold);
        let junk = self.junk_finder(snapshot.root_path())?.find_junk(inventory);

        debug!(
            files = inventory.len(),
            duplicate_groups = report.group_count,
            categorize_ms = categorized.as_millis() as u64,
            duplicates_ms = (hashed - categorized).as_millis() as u64,
            total_ms = start.elapsed().as_millis() as u64,
            "Derived views computed"
        );

        Ok(DerivedViews::assemble(snapshot, by_category, duplicates, large, junk))
    }
}
