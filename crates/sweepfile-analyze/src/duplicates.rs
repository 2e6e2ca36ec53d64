//! Duplicate file detection using content hashing.
//!
//! Uses a three-phase algorithm for efficiency:
//! 1. Group files by size (instant, O(n))
//! 2. Compute partial hash for size-matched files (first + last 4KB)
//! 3. Compute full BLAKE3 hash for partial-hash matches
//!
//! Two files are duplicates exactly when their size and full BLAKE3 hash are
//! equal; the partial phase only discards candidates early.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use blake3::Hasher;
use derive_builder::Builder;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sweepfile_core::{ContentHash, DuplicateGroupId, FileRecord};

/// Configuration for duplicate detection.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct DuplicateConfig {
    /// Minimum file size to consider. Empty files are junk, not duplicates.
    #[builder(default = "1")]
    pub min_size: u64,

    /// Maximum file size to consider (skip huge files).
    #[builder(default = "u64::MAX")]
    pub max_size: u64,

    /// Use quick comparison (size + partial hash) before full hash.
    #[builder(default = "true")]
    pub quick_compare: bool,

    /// Number of bytes for partial hash from start of file.
    #[builder(default = "4096")]
    pub partial_hash_head: usize,

    /// Number of bytes for partial hash from end of file.
    #[builder(default = "4096")]
    pub partial_hash_tail: usize,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: u64::MAX,
            quick_compare: true,
            partial_hash_head: 4096,
            partial_hash_tail: 4096,
        }
    }
}

impl DuplicateConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateConfigBuilder {
        DuplicateConfigBuilder::default()
    }
}

/// A group of files sharing the same content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Discovery-order identifier, also stamped on every member.
    pub id: DuplicateGroupId,

    /// Content hash shared by all files in this group.
    pub hash: ContentHash,

    /// Size of each file in bytes.
    pub size: u64,

    /// Members in inventory order, tagged with `id`.
    pub members: Vec<FileRecord>,

    /// Wasted space: size * (count - 1).
    pub wasted_bytes: u64,
}

impl DuplicateGroup {
    /// Get the number of duplicate files.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Check if keeping one file, how many could be deleted.
    pub fn deletable_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// The member to keep: newest modification time, ties broken by the
    /// lexicographically smallest path.
    pub fn newest(&self) -> Option<&FileRecord> {
        self.members.iter().min_by(|a, b| keep_order(a, b))
    }
}

/// Results from duplicate analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Groups ordered by id.
    pub groups: Vec<DuplicateGroup>,

    /// Total size of all duplicate files.
    pub total_duplicate_size: u64,

    /// Total wasted space (could be reclaimed).
    pub total_wasted_space: u64,

    /// Number of files analyzed.
    pub files_analyzed: u64,

    /// Number of files that have duplicates.
    pub files_with_duplicates: u64,

    /// Number of unique duplicate groups.
    pub group_count: usize,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Every member of every group, ordered by group id then inventory order.
    pub fn records(&self) -> Vec<FileRecord> {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter().cloned())
            .collect()
    }
}

/// Duplicate file finder.
pub struct DuplicateFinder {
    config: DuplicateConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with default config.
    pub fn new() -> Self {
        Self {
            config: DuplicateConfig::default(),
        }
    }

    /// Create a new duplicate finder with custom config.
    pub fn with_config(config: DuplicateConfig) -> Self {
        Self { config }
    }

    /// Partition `inventory` into duplicate groups.
    ///
    /// Group ids follow the inventory position of each group's first member,
    /// so the same input always yields the same ids. Files that cannot be
    /// read are left out.
    pub fn find_duplicates(&self, inventory: &[FileRecord]) -> DuplicateReport {
        // Phase 1: candidates by size, first appearance order
        let mut size_groups: IndexMap<u64, Vec<usize>> = IndexMap::new();
        for (index, record) in inventory.iter().enumerate() {
            if record.size >= self.config.min_size && record.size <= self.config.max_size {
                size_groups.entry(record.size).or_default().push(index);
            }
        }
        let files_analyzed = size_groups.values().map(|v| v.len() as u64).sum();
        size_groups.retain(|_, v| v.len() > 1);

        // Phase 2/3: hash within each size group (parallelized across size groups)
        let size_groups: Vec<(u64, Vec<usize>)> = size_groups.into_iter().collect();
        let mut matches: Vec<(ContentHash, u64, Vec<usize>)> = size_groups
            .into_par_iter()
            .flat_map_iter(|(size, indices)| {
                let candidates = if self.config.quick_compare {
                    self.split_by_partial_hash(inventory, indices)
                } else {
                    vec![indices]
                };
                candidates
                    .into_iter()
                    .flat_map(|c| self.split_by_full_hash(inventory, c))
                    .map(move |(hash, members)| (hash, size, members))
                    .collect::<Vec<_>>()
            })
            .collect();

        // Member lists are ascending, so the first index orders groups.
        matches.sort_by_key(|(_, _, members)| members[0]);

        let groups: Vec<DuplicateGroup> = matches
            .into_iter()
            .enumerate()
            .map(|(position, (hash, size, members))| {
                let id = position as DuplicateGroupId;
                let members: Vec<FileRecord> = members
                    .into_iter()
                    .map(|i| inventory[i].with_duplicate_group(id))
                    .collect();
                let wasted_bytes = size * (members.len() as u64 - 1);
                DuplicateGroup {
                    id,
                    hash,
                    size,
                    members,
                    wasted_bytes,
                }
            })
            .collect();

        let total_duplicate_size: u64 = groups.iter().map(|g| g.size * g.count() as u64).sum();
        let total_wasted_space: u64 = groups.iter().map(|g| g.wasted_bytes).sum();
        let files_with_duplicates: u64 = groups.iter().map(|g| g.count() as u64).sum();
        let group_count = groups.len();

        debug!(
            files_analyzed,
            group_count, total_wasted_space, "Duplicate detection complete"
        );

        DuplicateReport {
            groups,
            total_duplicate_size,
            total_wasted_space,
            files_analyzed,
            files_with_duplicates,
            group_count,
        }
    }

    /// Split a size group by partial hash, keeping only sets of 2+.
    fn split_by_partial_hash(&self, inventory: &[FileRecord], indices: Vec<usize>) -> Vec<Vec<usize>> {
        let hashes: Vec<(usize, Option<[u8; 32]>)> = indices
            .par_iter()
            .map(|&i| (i, self.compute_partial_hash(&inventory[i].path)))
            .collect();

        let mut partial_groups: IndexMap<[u8; 32], Vec<usize>> = IndexMap::new();
        for (index, hash) in hashes {
            if let Some(h) = hash {
                partial_groups.entry(h).or_default().push(index);
            }
        }

        partial_groups
            .into_values()
            .filter(|members| members.len() > 1)
            .collect()
    }

    /// Split candidates by full hash, keeping only sets of 2+.
    fn split_by_full_hash(
        &self,
        inventory: &[FileRecord],
        indices: Vec<usize>,
    ) -> Vec<(ContentHash, Vec<usize>)> {
        let hashes: Vec<(usize, Option<ContentHash>)> = indices
            .par_iter()
            .map(|&i| (i, self.compute_full_hash(&inventory[i].path)))
            .collect();

        let mut full_groups: IndexMap<ContentHash, Vec<usize>> = IndexMap::new();
        for (index, hash) in hashes {
            if let Some(h) = hash {
                full_groups.entry(h).or_default().push(index);
            }
        }

        full_groups
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .collect()
    }

    /// Compute a partial hash (first + last N bytes).
    fn compute_partial_hash(&self, path: &Path) -> Option<[u8; 32]> {
        let mut file = File::open(path).ok()?;
        let metadata = file.metadata().ok()?;
        let file_size = metadata.len();

        let mut hasher = Hasher::new();

        // Read from start
        let head_size = (self.config.partial_hash_head as u64).min(file_size);
        let mut head_buf = vec![0u8; head_size as usize];
        file.read_exact(&mut head_buf).ok()?;
        hasher.update(&head_buf);

        // Read from end (if file is large enough)
        if file_size > head_size {
            let tail_size = (self.config.partial_hash_tail as u64).min(file_size - head_size);
            if tail_size > 0 {
                file.seek(SeekFrom::End(-(tail_size as i64))).ok()?;
                let mut tail_buf = vec![0u8; tail_size as usize];
                file.read_exact(&mut tail_buf).ok()?;
                hasher.update(&tail_buf);
            }
        }

        // Include file size in hash to differentiate files with same head/tail
        hasher.update(&file_size.to_le_bytes());

        Some(*hasher.finalize().as_bytes())
    }

    /// Compute full BLAKE3 hash of a file.
    fn compute_full_hash(&self, path: &Path) -> Option<ContentHash> {
        let file = File::open(path).ok()?;
        let file_size = file.metadata().ok()?.len();
        let mut hasher = Hasher::new();

        // Use mmap for files > 128KB, buffered read for smaller
        if file_size > 128 * 1024 {
            hasher.update_mmap(path).ok()?;
        } else {
            let mut buffer = vec![0u8; 64 * 1024];
            let mut file = file;

            loop {
                let bytes_read = file.read(&mut buffer).ok()?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
        }

        Some(ContentHash::new(*hasher.finalize().as_bytes()))
    }
}

impl Default for DuplicateFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordering where the record to keep sorts first: newest, then smallest path.
fn keep_order(a: &FileRecord, b: &FileRecord) -> Ordering {
    b.modified_ms
        .cmp(&a.modified_ms)
        .then_with(|| a.path.cmp(&b.path))
}

/// Pick every duplicate except the one to keep in each group.
///
/// `duplicates` is a subset tagged by [`DuplicateFinder`]; untagged records
/// are ignored. The kept record per group is the newest one, with ties
/// broken by path, so exactly one member of each group is left unselected.
pub fn select_all_except_newest(duplicates: &[FileRecord]) -> Vec<FileRecord> {
    let mut groups: IndexMap<DuplicateGroupId, Vec<&FileRecord>> = IndexMap::new();
    for record in duplicates {
        if let Some(group) = record.duplicate_group {
            groups.entry(group).or_default().push(record);
        }
    }

    let mut selected = Vec::new();
    for members in groups.values() {
        let Some(keep) = members.iter().copied().min_by(|a, b| keep_order(a, b)) else {
            continue;
        };
        selected.extend(
            members
                .iter()
                .filter(|r| r.path != keep.path)
                .map(|r| (*r).clone()),
        );
    }
    selected
}
