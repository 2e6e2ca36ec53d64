//! Junk file heuristics.
//!
//! A file is junk when its name matches a throwaway pattern (temporary,
//! partial download, log, editor backup, OS metadata), when it sits inside a
//! cache or temp directory under the scan root, or when it is empty.

use std::path::{Component, Path, PathBuf};

use derive_builder::Builder;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use sweepfile_core::FileRecord;

use crate::error::AnalyzeError;

/// Default file name patterns, matched case-insensitively.
pub const DEFAULT_JUNK_PATTERNS: &[&str] = &[
    "*.tmp",
    "*.temp",
    "*.log",
    "*.bak",
    "*.old",
    "*.part",
    "*.crdownload",
    "*~",
    "~$*",
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
];

/// Default directory names whose contents are treated as junk.
pub const DEFAULT_CACHE_DIRS: &[&str] = &["cache", ".cache", "tmp", "temp", ".trash"];

/// Why a file was flagged as junk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JunkReason {
    /// File name matches a junk pattern.
    Pattern,
    /// File lives inside a cache or temp directory.
    CacheDirectory,
    /// Zero-byte file.
    Empty,
}

impl JunkReason {
    /// Short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pattern => "junk pattern",
            Self::CacheDirectory => "cache directory",
            Self::Empty => "empty file",
        }
    }
}

/// Configuration for junk detection.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct JunkConfig {
    /// Glob patterns matched against the file name.
    #[builder(default = "DEFAULT_JUNK_PATTERNS.iter().map(|s| s.to_string()).collect()")]
    pub name_patterns: Vec<String>,

    /// Directory names (case-insensitive) whose contents are junk.
    #[builder(default = "DEFAULT_CACHE_DIRS.iter().map(|s| s.to_string()).collect()")]
    pub cache_dir_names: Vec<String>,

    /// Treat zero-byte files as junk.
    #[builder(default = "true")]
    pub include_empty: bool,

    /// Scan root; only components below it are checked for cache directories.
    #[builder(default, setter(into, strip_option))]
    pub root: Option<PathBuf>,
}

impl Default for JunkConfig {
    fn default() -> Self {
        Self {
            name_patterns: DEFAULT_JUNK_PATTERNS.iter().map(|s| s.to_string()).collect(),
            cache_dir_names: DEFAULT_CACHE_DIRS.iter().map(|s| s.to_string()).collect(),
            include_empty: true,
            root: None,
        }
    }
}

impl JunkConfig {
    /// Create a new config builder.
    pub fn builder() -> JunkConfigBuilder {
        JunkConfigBuilder::default()
    }
}

/// Flags junk files in an inventory.
#[derive(Debug, Clone)]
pub struct JunkFinder {
    config: JunkConfig,
    patterns: GlobSet,
}

impl JunkFinder {
    /// Create a finder with the default rules and no root.
    pub fn new() -> Self {
        let config = JunkConfig::default();
        let patterns = compile_patterns(&config.name_patterns).unwrap_or_else(|_| GlobSet::empty());
        Self { config, patterns }
    }

    /// Create a finder with custom rules.
    pub fn with_config(config: JunkConfig) -> Result<Self, AnalyzeError> {
        let patterns = compile_patterns(&config.name_patterns)?;
        Ok(Self { config, patterns })
    }

    /// Why `record` is junk, if it is.
    ///
    /// Rules are tried in order: name pattern, cache directory, empty file.
    pub fn reason(&self, record: &FileRecord) -> Option<JunkReason> {
        if self.patterns.is_match(record.name.as_str()) {
            return Some(JunkReason::Pattern);
        }
        if self.in_cache_dir(&record.path) {
            return Some(JunkReason::CacheDirectory);
        }
        if self.config.include_empty && record.size == 0 {
            return Some(JunkReason::Empty);
        }
        None
    }

    /// Whether `record` is junk.
    pub fn is_junk(&self, record: &FileRecord) -> bool {
        self.reason(record).is_some()
    }

    /// The junk subset of `inventory`, in inventory order.
    pub fn find_junk(&self, inventory: &[FileRecord]) -> Vec<FileRecord> {
        inventory
            .iter()
            .filter(|r| self.is_junk(r))
            .cloned()
            .collect()
    }

    fn in_cache_dir(&self, path: &Path) -> bool {
        let Some(parent) = path.parent() else {
            return false;
        };
        let relative = match &self.config.root {
            Some(root) => match parent.strip_prefix(root) {
                Ok(rel) => rel,
                Err(_) => return false,
            },
            None => parent,
        };

        relative.components().any(|c| match c {
            Component::Normal(name) => {
                let name = name.to_string_lossy();
                self.config
                    .cache_dir_names
                    .iter()
                    .any(|d| d.eq_ignore_ascii_case(&name))
            }
            _ => false,
        })
    }
}

impl Default for JunkFinder {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_patterns(patterns: &[String]) -> Result<GlobSet, AnalyzeError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .map_err(|source| AnalyzeError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| AnalyzeError::InvalidPattern {
        pattern: patterns.join(","),
        source,
    })
}
