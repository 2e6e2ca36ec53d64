//! Scan configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Root-relative directories that are never descended into: OS caches,
/// thumbnails, app-private storage and pseudo filesystems.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    "Android/data",
    "Android/obb",
    ".thumbnails",
    ".cache",
    "lost+found",
    "proc",
    "sys",
    "dev",
];

/// Default number of files between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

/// Configuration for a walk.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Root-relative directory prefixes to skip, matched per path component.
    #[builder(default = "default_skip_dirs()")]
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,

    /// Skip directories whose name starts with a dot.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub skip_hidden_dirs: bool,

    /// Report progress every this many files.
    #[builder(default = "DEFAULT_PROGRESS_INTERVAL")]
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

fn default_true() -> bool {
    true
}

fn default_progress_interval() -> u64 {
    DEFAULT_PROGRESS_INTERVAL
}

fn default_skip_dirs() -> Vec<String> {
    DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect()
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if self.progress_interval == Some(0) {
            return Err("Progress interval must be at least 1".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a config with the default skip set for a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            skip_dirs: default_skip_dirs(),
            skip_hidden_dirs: true,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Check whether a root-relative directory path falls under the skip set.
    pub fn is_skipped(&self, relative: &Path) -> bool {
        self.skip_dirs
            .iter()
            .any(|prefix| relative.starts_with(Path::new(prefix)))
    }

    /// Check if a directory should be skipped for being hidden.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        self.skip_hidden_dirs && name.starts_with('.')
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
