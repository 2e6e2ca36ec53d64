//! Engine configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use sweepfile_analyze::{DEFAULT_LARGE_FILE_THRESHOLD, DuplicateConfig};
use sweepfile_cache::SnapshotCache;
use sweepfile_core::{DEFAULT_PROGRESS_INTERVAL, DEFAULT_SKIP_DIRS, ScanConfig};

use crate::error::ConfigError;

/// Settings for the orchestrator, loadable from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Files at least this large (bytes) appear in the large file view.
    pub large_file_threshold: u64,

    /// Root-relative directories skipped in addition to the built-in set.
    pub extra_skip_dirs: Vec<String>,

    /// Files between walker progress reports.
    pub progress_interval: u64,

    /// Move deleted files to the system trash.
    pub use_trash: bool,

    /// Persist and restore snapshots.
    pub cache_enabled: bool,

    /// Cache artifact location; the platform cache directory when unset.
    pub cache_path: Option<PathBuf>,

    /// Smallest file considered for duplicate detection.
    pub duplicate_min_size: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            extra_skip_dirs: Vec::new(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            use_trash: false,
            cache_enabled: true,
            cache_path: None,
            duplicate_min_size: 1,
        }
    }
}

impl EngineConfig {
    /// Get the config file path.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sweepfile").join("config.toml"))
    }

    /// Load from the default location, or return defaults when absent.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.progress_interval == 0 {
            return Err(ConfigError::Invalid(
                "progress_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Walker configuration for `root`.
    pub fn scan_config(&self, root: &Path) -> Result<ScanConfig, ConfigError> {
        let skip_dirs = DEFAULT_SKIP_DIRS
            .iter()
            .map(|s| s.to_string())
            .chain(self.extra_skip_dirs.iter().cloned())
            .collect::<Vec<_>>();

        ScanConfig::builder()
            .root(root)
            .skip_dirs(skip_dirs)
            .progress_interval(self.progress_interval)
            .build()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn duplicate_config(&self) -> DuplicateConfig {
        DuplicateConfig {
            min_size: self.duplicate_min_size.max(1),
            ..DuplicateConfig::default()
        }
    }

    /// The snapshot cache, when enabled and a location is known.
    pub fn snapshot_cache(&self) -> Option<SnapshotCache> {
        if !self.cache_enabled {
            return None;
        }
        match &self.cache_path {
            Some(path) => Some(SnapshotCache::new(path)),
            None => SnapshotCache::default_location().ok().map(SnapshotCache::new),
        }
    }
}
