//! File-backed snapshot cache.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use sweepfile_core::ScanSnapshot;

use crate::error::CacheError;
use crate::format::CacheEnvelope;

/// Outcome of loading the cache.
#[derive(Debug)]
pub enum CacheLoad {
    /// A valid snapshot, revalidated against the filesystem.
    Loaded {
        snapshot: ScanSnapshot,
        /// Inventory records dropped because their file is gone.
        pruned: usize,
    },
    /// No cache artifact exists.
    Absent,
    /// The artifact was unusable and has been deleted.
    Discarded { reason: String },
}

impl CacheLoad {
    /// The snapshot, if one was loaded.
    pub fn into_snapshot(self) -> Option<ScanSnapshot> {
        match self {
            Self::Loaded { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// Single-file cache of the most recent snapshot. Last save wins.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    path: PathBuf,
}

impl SnapshotCache {
    /// Cache stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Platform cache location: `<cache dir>/sweepfile/scan_cache.json`.
    pub fn default_location() -> Result<PathBuf, CacheError> {
        dirs::cache_dir()
            .map(|d| d.join("sweepfile").join("scan_cache.json"))
            .ok_or(CacheError::NoCacheDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `snapshot`, replacing any previous artifact atomically.
    pub fn save(&self, snapshot: &ScanSnapshot) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }

        let envelope = CacheEnvelope::encode(snapshot);
        let temp_path = self.path.with_extension("json.tmp");

        let written = write_envelope(&temp_path, &envelope).and_then(|()| {
            fs::rename(&temp_path, &self.path).map_err(|e| CacheError::io(&self.path, e))
        });
        if let Err(e) = written {
            // Never leave a partial artifact next to the cache.
            if temp_path.is_file() {
                let _ = fs::remove_file(&temp_path);
            }
            return Err(e);
        }

        debug!(
            path = %self.path.display(),
            files = snapshot.file_count(),
            "Saved snapshot cache"
        );
        Ok(())
    }

    /// Load and revalidate the cached snapshot.
    ///
    /// Records whose file no longer exists are dropped from the inventory and
    /// the tree, and every aggregate is recomputed. An unreadable or invalid
    /// artifact is deleted and reported as [`CacheLoad::Discarded`].
    pub fn load(&self) -> CacheLoad {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return CacheLoad::Absent,
            Err(e) => return self.discard(format!("cannot open cache: {e}")),
        };

        let envelope: CacheEnvelope = match serde_json::from_reader(BufReader::new(file)) {
            Ok(envelope) => envelope,
            Err(e) => return self.discard(format!("cannot parse cache: {e}")),
        };

        if !envelope.root.is_dir() {
            let reason = format!("scan root {} no longer exists", envelope.root.display());
            return self.discard(reason);
        }

        match envelope.decode(|path| path.symlink_metadata().is_ok()) {
            Ok((snapshot, pruned)) => {
                info!(
                    path = %self.path.display(),
                    files = snapshot.file_count(),
                    pruned,
                    "Loaded snapshot cache"
                );
                CacheLoad::Loaded { snapshot, pruned }
            }
            Err(reason) => self.discard(reason),
        }
    }

    /// Remove the cache artifact, if any.
    pub fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(&self.path, e)),
        }
    }

    fn discard(&self, reason: String) -> CacheLoad {
        warn!(path = %self.path.display(), %reason, "Discarding snapshot cache");
        if let Err(e) = fs::remove_file(&self.path) {
            debug!(error = %e, "Could not remove discarded cache");
        }
        CacheLoad::Discarded { reason }
    }
}

fn write_envelope(path: &Path, envelope: &CacheEnvelope) -> Result<(), CacheError> {
    let file = File::create(path).map_err(|e| CacheError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, envelope)?;
    writer.flush().map_err(|e| CacheError::io(path, e))
}
