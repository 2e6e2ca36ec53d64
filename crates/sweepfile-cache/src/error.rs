//! Cache error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while writing the cache.
///
/// Load never fails; problems there become [`CacheLoad::Discarded`](crate::CacheLoad).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("No cache directory available on this platform")]
    NoCacheDir,
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
