//! Error types for the engine.

use std::path::PathBuf;

use thiserror::Error;

use sweepfile_analyze::AnalyzeError;
use sweepfile_core::ScanError;
use sweepfile_ops::OperationError;

/// Errors loading [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Analyze(#[from] AnalyzeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A rename request failed; nothing was changed.
    #[error("Rename failed: {0}")]
    Rename(OperationError),

    /// A move request failed; nothing was changed.
    #[error("Move failed: {0}")]
    Move(OperationError),

    /// A background operation ended without reporting completion.
    #[error("Operation ended unexpectedly")]
    OperationAborted,

    /// Restoring from cache while a scan is in flight.
    #[error("A scan is already in progress")]
    ScanInProgress,

    /// Views changed while a cached snapshot was being restored.
    #[error("Superseded by a newer scan")]
    Superseded,

    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}
