//! Core types for sweepfile.
//!
//! This crate provides the data model shared by every other sweepfile crate:
//! classified file records, the aggregated directory tree and the arena that
//! builds it, scan snapshots, configuration and the scan state machine.

mod category;
mod config;
mod error;
mod node;
mod record;
mod snapshot;
mod state;
mod tree;

pub use category::{Category, classify};
pub use config::{DEFAULT_PROGRESS_INTERVAL, DEFAULT_SKIP_DIRS, ScanConfig, ScanConfigBuilder};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use node::{DirectoryNode, Iter};
pub use record::{ContentHash, DuplicateGroupId, FileRecord, system_time_to_millis};
pub use snapshot::ScanSnapshot;
pub use state::{ScanState, StorageStats};
pub use tree::{DirId, TreeBuilder, dir_name};
