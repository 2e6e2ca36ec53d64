//! Scan orchestration for sweepfile.
//!
//! [`ScanOrchestrator`] owns the scan lifecycle. It runs the walker, derives
//! the category, duplicate, large-file and junk views, computes
//! [`StorageStats`], persists snapshots, and fulfils delete, rename and
//! move requests. Observers subscribe to state and view updates instead of
//! sharing mutable state.
//!
//! ```rust,no_run
//! use sweepfile_engine::{EngineConfig, ScanOrchestrator};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = ScanOrchestrator::new(EngineConfig::load()?);
//! let mut state = engine.subscribe_state();
//!
//! engine.start_scan("/storage/emulated/0").await?;
//! println!("{:?}", *state.borrow_and_update());
//!
//! if let Some(views) = engine.views() {
//!     println!("{} junk bytes", views.stats.junk_size);
//!     let summary = engine.delete_files(&views.junk).await?;
//!     println!("freed {} bytes", summary.freed_bytes);
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod orchestrator;
mod views;

pub use config::EngineConfig;
pub use error::{ConfigError, EngineError};
pub use orchestrator::{DeleteSummary, ScanOrchestrator, ViewsHandle};
pub use views::{DerivedViews, Pipeline};

pub use sweepfile_cache::CacheLoad;
pub use sweepfile_core::{ScanState, StorageStats};
