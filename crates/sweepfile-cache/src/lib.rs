//! Snapshot persistence for sweepfile.
//!
//! A [`SnapshotCache`] stores the most recent [`ScanSnapshot`] as one JSON
//! artifact. Loading never trusts the artifact blindly: records whose file
//! has disappeared are pruned, directory aggregates are rebuilt bottom-up,
//! and a corrupt artifact is deleted and reported as
//! [`CacheLoad::Discarded`] rather than as an error.
//!
//! ```rust,no_run
//! use sweepfile_cache::{CacheLoad, SnapshotCache};
//!
//! let cache = SnapshotCache::new("/tmp/scan_cache.json");
//! match cache.load() {
//!     CacheLoad::Loaded { snapshot, pruned } => {
//!         println!("{} files ({} pruned)", snapshot.file_count(), pruned);
//!     }
//!     CacheLoad::Absent => println!("no cache"),
//!     CacheLoad::Discarded { reason } => println!("discarded: {reason}"),
//! }
//! ```

mod error;
mod format;
mod store;

pub use error::CacheError;
pub use format::CACHE_VERSION;
pub use store::{CacheLoad, SnapshotCache};

pub use sweepfile_core::ScanSnapshot;
