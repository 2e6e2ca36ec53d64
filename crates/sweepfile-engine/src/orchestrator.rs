//! Scan lifecycle, publication of derived views, and the file operations
//! that update them.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sweepfile_cache::{CacheLoad, SnapshotCache};
use sweepfile_core::{FileRecord, ScanError, ScanSnapshot, ScanState};
use sweepfile_ops::{
    DeleteOptions, DeleteResult, MoveResult, OperationComplete, OperationError, RenameResult,
    start_deletion, start_move, start_rename,
};
use sweepfile_scan::TreeWalker;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::views::{DerivedViews, Pipeline};

/// Shared handle to the published views.
pub type ViewsHandle = Option<Arc<DerivedViews>>;

/// Outcome of a delete request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSummary {
    pub deleted_count: usize,
    pub failed_count: usize,
    /// Sizes of the deleted files only.
    pub freed_bytes: u64,
    pub deleted_paths: Vec<PathBuf>,
    pub failures: Vec<OperationError>,
}

impl DeleteSummary {
    fn from_complete(complete: OperationComplete) -> Self {
        Self {
            deleted_count: complete.succeeded(),
            failed_count: complete.failed(),
            freed_bytes: complete.bytes_processed,
            deleted_paths: complete.completed,
            failures: complete.errors,
        }
    }
}

/// The scan currently allowed to publish.
#[derive(Debug, Default)]
struct ActiveScan {
    generation: u64,
    cancel: Option<CancellationToken>,
}

struct Inner {
    config: EngineConfig,
    pipeline: Pipeline,
    cache: Option<SnapshotCache>,
    active: Mutex<ActiveScan>,
    state_tx: watch::Sender<ScanState>,
    views_tx: watch::Sender<ViewsHandle>,
    delete_tx: broadcast::Sender<DeleteSummary>,
}

/// Single owner of scan state and derived views.
///
/// Observers subscribe to state and view updates; every publication of
/// views is one [`DerivedViews`] value, so an observer never sees one list
/// updated without the others. Cloning yields another handle to the same
/// orchestrator.
#[derive(Clone)]
pub struct ScanOrchestrator {
    inner: Arc<Inner>,
}

impl ScanOrchestrator {
    pub fn new(config: EngineConfig) -> Self {
        let (state_tx, _) = watch::channel(ScanState::Idle);
        let (views_tx, _) = watch::channel(None);
        let (delete_tx, _) = broadcast::channel(16);

        let cache = config.snapshot_cache();
        if config.cache_enabled && cache.is_none() {
            warn!("No cache location available, snapshot caching disabled");
        }

        Self {
            inner: Arc::new(Inner {
                pipeline: Pipeline::new(&config),
                config,
                cache,
                active: Mutex::new(ActiveScan::default()),
                state_tx,
                views_tx,
                delete_tx,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Current scan state.
    pub fn state(&self) -> ScanState {
        self.inner.state_tx.borrow().clone()
    }

    /// Most recently published views.
    pub fn views(&self) -> ViewsHandle {
        self.inner.views_tx.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ScanState> {
        self.inner.state_tx.subscribe()
    }

    pub fn subscribe_views(&self) -> watch::Receiver<ViewsHandle> {
        self.inner.views_tx.subscribe()
    }

    pub fn subscribe_deletes(&self) -> broadcast::Receiver<DeleteSummary> {
        self.inner.delete_tx.subscribe()
    }

    /// Start scanning `root`, superseding any scan in flight.
    ///
    /// The state moves to `Scanning { files_found: 0 }` immediately. The
    /// returned handle resolves once the scan has published (or been
    /// dropped as superseded).
    pub fn start_scan(&self, root: impl Into<PathBuf>) -> JoinHandle<()> {
        let root = root.into();
        let cancel = CancellationToken::new();

        let generation = {
            let mut active = self.inner.lock_active();
            if let Some(previous) = active.cancel.take() {
                previous.cancel();
            }
            active.generation += 1;
            active.cancel = Some(cancel.clone());
            self.inner
                .state_tx
                .send_replace(ScanState::Scanning { files_found: 0 });
            active.generation
        };

        info!(root = %root.display(), generation, "Scan started");

        let this = self.clone();
        tokio::spawn(async move {
            let result = this.run_scan(root, generation, cancel).await;
            this.finish_scan(generation, result).await;
        })
    }

    /// Cancel the scan in flight. Published views are left as they were.
    pub fn cancel_scan(&self) {
        let mut active = self.inner.lock_active();
        if let Some(cancel) = active.cancel.take() {
            cancel.cancel();
            active.generation += 1;
            self.inner.state_tx.send_replace(ScanState::Idle);
            debug!("Scan cancelled");
        }
    }

    /// Publish the cached snapshot, if a valid one exists.
    ///
    /// The restore publishes only if nothing else changed the views while
    /// the cache was loading: a scan started (or finished) in the meantime,
    /// or a file operation republished, wins over the cached snapshot.
    pub async fn restore_cached(&self) -> Result<CacheLoad, EngineError> {
        let Some(cache) = self.inner.cache.clone() else {
            return Ok(CacheLoad::Absent);
        };
        let (generation, before) = {
            let active = self.inner.lock_active();
            if active.cancel.is_some() {
                return Err(EngineError::ScanInProgress);
            }
            (active.generation, self.views())
        };

        let load = tokio::task::spawn_blocking(move || cache.load()).await?;
        let CacheLoad::Loaded { snapshot, pruned } = load else {
            return Ok(load);
        };

        let pipeline = self.inner.pipeline.clone();
        let copy = snapshot.clone();
        let views = tokio::task::spawn_blocking(move || pipeline.run(copy)).await??;

        {
            let active = self.inner.lock_active();
            if active.cancel.is_some() {
                return Err(EngineError::ScanInProgress);
            }
            let unchanged = match (&before, &*self.inner.views_tx.borrow()) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };
            if active.generation != generation || !unchanged {
                debug!("Dropping cached snapshot, views changed during restore");
                return Err(EngineError::Superseded);
            }
            self.inner.views_tx.send_replace(Some(Arc::new(views)));
            self.inner.state_tx.send_replace(ScanState::Done);
        }

        info!(files = snapshot.file_count(), pruned, "Restored cached snapshot");
        if pruned > 0 {
            self.save_cache(snapshot.clone()).await;
        }
        Ok(CacheLoad::Loaded { snapshot, pruned })
    }

    /// Delete `records` and remove exactly the deleted paths from every view.
    ///
    /// Each file is attempted independently. Totals are recomputed from the
    /// filtered views, and the summary is also broadcast to subscribers.
    pub async fn delete_files(&self, records: &[FileRecord]) -> Result<DeleteSummary, EngineError> {
        let items = records.iter().map(|r| (r.path.clone(), r.size)).collect();
        let options = DeleteOptions {
            use_trash: self.inner.config.use_trash,
        };

        let complete = await_completion(start_deletion(items, options), |result| match result {
            DeleteResult::Complete(c) => Some(c),
            DeleteResult::Progress(_) => None,
        })
        .await?;
        let summary = DeleteSummary::from_complete(complete);

        info!(
            deleted = summary.deleted_count,
            failed = summary.failed_count,
            freed = summary.freed_bytes,
            "Delete finished"
        );

        if summary.deleted_count > 0 {
            let removed: HashSet<PathBuf> = summary.deleted_paths.iter().cloned().collect();
            self.republish(|views| Ok(views.without_paths(&removed))).await?;
        }

        let _ = self.inner.delete_tx.send(summary.clone());
        Ok(summary)
    }

    /// Rename the file behind `record` within its directory.
    ///
    /// Returns the updated record, without a duplicate group; views are
    /// republished with it.
    pub async fn rename_file(
        &self,
        record: &FileRecord,
        new_name: &str,
    ) -> Result<FileRecord, EngineError> {
        let rx = start_rename(record.path.clone(), new_name.to_string());
        let complete = await_completion(rx, |result| match result {
            RenameResult::Complete(c) => Some(c),
            RenameResult::Progress(_) => None,
        })
        .await?;
        let new_path = single_path(complete, EngineError::Rename)?;
        let renamed = record.relocated(new_path).without_duplicate_group();

        let pipeline = &self.inner.pipeline;
        self.republish(|views| views.with_renamed(&record.path, &renamed, pipeline)).await?;
        Ok(renamed)
    }

    /// Move the file behind `record` into `target_dir`, keeping its name.
    ///
    /// Returns the updated record, without a duplicate group. When
    /// `target_dir` is outside the scanned tree the file leaves the views.
    pub async fn move_file(
        &self,
        record: &FileRecord,
        target_dir: impl Into<PathBuf>,
    ) -> Result<FileRecord, EngineError> {
        let rx = start_move(record.path.clone(), target_dir.into());
        let complete = await_completion(rx, |result| match result {
            MoveResult::Complete(c) => Some(c),
            MoveResult::Progress(_) => None,
        })
        .await?;
        let new_path = single_path(complete, EngineError::Move)?;
        let moved = record.relocated(new_path).without_duplicate_group();

        info!(from = %record.path.display(), to = %moved.path.display(), "Move finished");

        let pipeline = &self.inner.pipeline;
        self.republish(|views| views.with_moved(&record.path, &moved, pipeline)).await?;
        Ok(moved)
    }

    /// Replace the published views with `update(current)` and persist the
    /// result. Does nothing when no views are published.
    async fn republish(
        &self,
        update: impl FnOnce(&DerivedViews) -> Result<DerivedViews, EngineError>,
    ) -> Result<(), EngineError> {
        let updated = {
            let _active = self.inner.lock_active();
            let current = self.inner.views_tx.borrow().clone();
            match current {
                Some(views) => {
                    let next = Arc::new(update(&views)?);
                    self.inner.views_tx.send_replace(Some(next.clone()));
                    Some(next)
                }
                None => None,
            }
        };
        if let Some(views) = updated {
            self.save_cache(views.snapshot.clone()).await;
        }
        Ok(())
    }

    async fn run_scan(
        &self,
        root: PathBuf,
        generation: u64,
        cancel: CancellationToken,
    ) -> Result<DerivedViews, EngineError> {
        let config = self.inner.config.scan_config(&root)?;

        let inner = self.inner.clone();
        let output = tokio::task::spawn_blocking(move || {
            TreeWalker::new().walk(&config, &cancel, |progress| {
                inner.publish_if_current(generation, |inner| {
                    inner.state_tx.send_replace(ScanState::Scanning {
                        files_found: progress.files_scanned,
                    });
                });
            })
        })
        .await??;

        for warning in &output.warnings {
            debug!(path = %warning.path.display(), message = %warning.message, "Scan warning");
        }

        let pipeline = self.inner.pipeline.clone();
        let views = tokio::task::spawn_blocking(move || pipeline.run(output.snapshot)).await??;
        Ok(views)
    }

    async fn finish_scan(&self, generation: u64, result: Result<DerivedViews, EngineError>) {
        match result {
            Ok(views) => {
                let views = Arc::new(views);
                let published = self.inner.publish_if_current(generation, |inner| {
                    inner.views_tx.send_replace(Some(views.clone()));
                    inner.state_tx.send_replace(ScanState::Done);
                });
                if published {
                    info!(
                        files = views.stats.total_files,
                        bytes = views.stats.total_size,
                        "Scan complete"
                    );
                    self.save_cache(views.snapshot.clone()).await;
                } else {
                    debug!(generation, "Dropping superseded scan result");
                }
            }
            Err(EngineError::Scan(ScanError::Cancelled)) => {
                debug!(generation, "Scan stopped by cancellation");
            }
            Err(e) => {
                warn!(error = %e, "Scan failed");
                self.inner.publish_if_current(generation, |inner| {
                    inner.state_tx.send_replace(ScanState::Error {
                        message: e.to_string(),
                    });
                });
            }
        }
    }

    async fn save_cache(&self, snapshot: ScanSnapshot) {
        let Some(cache) = self.inner.cache.clone() else {
            return;
        };
        match tokio::task::spawn_blocking(move || cache.save(&snapshot)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to save snapshot cache"),
            Err(e) => warn!(error = %e, "Cache save task failed"),
        }
    }
}

/// Drain an operation channel and return its completion.
async fn await_completion<R>(
    mut rx: mpsc::Receiver<R>,
    completion: impl Fn(R) -> Option<OperationComplete>,
) -> Result<OperationComplete, EngineError> {
    let mut complete = None;
    while let Some(result) = rx.recv().await {
        if let Some(c) = completion(result) {
            complete = Some(c);
        }
    }
    complete.ok_or(EngineError::OperationAborted)
}

/// The one path a single-file operation produced, or its error.
fn single_path(
    complete: OperationComplete,
    failed: fn(OperationError) -> EngineError,
) -> Result<PathBuf, EngineError> {
    if let Some(error) = complete.errors.into_iter().next() {
        return Err(failed(error));
    }
    complete
        .completed
        .into_iter()
        .next()
        .ok_or(EngineError::OperationAborted)
}

impl Inner {
    fn lock_active(&self) -> MutexGuard<'_, ActiveScan> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `publish` only if `generation` is still the active scan, and
    /// retire the scan when it reaches a terminal state.
    fn publish_if_current(&self, generation: u64, publish: impl FnOnce(&Inner)) -> bool {
        let mut active = self.lock_active();
        if active.generation != generation || active.cancel.is_none() {
            return false;
        }
        publish(self);
        if self.state_tx.borrow().is_terminal() {
            active.cancel = None;
        }
        true
    }
}
