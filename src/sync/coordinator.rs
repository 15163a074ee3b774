//! Full-run orchestration: enumerate every trackable library, reconcile
//! each one with retries, and pace requests so the upstreams see a
//! browser-like cadence rather than a burst.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::{MAX_SYNC_ATTEMPTS, SyncConfig};
use crate::source::LibraryIndex;
use crate::store::Repository;
use crate::sync::{Reconciled, Reconciler, SyncError, SyncRunStats};

pub struct Coordinator<R> {
    reconciler: Arc<Reconciler<R>>,
    index: Arc<dyn LibraryIndex>,
    config: SyncConfig,
    cancel: Arc<AtomicBool>,
    run_lock: Mutex<()>,
}

impl<R: Repository> Coordinator<R> {
    pub fn new(
        reconciler: Arc<Reconciler<R>>,
        index: Arc<dyn LibraryIndex>,
        config: SyncConfig,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            reconciler,
            index,
            config,
            cancel,
            run_lock: Mutex::new(()),
        }
    }

    /// Runs one full sync over every enumerable library.
    ///
    /// At most one run may be in flight; a second call while one is active
    /// returns [`SyncError::AlreadyRunning`]. A library that keeps failing
    /// after its retries is counted and the run moves on; only failure to
    /// enumerate the library list at all aborts the run.
    pub async fn run(&self) -> Result<SyncRunStats, SyncError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)?;

        let names = self.index.fetch_library_names().await?;
        let run_time = Utc::now();
        let mut stats = SyncRunStats {
            total: names.len(),
            ..Default::default()
        };
        info!("Starting sync run over {} libraries", stats.total);

        for (i, name) in names.iter().enumerate() {
            if self.cancel.load(Ordering::Relaxed) {
                info!(
                    "Sync cancelled after {} of {} libraries",
                    i, stats.total
                );
                break;
            }

            self.sync_one(name, run_time, &mut stats).await;

            if i + 1 < names.len() {
                self.pace().await;
            }
        }

        info!(
            "Sync run finished: {} updated, {} skipped, {} failed, {} retried",
            stats.updated, stats.skipped, stats.failed, stats.retried
        );
        Ok(stats)
    }

    /// Reconciles one library with bounded retries and linear backoff.
    async fn sync_one(
        &self,
        name: &str,
        run_time: chrono::DateTime<Utc>,
        stats: &mut SyncRunStats,
    ) {
        for attempt in 1..=MAX_SYNC_ATTEMPTS {
            match self.reconciler.reconcile(name, run_time).await {
                Ok(Reconciled::Updated {
                    artifacts_discovered,
                }) => {
                    stats.updated += 1;
                    stats.artifacts_discovered += artifacts_discovered;
                    return;
                }
                Ok(Reconciled::Skipped { reason }) => {
                    info!("Skipped '{}': {}", name, reason);
                    stats.skipped += 1;
                    return;
                }
                Err(e) => {
                    warn!(
                        "Sync of '{}' failed on attempt {}/{}: {}",
                        name, attempt, MAX_SYNC_ATTEMPTS, e
                    );
                    if attempt < MAX_SYNC_ATTEMPTS {
                        stats.retried += 1;
                        let backoff = self.config.backoff_unit_ms * attempt as u64;
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                    }
                }
            }
        }
        stats.failed += 1;
    }

    /// Randomized pause between libraries.
    async fn pace(&self) {
        let pause_ms = {
            let mut rng = rand::rng();
            rng.random_range(self.config.pacing_min_ms..=self.config.pacing_max_ms)
        };
        tokio::time::sleep(Duration::from_millis(pause_ms)).await;
    }
}
