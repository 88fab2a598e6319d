use std::sync::Arc;

use log::{debug, error, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::fetch::{ensure_concurrency_limit, MarketDataSource};
use crate::records::{FetchTarget, SnapshotKind};
use crate::storage::StorageBackend;

use super::task::run_task;
use super::PipelineContext;

/// Tally of one cycle. Only used for a debug line; there is no cycle-level verdict.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub tasks: usize,
    pub failed: usize,
    pub rows_written: u64,
}

/// Runs one task per target with at most `limit` of them in flight.
pub struct Dispatcher {
    budget: Arc<Semaphore>,
    limit: usize,
}

impl Dispatcher {
    pub fn new(limit: usize) -> Self {
        let limit = ensure_concurrency_limit(limit);
        Self {
            budget: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn idle_slots(&self) -> usize {
        self.budget.available_permits()
    }

    /// Dispatch `kind` for every target and wait until each task has given its slot back.
    ///
    /// Spawning blocks while the budget is exhausted. A task's slot is tied to the
    /// task itself, so it comes back on success, on error and on panic alike.
    pub async fn run_cycle<C, S>(
        &self,
        ctx: &PipelineContext<C, S>,
        targets: &[FetchTarget],
        kind: SnapshotKind,
    ) -> CycleStats
    where
        C: MarketDataSource,
        S: StorageBackend,
    {
        let mut stats = CycleStats::default();
        let mut tasks = JoinSet::new();

        for target in targets {
            let permit = match Arc::clone(&self.budget).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    error!("{kind}: concurrency budget closed, abandoning cycle");
                    break;
                }
            };

            let ctx = ctx.clone();
            let target = target.clone();
            tasks.spawn(async move {
                let _slot = permit;
                let outcome = run_task(&ctx, &target, kind).await;
                match &outcome {
                    Ok(rows) => debug!("{kind} {target}: saved {rows} rows"),
                    Err(err) => warn!("{kind} {target}: {err}"),
                }
                outcome
            });
            stats.tasks += 1;
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(rows)) => stats.rows_written += rows,
                Ok(Err(_)) => stats.failed += 1,
                Err(err) => {
                    error!("{kind}: ingestion task lost: {err}");
                    stats.failed += 1;
                }
            }
        }

        debug!(
            "{kind}: cycle done, {} tasks, {} failed, {} rows",
            stats.tasks, stats.failed, stats.rows_written
        );
        stats
    }
}
