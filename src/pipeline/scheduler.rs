use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::watch;
use tokio::time::sleep;

use crate::config::PipelineConfig;
use crate::fetch::MarketDataSource;
use crate::records::{MarketId, SnapshotKind};
use crate::storage::StorageBackend;

use super::{Dispatcher, PipelineContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Dispatching,
    Waiting,
    Stopped,
}

/// Drives back-to-back cycles of one snapshot kind on its own cadence and budget.
pub struct CycleScheduler {
    kind: SnapshotKind,
    interval: Duration,
    dispatcher: Dispatcher,
    state: watch::Sender<SchedulerState>,
}

impl CycleScheduler {
    pub fn new(kind: SnapshotKind, interval: Duration, concurrency: usize) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            kind,
            interval,
            dispatcher: Dispatcher::new(concurrency),
            state,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.kind, config.interval(), config.concurrency)
    }

    pub fn kind(&self) -> SnapshotKind {
        self.kind
    }

    /// Observe state transitions. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    fn transition(&self, next: SchedulerState) {
        let previous = self.state.send_replace(next);
        debug!("{}: {:?} -> {:?}", self.kind, previous, next);
    }

    /// Poll until `shutdown` flips to `true` or its sender goes away.
    ///
    /// A shutdown during `Waiting` takes effect immediately; during `Dispatching`
    /// the running cycle is allowed to drain first. Returns the number of cycles run.
    pub async fn run<C, S>(
        self,
        ctx: PipelineContext<C, S>,
        universe: Arc<[MarketId]>,
        mut shutdown: watch::Receiver<bool>,
    ) -> u64
    where
        C: MarketDataSource,
        S: StorageBackend,
    {
        let targets = self.kind.targets(&universe);
        info!(
            "{}: polling {} targets every {:?} with {} slots",
            self.kind,
            targets.len(),
            self.interval,
            self.dispatcher.limit()
        );

        let mut cycles = 0u64;
        loop {
            if *shutdown.borrow() {
                break;
            }

            self.transition(SchedulerState::Dispatching);
            self.dispatcher.run_cycle(&ctx, &targets, self.kind).await;
            cycles += 1;

            self.transition(SchedulerState::Waiting);
            tokio::select! {
                _ = sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.transition(SchedulerState::Stopped);
        info!("{}: stopped after {} cycles", self.kind, cycles);
        cycles
    }
}
