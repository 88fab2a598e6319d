//! Fetch → deduplicate → write, fanned out over a market universe under a fixed budget.

use std::sync::Arc;

use crate::fetch::MarketDataSource;
use crate::storage::StorageBackend;

pub mod dedup;
pub mod dispatcher;
pub mod scheduler;
pub mod task;
pub mod writer;

pub use dispatcher::{CycleStats, Dispatcher};
pub use scheduler::{CycleScheduler, SchedulerState};

/// Collaborators shared by every task of a pipeline. Built once, cloned into each task.
pub struct PipelineContext<C, S> {
    pub source: Arc<C>,
    pub store: Arc<S>,
}

impl<C, S> PipelineContext<C, S>
where
    C: MarketDataSource,
    S: StorageBackend,
{
    pub fn new(source: Arc<C>, store: Arc<S>) -> Self {
        Self { source, store }
    }
}

impl<C, S> Clone for PipelineContext<C, S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
        }
    }
}
