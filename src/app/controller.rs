use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use log::{error, info};
use tokio::sync::watch;

use crate::config::PipelineConfig;
use crate::error::{AppError, Result};
use crate::fetch::MarketDataSource;
use crate::pipeline::{CycleScheduler, PipelineContext};
use crate::records::MarketId;
use crate::storage::StorageBackend;

/// Owns one scheduler per enabled pipeline and the shutdown switch they share.
pub struct IngestController<C, S> {
    ctx: PipelineContext<C, S>,
    universe: Arc<[MarketId]>,
    schedulers: Vec<CycleScheduler>,
}

impl<C, S> IngestController<C, S>
where
    C: MarketDataSource,
    S: StorageBackend,
{
    pub fn new<'a>(
        ctx: PipelineContext<C, S>,
        universe: Vec<MarketId>,
        pipelines: impl IntoIterator<Item = &'a PipelineConfig>,
    ) -> Result<Self> {
        let schedulers: Vec<_> = pipelines
            .into_iter()
            .map(CycleScheduler::from_config)
            .collect();
        if schedulers.is_empty() {
            return Err(AppError::message("No pipelines enabled."));
        }

        Ok(Self {
            ctx,
            universe: Arc::from(universe),
            schedulers,
        })
    }

    /// Run every scheduler until `signal` resolves, then stop them and wait for
    /// their in-flight cycles to drain.
    pub async fn run_until<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let running: Vec<_> = self
            .schedulers
            .into_iter()
            .map(|scheduler| {
                let kind = scheduler.kind();
                let handle = tokio::spawn(scheduler.run(
                    self.ctx.clone(),
                    Arc::clone(&self.universe),
                    shutdown_rx.clone(),
                ));
                (kind, handle)
            })
            .collect();
        drop(shutdown_rx);

        signal.await;
        info!("Shutdown requested; waiting for in-flight cycles");
        let _ = shutdown_tx.send(true);

        let (kinds, handles): (Vec<_>, Vec<_>) = running.into_iter().unzip();
        let mut lost = None;
        for (kind, joined) in kinds.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(cycles) => info!("{kind}: finished {cycles} cycles"),
                Err(err) => {
                    error!("{kind}: scheduler task failed: {err}");
                    lost.get_or_insert(err);
                }
            }
        }

        match lost {
            Some(err) => Err(AppError::from(err)),
            None => Ok(()),
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Cannot listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Cannot listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
