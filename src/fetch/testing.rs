//! Scripted market data source for pipeline tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::records::{FetchTarget, MarketListing, Snapshot, SnapshotKind};

pub(crate) enum Scripted {
    Snapshot(Snapshot),
    Rejected(String),
}

/// Answers fetches from a fixed script and tracks how many are in flight at once.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    responses: Mutex<HashMap<(FetchTarget, SnapshotKind), Scripted>>,
    latency: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub(crate) fn respond(&self, target: FetchTarget, kind: SnapshotKind, response: Scripted) {
        self.responses
            .lock()
            .unwrap()
            .insert((target, kind), response);
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl super::MarketDataSource for ScriptedSource {
    async fn list_markets(&self) -> Result<Vec<MarketListing>, FetchError> {
        Ok(Vec::new())
    }

    async fn fetch(
        &self,
        target: &FetchTarget,
        kind: SnapshotKind,
    ) -> Result<Snapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let url = format!("scripted://{kind}/{target}");
        let result = match self.responses.lock().unwrap().get(&(target.clone(), kind)) {
            Some(Scripted::Snapshot(snapshot)) => Ok(snapshot.clone()),
            Some(Scripted::Rejected(message)) => Err(FetchError::Rejected {
                url,
                message: message.clone(),
            }),
            None => Err(FetchError::Rejected {
                url,
                message: "no scripted response".to_string(),
            }),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
