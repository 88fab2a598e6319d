use async_trait::async_trait;

use crate::config::MAX_CONCURRENCY;
use crate::error::FetchError;
use crate::records::{FetchTarget, MarketListing, Snapshot, SnapshotKind};

pub mod client;
pub mod decode;

#[cfg(test)]
pub(crate) mod testing;

pub use client::BittrexClient;

/// Anything that can turn a market and a snapshot kind into structured market data.
///
/// One call is one round trip; implementations never retry or cache.
#[async_trait]
pub trait MarketDataSource: Send + Sync + 'static {
    async fn list_markets(&self) -> Result<Vec<MarketListing>, FetchError>;

    async fn fetch(&self, target: &FetchTarget, kind: SnapshotKind)
        -> Result<Snapshot, FetchError>;
}

#[inline]
pub fn ensure_concurrency_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_CONCURRENCY)
}
