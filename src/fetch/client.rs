use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;

use crate::config::ExchangeConfig;
use crate::error::{Context, FetchError, Result};
use crate::records::{FetchTarget, MarketListing, Snapshot, SnapshotKind};

use super::decode;
use super::MarketDataSource;

/// Client for the exchange's public v1.1 REST API.
#[derive(Clone)]
pub struct BittrexClient {
    client: Client,
    base_url: String,
}

impl BittrexClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .context("Failed to construct exchange HTTP client")?;
        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn markets_url(&self) -> String {
        format!("{}/getmarkets", self.base_url)
    }

    /// URL that serves `kind` for `target`.
    pub fn snapshot_url(
        &self,
        target: &FetchTarget,
        kind: SnapshotKind,
    ) -> std::result::Result<String, FetchError> {
        let endpoint = match kind {
            SnapshotKind::MarketSummaries => {
                return Ok(format!("{}/getmarketsummaries", self.base_url))
            }
            SnapshotKind::Ticker => "getticker",
            SnapshotKind::OrderBook => "getorderbook",
            SnapshotKind::TradeHistory => "getmarkethistory",
        };

        let FetchTarget::Market(market) = target else {
            return Err(FetchError::MissingMarket { kind });
        };

        let mut url = format!("{}/{}?market={}", self.base_url, endpoint, market);
        if kind == SnapshotKind::OrderBook {
            url.push_str("&type=both");
        }
        Ok(url)
    }

    async fn get_body(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl MarketDataSource for BittrexClient {
    async fn list_markets(&self) -> std::result::Result<Vec<MarketListing>, FetchError> {
        let url = self.markets_url();
        let body = self.get_body(&url).await?;
        decode::decode_markets(&body, &url)
    }

    async fn fetch(
        &self,
        target: &FetchTarget,
        kind: SnapshotKind,
    ) -> std::result::Result<Snapshot, FetchError> {
        let url = self.snapshot_url(target, kind)?;
        let body = self.get_body(&url).await?;
        let captured_at = Utc::now();

        let snapshot = match (kind, target) {
            (SnapshotKind::MarketSummaries, _) => {
                Snapshot::MarketSummaries(decode::decode_market_summaries(&body, &url)?)
            }
            (SnapshotKind::Ticker, FetchTarget::Market(market)) => {
                Snapshot::Ticker(decode::decode_ticker(&body, &url, market, captured_at)?)
            }
            (SnapshotKind::OrderBook, FetchTarget::Market(market)) => Snapshot::OrderBook(
                decode::decode_order_book(&body, &url, market, captured_at)?,
            ),
            (SnapshotKind::TradeHistory, FetchTarget::Market(market)) => {
                Snapshot::TradeHistory(decode::decode_trade_history(&body, &url, market)?)
            }
            (kind, FetchTarget::Exchange) => return Err(FetchError::MissingMarket { kind }),
        };
        Ok(snapshot)
    }
}
