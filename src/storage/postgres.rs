//! Postgres backend.
//!
//! Rows are appended one statement at a time inside a single transaction so a
//! failing row rolls the whole batch back. `orderhistory.id` is the primary key;
//! inserts there ignore conflicts, which covers the window where two tasks pass
//! deduplication with the same trade.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use crate::config::DatabaseConfig;
use crate::error::{BoxError, Result};
use crate::records::{Row, Table};

use super::{BatchTransaction, StorageBackend};

const INSERT_TICKER: &str =
    "INSERT INTO tickers (market, date, bid, ask, last) VALUES ($1, $2, $3, $4, $5)";

const INSERT_ORDER_BOOK: &str =
    "INSERT INTO orderbook (market, date, type, quantity, rate) VALUES ($1, $2, $3, $4, $5)";

const INSERT_TRADE: &str = "INSERT INTO orderhistory \
    (id, market, date, type, quantity, price, total, filltype, ordertype) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
    ON CONFLICT (id) DO NOTHING";

const INSERT_SUMMARY: &str = "INSERT INTO marketsummaries \
    (ask, basevolume, bid, created, high, last, low, market, openbuyorders, opensellorders, prevday, date) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)";

const SELECT_EXISTING_TRADES: &str = "SELECT id FROM orderhistory WHERE id = ANY($1)";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open the shared connection pool. Failing here is fatal for the process.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;
        debug!(
            "Postgres pool ready (max {} connections)",
            config.max_connections
        );
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

pub struct PgBatch {
    tx: Transaction<'static, Postgres>,
    table: Table,
}

#[async_trait]
impl StorageBackend for PgStore {
    type Batch = PgBatch;

    async fn begin_batch(&self, table: Table) -> std::result::Result<PgBatch, BoxError> {
        let tx = self.pool.begin().await?;
        Ok(PgBatch { tx, table })
    }

    async fn lookup_existing_ids(
        &self,
        ids: &[i64],
    ) -> std::result::Result<HashSet<i64>, BoxError> {
        let existing: Vec<i64> = sqlx::query_scalar(SELECT_EXISTING_TRADES)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(existing.into_iter().collect())
    }
}

#[async_trait]
impl BatchTransaction for PgBatch {
    async fn append(&mut self, row: Row<'_>) -> std::result::Result<u64, BoxError> {
        if row.table() != self.table {
            return Err(format!(
                "{} row appended to a {} batch",
                row.table(),
                self.table
            )
            .into());
        }

        let query = match row {
            Row::Ticker(ticker) => sqlx::query(INSERT_TICKER)
                .bind(ticker.market.as_str())
                .bind(ticker.captured_at)
                .bind(ticker.bid)
                .bind(ticker.ask)
                .bind(ticker.last),
            Row::OrderBook(level) => sqlx::query(INSERT_ORDER_BOOK)
                .bind(level.market.as_str())
                .bind(level.captured_at)
                .bind(level.side.as_str())
                .bind(level.quantity)
                .bind(level.rate),
            Row::Trade(trade) => sqlx::query(INSERT_TRADE)
                .bind(trade.id)
                .bind(trade.market.as_str())
                .bind(trade.executed_at)
                .bind(trade.order_type.as_str())
                .bind(trade.quantity)
                .bind(trade.price)
                .bind(trade.total)
                .bind(trade.fill_type.as_str())
                .bind(trade.order_type.as_str()),
            Row::Summary(summary) => sqlx::query(INSERT_SUMMARY)
                .bind(summary.ask)
                .bind(summary.base_volume)
                .bind(summary.bid)
                .bind(summary.created)
                .bind(summary.high)
                .bind(summary.last)
                .bind(summary.low)
                .bind(summary.market.as_str())
                .bind(summary.open_buy_orders)
                .bind(summary.open_sell_orders)
                .bind(summary.prev_day)
                .bind(summary.updated_at),
        };

        let done = query.execute(&mut *self.tx).await?;
        Ok(done.rows_affected())
    }

    async fn commit(self) -> std::result::Result<(), BoxError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> std::result::Result<(), BoxError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
