//! In-memory backend for tests.
//!
//! Trade ids are unique like the `orderhistory` primary key: an append whose id is
//! committed, or held by another open batch, keeps nothing and bumps `conflicts`.
//! A held id stays taken even if its batch later rolls back.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Barrier;

use crate::error::BoxError;
use crate::records::{MarketSummary, OrderBookRow, Row, Table, TickerSnapshot, TradeRecord};

use super::{BatchTransaction, StorageBackend};

#[derive(Debug, Default, Clone)]
pub(crate) struct Tables {
    pub tickers: Vec<TickerSnapshot>,
    pub order_book: Vec<OrderBookRow>,
    pub trades: Vec<TradeRecord>,
    pub summaries: Vec<MarketSummary>,
}

impl Tables {
    fn push(&mut self, row: Row<'_>) {
        match row {
            Row::Ticker(ticker) => self.tickers.push(ticker.clone()),
            Row::OrderBook(level) => self.order_book.push(level.clone()),
            Row::Trade(trade) => self.trades.push(trade.clone()),
            Row::Summary(summary) => self.summaries.push(summary.clone()),
        }
    }

    fn absorb(&mut self, other: Tables) {
        self.tickers.extend(other.tickers);
        self.order_book.extend(other.order_book);
        self.trades.extend(other.trades);
        self.summaries.extend(other.summaries);
    }
}

#[derive(Debug, Default)]
struct State {
    committed: Tables,
    claimed: HashSet<i64>,
    lookup_gate: Option<Arc<Barrier>>,
    conflicts: usize,
    fail_on_append: Option<usize>,
    fail_lookups: bool,
    lookups: usize,
    begun: usize,
    commits: usize,
    rollbacks: usize,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Make the `nth` append (1-based) of every batch fail.
    pub(crate) fn fail_on_append(&self, nth: usize) {
        self.state.lock().unwrap().fail_on_append = Some(nth);
    }

    pub(crate) fn fail_lookups(&self) {
        self.state.lock().unwrap().fail_lookups = true;
    }

    /// Hold every lookup until `parties` lookups have read the table.
    pub(crate) fn gate_lookups(&self, parties: usize) {
        self.state.lock().unwrap().lookup_gate = Some(Arc::new(Barrier::new(parties)));
    }

    pub(crate) fn seed_trades(&self, trades: &[TradeRecord]) {
        self.state
            .lock()
            .unwrap()
            .committed
            .trades
            .extend_from_slice(trades);
    }

    pub(crate) fn tables(&self) -> Tables {
        self.state.lock().unwrap().committed.clone()
    }

    /// Trade rows dropped because their id was already taken.
    pub(crate) fn conflicts(&self) -> usize {
        self.state.lock().unwrap().conflicts
    }

    pub(crate) fn lookups(&self) -> usize {
        self.state.lock().unwrap().lookups
    }

    pub(crate) fn batches_begun(&self) -> usize {
        self.state.lock().unwrap().begun
    }

    pub(crate) fn commits(&self) -> usize {
        self.state.lock().unwrap().commits
    }

    pub(crate) fn rollbacks(&self) -> usize {
        self.state.lock().unwrap().rollbacks
    }
}

pub(crate) struct MemoryBatch {
    state: Arc<Mutex<State>>,
    table: Table,
    pending: Tables,
    claims: Vec<i64>,
    appended: usize,
}

impl MemoryBatch {
    fn release_claims(&self, state: &mut State) {
        for id in &self.claims {
            state.claimed.remove(id);
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryStore {
    type Batch = MemoryBatch;

    async fn begin_batch(&self, table: Table) -> Result<MemoryBatch, BoxError> {
        self.state.lock().unwrap().begun += 1;
        Ok(MemoryBatch {
            state: Arc::clone(&self.state),
            table,
            pending: Tables::default(),
            claims: Vec::new(),
            appended: 0,
        })
    }

    async fn lookup_existing_ids(&self, ids: &[i64]) -> Result<HashSet<i64>, BoxError> {
        let (existing, gate) = {
            let mut state = self.state.lock().unwrap();
            state.lookups += 1;
            if state.fail_lookups {
                return Err("lookup failure injected".into());
            }
            let wanted: HashSet<i64> = ids.iter().copied().collect();
            let existing: HashSet<i64> = state
                .committed
                .trades
                .iter()
                .map(|trade| trade.id)
                .filter(|id| wanted.contains(id))
                .collect();
            (existing, state.lookup_gate.clone())
        };

        if let Some(gate) = gate {
            gate.wait().await;
        }
        Ok(existing)
    }
}

#[async_trait]
impl BatchTransaction for MemoryBatch {
    async fn append(&mut self, row: Row<'_>) -> Result<u64, BoxError> {
        self.appended += 1;
        let mut state = self.state.lock().unwrap();
        if state.fail_on_append == Some(self.appended) {
            return Err(format!("append {} failure injected", self.appended).into());
        }
        if row.table() != self.table {
            return Err(format!("{} row appended to a {} batch", row.table(), self.table).into());
        }
        if let Row::Trade(trade) = row {
            let taken = state.claimed.contains(&trade.id)
                || state.committed.trades.iter().any(|kept| kept.id == trade.id);
            if taken {
                state.conflicts += 1;
                return Ok(0);
            }
            state.claimed.insert(trade.id);
            self.claims.push(trade.id);
        }
        self.pending.push(row);
        Ok(1)
    }

    async fn commit(self) -> Result<(), BoxError> {
        let mut state = self.state.lock().unwrap();
        self.release_claims(&mut state);
        state.committed.absorb(self.pending);
        state.commits += 1;
        Ok(())
    }

    async fn rollback(self) -> Result<(), BoxError> {
        let mut state = self.state.lock().unwrap();
        self.release_claims(&mut state);
        state.rollbacks += 1;
        Ok(())
    }
}
