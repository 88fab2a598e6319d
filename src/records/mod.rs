use std::fmt;

use serde::{Deserialize, Serialize};

pub mod snapshots;

pub use snapshots::{
    BookLevel, BookSide, MarketSummary, OrderBookRow, OrderBookSnapshot, Snapshot, TickerSnapshot,
    TradeRecord,
};

/// Exchange name of a tradeable pair, e.g. `BTC-LTC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(String);

impl MarketId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the exchange's market listing.
#[derive(Debug, Clone)]
pub struct MarketListing {
    pub market: MarketId,
    pub base_currency: String,
    pub market_currency: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    Ticker,
    OrderBook,
    TradeHistory,
    MarketSummaries,
}

impl SnapshotKind {
    pub const ALL: [SnapshotKind; 4] = [
        SnapshotKind::Ticker,
        SnapshotKind::OrderBook,
        SnapshotKind::TradeHistory,
        SnapshotKind::MarketSummaries,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Ticker => "ticker",
            SnapshotKind::OrderBook => "order_book",
            SnapshotKind::TradeHistory => "trade_history",
            SnapshotKind::MarketSummaries => "market_summaries",
        }
    }

    /// Expand the market universe into the requests one cycle of this kind issues.
    /// Market summaries cover every market in a single exchange-wide call.
    pub fn targets(&self, universe: &[MarketId]) -> Vec<FetchTarget> {
        match self {
            SnapshotKind::MarketSummaries => vec![FetchTarget::Exchange],
            _ => universe.iter().cloned().map(FetchTarget::Market).collect(),
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchTarget {
    Market(MarketId),
    Exchange,
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchTarget::Market(market) => market.fmt(f),
            FetchTarget::Exchange => f.write_str("<all markets>"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Tickers,
    OrderBook,
    OrderHistory,
    MarketSummaries,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Tickers => "tickers",
            Table::OrderBook => "orderbook",
            Table::OrderHistory => "orderhistory",
            Table::MarketSummaries => "marketsummaries",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Borrowed view of one storable row, handed to a storage transaction.
#[derive(Debug, Clone, Copy)]
pub enum Row<'a> {
    Ticker(&'a TickerSnapshot),
    OrderBook(&'a OrderBookRow),
    Trade(&'a TradeRecord),
    Summary(&'a MarketSummary),
}

impl Row<'_> {
    pub fn table(&self) -> Table {
        match self {
            Row::Ticker(_) => Table::Tickers,
            Row::OrderBook(_) => Table::OrderBook,
            Row::Trade(_) => Table::OrderHistory,
            Row::Summary(_) => Table::MarketSummaries,
        }
    }
}

/// A record type that maps onto exactly one table.
pub trait Record: Send + Sync {
    const TABLE: Table;

    fn row(&self) -> Row<'_>;
}

impl Record for TickerSnapshot {
    const TABLE: Table = Table::Tickers;

    fn row(&self) -> Row<'_> {
        Row::Ticker(self)
    }
}

impl Record for OrderBookRow {
    const TABLE: Table = Table::OrderBook;

    fn row(&self) -> Row<'_> {
        Row::OrderBook(self)
    }
}

impl Record for TradeRecord {
    const TABLE: Table = Table::OrderHistory;

    fn row(&self) -> Row<'_> {
        Row::Trade(self)
    }
}

impl Record for MarketSummary {
    const TABLE: Table = Table::MarketSummaries;

    fn row(&self) -> Row<'_> {
        Row::Summary(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summaries_use_one_exchange_wide_target() {
        let universe = vec![MarketId::new("BTC-LTC"), MarketId::new("BTC-ETH")];

        assert_eq!(
            SnapshotKind::MarketSummaries.targets(&universe),
            vec![FetchTarget::Exchange]
        );
        assert_eq!(
            SnapshotKind::OrderBook.targets(&universe),
            vec![
                FetchTarget::Market(MarketId::new("BTC-LTC")),
                FetchTarget::Market(MarketId::new("BTC-ETH")),
            ]
        );
    }

    #[test]
    fn kind_names_round_trip_through_serde() {
        let kind: SnapshotKind = serde_json::from_str("\"order_book\"").unwrap();
        assert_eq!(kind, SnapshotKind::OrderBook);
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"order_book\"");
    }
}
