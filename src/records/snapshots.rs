use chrono::{DateTime, Utc};

use super::MarketId;

#[derive(Debug, Clone, PartialEq)]
pub struct TickerSnapshot {
    pub market: MarketId,
    pub captured_at: DateTime<Utc>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    Buy,
    Sell,
}

impl BookSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookSide::Buy => "BUY",
            BookSide::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookLevel {
    pub side: BookSide,
    pub quantity: f64,
    pub rate: f64,
}

/// Full capture of one market's book. Never merged with earlier captures.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBookSnapshot {
    pub market: MarketId,
    pub captured_at: DateTime<Utc>,
    pub levels: Vec<BookLevel>,
}

impl OrderBookSnapshot {
    /// Flatten into table rows; buys first, then sells, exchange order kept within a side.
    pub fn rows(&self) -> Vec<OrderBookRow> {
        self.levels
            .iter()
            .map(|level| OrderBookRow {
                market: self.market.clone(),
                captured_at: self.captured_at,
                side: level.side,
                quantity: level.quantity,
                rate: level.rate,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBookRow {
    pub market: MarketId,
    pub captured_at: DateTime<Utc>,
    pub side: BookSide,
    pub quantity: f64,
    pub rate: f64,
}

/// A fill reported by the exchange. `id` is assigned by the exchange and unique across markets.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub id: i64,
    pub market: MarketId,
    pub executed_at: DateTime<Utc>,
    pub quantity: f64,
    pub price: f64,
    pub total: f64,
    pub fill_type: String,
    pub order_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketSummary {
    pub market: MarketId,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub last: Option<f64>,
    pub base_volume: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub open_buy_orders: i32,
    pub open_sell_orders: i32,
    pub prev_day: Option<f64>,
    pub created: Option<DateTime<Utc>>,
    /// Exchange-side timestamp of the summary, stored in the `date` column.
    pub updated_at: DateTime<Utc>,
}

/// Decoded result of one fetch, one variant per snapshot kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Ticker(TickerSnapshot),
    OrderBook(OrderBookSnapshot),
    TradeHistory(Vec<TradeRecord>),
    MarketSummaries(Vec<MarketSummary>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn order_book_rows_share_the_capture_time() {
        let captured_at = Utc.with_ymd_and_hms(2018, 1, 2, 3, 4, 5).unwrap();
        let snapshot = OrderBookSnapshot {
            market: MarketId::new("BTC-LTC"),
            captured_at,
            levels: vec![
                BookLevel {
                    side: BookSide::Buy,
                    quantity: 1.5,
                    rate: 0.01,
                },
                BookLevel {
                    side: BookSide::Sell,
                    quantity: 2.0,
                    rate: 0.02,
                },
            ],
        };

        let rows = snapshot.rows();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.captured_at == captured_at));
        assert_eq!(rows[0].side.as_str(), "BUY");
        assert_eq!(rows[1].side.as_str(), "SELL");
    }
}
