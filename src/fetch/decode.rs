use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};

use crate::error::FetchError;
use crate::records::{
    BookLevel, BookSide, MarketId, MarketListing, MarketSummary, OrderBookSnapshot, TickerSnapshot,
    TradeRecord,
};

/// `{success, message, result}` wrapper shared by every public endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub result: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_result(self, url: &str) -> Result<T, FetchError> {
        if !self.success {
            return Err(FetchError::Rejected {
                url: url.to_string(),
                message: self.message.unwrap_or_default(),
            });
        }
        self.result.ok_or_else(|| FetchError::Rejected {
            url: url.to_string(),
            message: "response carried no result".to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MarketEntry {
    market_name: String,
    #[serde(default)]
    base_currency: String,
    #[serde(default)]
    market_currency: String,
    #[serde(default)]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TickerPayload {
    bid: Option<f64>,
    ask: Option<f64>,
    last: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OrderBookPayload {
    #[serde(default)]
    buy: Option<Vec<LevelPayload>>,
    #[serde(default)]
    sell: Option<Vec<LevelPayload>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LevelPayload {
    quantity: f64,
    rate: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TradePayload {
    id: i64,
    #[serde(deserialize_with = "exchange_time")]
    time_stamp: DateTime<Utc>,
    quantity: f64,
    price: f64,
    total: f64,
    fill_type: String,
    order_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SummaryPayload {
    market_name: String,
    high: Option<f64>,
    low: Option<f64>,
    last: Option<f64>,
    base_volume: Option<f64>,
    #[serde(deserialize_with = "exchange_time")]
    time_stamp: DateTime<Utc>,
    bid: Option<f64>,
    ask: Option<f64>,
    #[serde(default)]
    open_buy_orders: Option<i32>,
    #[serde(default)]
    open_sell_orders: Option<i32>,
    prev_day: Option<f64>,
    #[serde(default, deserialize_with = "optional_exchange_time")]
    created: Option<DateTime<Utc>>,
}

fn decode_envelope<T: DeserializeOwned>(body: &[u8], url: &str) -> Result<T, FetchError> {
    let envelope: ApiEnvelope<T> =
        serde_json::from_slice(body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })?;
    envelope.into_result(url)
}

pub fn decode_markets(body: &[u8], url: &str) -> Result<Vec<MarketListing>, FetchError> {
    let entries: Vec<MarketEntry> = decode_envelope(body, url)?;
    Ok(entries
        .into_iter()
        .map(|entry| MarketListing {
            market: MarketId::new(entry.market_name),
            base_currency: entry.base_currency,
            market_currency: entry.market_currency,
            is_active: entry.is_active,
        })
        .collect())
}

pub fn decode_ticker(
    body: &[u8],
    url: &str,
    market: &MarketId,
    captured_at: DateTime<Utc>,
) -> Result<TickerSnapshot, FetchError> {
    let payload: TickerPayload = decode_envelope(body, url)?;
    Ok(TickerSnapshot {
        market: market.clone(),
        captured_at,
        bid: payload.bid,
        ask: payload.ask,
        last: payload.last,
    })
}

pub fn decode_order_book(
    body: &[u8],
    url: &str,
    market: &MarketId,
    captured_at: DateTime<Utc>,
) -> Result<OrderBookSnapshot, FetchError> {
    let payload: OrderBookPayload = decode_envelope(body, url)?;

    let side = |levels: Option<Vec<LevelPayload>>, side: BookSide| {
        levels.unwrap_or_default().into_iter().map(move |level| BookLevel {
            side,
            quantity: level.quantity,
            rate: level.rate,
        })
    };

    let levels = side(payload.buy, BookSide::Buy)
        .chain(side(payload.sell, BookSide::Sell))
        .collect();

    Ok(OrderBookSnapshot {
        market: market.clone(),
        captured_at,
        levels,
    })
}

pub fn decode_trade_history(
    body: &[u8],
    url: &str,
    market: &MarketId,
) -> Result<Vec<TradeRecord>, FetchError> {
    let trades: Vec<TradePayload> = decode_envelope(body, url)?;
    Ok(trades
        .into_iter()
        .map(|trade| TradeRecord {
            id: trade.id,
            market: market.clone(),
            executed_at: trade.time_stamp,
            quantity: trade.quantity,
            price: trade.price,
            total: trade.total,
            fill_type: trade.fill_type,
            order_type: trade.order_type,
        })
        .collect())
}

pub fn decode_market_summaries(body: &[u8], url: &str) -> Result<Vec<MarketSummary>, FetchError> {
    let summaries: Vec<SummaryPayload> = decode_envelope(body, url)?;
    Ok(summaries
        .into_iter()
        .map(|summary| MarketSummary {
            market: MarketId::new(summary.market_name),
            high: summary.high,
            low: summary.low,
            last: summary.last,
            base_volume: summary.base_volume,
            bid: summary.bid,
            ask: summary.ask,
            open_buy_orders: summary.open_buy_orders.unwrap_or_default(),
            open_sell_orders: summary.open_sell_orders.unwrap_or_default(),
            prev_day: summary.prev_day,
            created: summary.created,
            updated_at: summary.time_stamp,
        })
        .collect())
}

/// Parse the exchange's zone-less timestamps (`2017-11-15T12:34:56.78`) as UTC.
pub fn parse_exchange_time(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(with_offset.with_timezone(&Utc));
    }

    let naive = trimmed.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|parsed| parsed.and_utc())
}

fn exchange_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_exchange_time(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid exchange timestamp `{raw}`")))
}

fn optional_exchange_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_exchange_time(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid exchange timestamp `{raw}`"))),
        None => Ok(None),
    }
}
