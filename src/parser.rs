//! Parser module for Binance REST payloads
//!
//! Handles deserialization of the 24h ticker list, depth snapshots and book tickers.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::str::FromStr;

/// One entry of the 24h ticker statistics list
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentSnapshot {
    /// Symbol, e.g. `ETHBTC`
    #[serde(rename = "symbol")]
    pub name: String,

    /// Every other column, keyed by the exchange's column name
    #[serde(flatten)]
    pub fields: HashMap<String, serde_json::Value>,
}

impl InstrumentSnapshot {
    /// Numeric value of a column. Binance sends most columns as decimal strings
    /// and a few (`count`) as JSON numbers; both are accepted. `NaN` and
    /// infinities are not numeric here.
    pub fn numeric(&self, field: &str) -> Option<f64> {
        let value = match self.fields.get(field)? {
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            serde_json::Value::Number(n) => n.as_f64(),
            _ => None,
        };
        value.filter(|v| v.is_finite())
    }
}

/// Price level (price, quantity pair)
#[derive(Debug, Clone, PartialEq)]
pub struct PriceLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

/// Order book snapshot from REST API
#[derive(Debug, Clone, Deserialize)]
pub struct OrderBookSnapshot {
    /// Not part of the payload; filled in by the source that requested it
    #[serde(default)]
    pub symbol: String,

    /// Last update ID
    #[serde(rename = "lastUpdateId", default)]
    pub last_update_id: u64,

    /// Bids, best price first
    #[serde(deserialize_with = "deserialize_price_levels")]
    pub bids: Vec<PriceLevel>,

    /// Asks, best price first
    #[serde(deserialize_with = "deserialize_price_levels")]
    pub asks: Vec<PriceLevel>,
}

/// Best bid/ask for a symbol
#[derive(Debug, Clone, Deserialize)]
pub struct BookTicker {
    #[serde(default)]
    pub symbol: String,

    #[serde(rename = "bidPrice", deserialize_with = "deserialize_decimal")]
    pub bid_price: Decimal,

    #[serde(rename = "askPrice", deserialize_with = "deserialize_decimal")]
    pub ask_price: Decimal,
}

impl BookTicker {
    /// Ask minus bid. Not an absolute value: a crossed book yields a negative spread.
    pub fn spread(&self) -> f64 {
        (self.ask_price - self.bid_price).to_f64().unwrap_or(f64::NAN)
    }
}

/// Custom deserializer for Decimal from string
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Decimal::from_str(&s).map_err(serde::de::Error::custom)
}

/// Custom deserializer for price levels from arrays of `[price, quantity, ...]` strings
fn deserialize_price_levels<'de, D>(deserializer: D) -> Result<Vec<PriceLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Vec<serde_json::Value>> = Deserialize::deserialize(deserializer)?;
    raw.into_iter()
        .map(|level| {
            if level.len() < 2 {
                return Err(serde::de::Error::custom("Invalid price level format"));
            }
            Ok(PriceLevel {
                price: decimal_from_value(&level[0]).map_err(serde::de::Error::custom)?,
                quantity: decimal_from_value(&level[1]).map_err(serde::de::Error::custom)?,
            })
        })
        .collect()
}

fn decimal_from_value(value: &serde_json::Value) -> Result<Decimal, String> {
    match value {
        serde_json::Value::String(s) => Decimal::from_str(s).map_err(|e| e.to_string()),
        other => Err(format!("expected decimal string, got {}", other)),
    }
}
