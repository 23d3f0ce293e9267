//! Order book aggregation
//!
//! Reduces depth snapshots to per-side totals.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::error::{MarketDataError, Result};
use crate::parser::{OrderBookSnapshot, PriceLevel};
use crate::source::MarketDataSource;

/// Per-side totals of one order book
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSummary {
    pub symbol: String,

    /// Sum of bid quantities
    pub bid_sum: f64,

    /// Sum of ask quantities
    pub ask_sum: f64,

    /// Sum of bid price * quantity
    pub bid_notional: f64,

    /// Sum of ask price * quantity
    pub ask_notional: f64,
}

fn overflow(symbol: &str, what: &str) -> MarketDataError {
    MarketDataError::MalformedResponse(format!("{}: {} overflows a decimal", symbol, what))
}

fn quantity_sum(symbol: &str, levels: &[PriceLevel]) -> Result<Decimal> {
    levels.iter().try_fold(Decimal::ZERO, |acc, l| {
        acc.checked_add(l.quantity)
            .ok_or_else(|| overflow(symbol, "quantity sum"))
    })
}

fn notional_sum(symbol: &str, levels: &[PriceLevel]) -> Result<Decimal> {
    levels.iter().try_fold(Decimal::ZERO, |acc, l| {
        l.price
            .checked_mul(l.quantity)
            .and_then(|notional| acc.checked_add(notional))
            .ok_or_else(|| overflow(symbol, "notional sum"))
    })
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Summarise a single snapshot. Sums are exact decimals, so level order never
/// affects the result. Totals that do not fit a decimal are reported as a
/// malformed response.
pub fn aggregate(book: &OrderBookSnapshot) -> Result<BookSummary> {
    let symbol = book.symbol.as_str();
    Ok(BookSummary {
        symbol: book.symbol.clone(),
        bid_sum: to_f64(quantity_sum(symbol, &book.bids)?),
        ask_sum: to_f64(quantity_sum(symbol, &book.asks)?),
        bid_notional: to_f64(notional_sum(symbol, &book.bids)?),
        ask_notional: to_f64(notional_sum(symbol, &book.asks)?),
    })
}

/// Fetch and summarise the book of every symbol in order, one request at a time.
/// The first failed fetch or overflowing book aborts the batch.
pub async fn aggregate_all(
    source: &dyn MarketDataSource,
    url: &str,
    symbols: &[String],
    limit: u32,
) -> Result<Vec<BookSummary>> {
    let mut summaries = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        let book = source.order_book(url, symbol, limit).await?;
        let summary = aggregate(&book)?;
        info!(
            symbol = %summary.symbol,
            bid_sum = summary.bid_sum,
            ask_sum = summary.ask_sum,
            "Order book aggregated"
        );
        summaries.push(summary);
    }

    Ok(summaries)
}
