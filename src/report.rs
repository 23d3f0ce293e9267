//! One-shot market report
//!
//! Volume leaders, their order book totals, trade leaders and their spreads,
//! each fetched once.

use serde::Serialize;
use tracing::info;

use crate::book::{aggregate_all, BookSummary};
use crate::config::Config;
use crate::error::Result;
use crate::ranker::fetch_and_select;
use crate::source::MarketDataSource;
use crate::tracker::spreads_all;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolSpread {
    pub symbol: String,
    pub spread: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub volume_leaders: Vec<String>,
    pub order_books: Vec<BookSummary>,
    pub trade_leaders: Vec<String>,
    pub spreads: Vec<SymbolSpread>,
}

/// Build the full report; any failed fetch aborts it.
pub async fn build(source: &dyn MarketDataSource, config: &Config) -> Result<Report> {
    let volume = &config.volume_leaders;
    let volume_leaders = fetch_and_select(
        source,
        &volume.url,
        &volume.quote_asset,
        &volume.sort_field,
        volume.top_n,
    )
    .await?;
    info!(symbols = ?volume_leaders, "Volume leaders");

    let order_books = aggregate_all(
        source,
        &config.order_books.url,
        &volume_leaders,
        config.order_books.limit,
    )
    .await?;

    let trades = &config.trade_leaders;
    let trade_leaders = fetch_and_select(
        source,
        &trades.url,
        &trades.quote_asset,
        &trades.sort_field,
        trades.top_n,
    )
    .await?;
    info!(symbols = ?trade_leaders, "Trade leaders");

    let spreads = spreads_all(source, &config.spreads.url, &trade_leaders)
        .await?
        .into_iter()
        .map(|(symbol, spread)| {
            info!(symbol = %symbol, spread, "Spread");
            SymbolSpread { symbol, spread }
        })
        .collect();

    Ok(Report {
        volume_leaders,
        order_books,
        trade_leaders,
        spreads,
    })
}
