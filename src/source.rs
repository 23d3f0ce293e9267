//! Market data source
//!
//! The fetch capability the ranker, book aggregator and spread tracker pull from.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{MarketDataError, Result};
use crate::parser::{BookTicker, InstrumentSnapshot, OrderBookSnapshot};

/// Pull-based access to the three REST payloads the pipeline consumes.
///
/// Implementations never retry; a failure is reported once and the caller
/// decides whether it skips a symbol or aborts.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 24h statistics for every listed instrument
    async fn instruments(&self, url: &str) -> Result<Vec<InstrumentSnapshot>>;

    /// Depth snapshot for one symbol, at most `limit` levels per side
    async fn order_book(&self, url: &str, symbol: &str, limit: u32) -> Result<OrderBookSnapshot>;

    /// Current best bid/ask for one symbol
    async fn book_ticker(&self, url: &str, symbol: &str) -> Result<BookTicker>;
}

/// `MarketDataSource` backed by the Binance REST API
#[derive(Debug, Clone)]
pub struct BinanceRestClient {
    client: Client,
}

impl BinanceRestClient {
    /// Create a client whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarketDataError::ConfigError(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, String)]) -> Result<T> {
        debug!(url = %url, params = ?params, "REST request");

        let response = self.client.get(url).query(params).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, body = %body, "REST request rejected");
            return Err(MarketDataError::FetchFailure(format!(
                "{} returned {}: {}",
                url, status, body
            )));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl MarketDataSource for BinanceRestClient {
    async fn instruments(&self, url: &str) -> Result<Vec<InstrumentSnapshot>> {
        self.get_json(url, &[]).await
    }

    async fn order_book(&self, url: &str, symbol: &str, limit: u32) -> Result<OrderBookSnapshot> {
        let params = [("symbol", symbol.to_string()), ("limit", limit.to_string())];
        let mut book: OrderBookSnapshot = self.get_json(url, &params).await?;
        book.symbol = symbol.to_string();
        Ok(book)
    }

    async fn book_ticker(&self, url: &str, symbol: &str) -> Result<BookTicker> {
        let params = [("symbol", symbol.to_string())];
        let mut ticker: BookTicker = self.get_json(url, &params).await?;
        if ticker.symbol.is_empty() {
            ticker.symbol = symbol.to_string();
        }
        Ok(ticker)
    }
}
