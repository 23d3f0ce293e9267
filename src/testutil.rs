//! Shared test fixtures and helpers.
//!
//! Provides an in-memory `MarketDataSource` with scripted responses so the
//! ranker, aggregator, tracker and scheduler can be tested without a network.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{MarketDataError, Result};
use crate::parser::{BookTicker, InstrumentSnapshot, OrderBookSnapshot, PriceLevel};
use crate::source::MarketDataSource;

/// `InstrumentSnapshot` with a single string column.
pub(crate) fn instrument(name: &str, field: &str, value: &str) -> InstrumentSnapshot {
    let mut fields = HashMap::new();
    fields.insert(field.to_string(), serde_json::Value::String(value.to_string()));
    InstrumentSnapshot {
        name: name.to_string(),
        fields,
    }
}

/// Price levels from `(price, quantity)` string pairs.
pub(crate) fn levels(pairs: &[(&str, &str)]) -> Vec<PriceLevel> {
    pairs
        .iter()
        .map(|(p, q)| PriceLevel {
            price: Decimal::from_str(p).unwrap(),
            quantity: Decimal::from_str(q).unwrap(),
        })
        .collect()
}

/// `OrderBookSnapshot` for `symbol` from level pairs.
pub(crate) fn book(symbol: &str, bids: &[(&str, &str)], asks: &[(&str, &str)]) -> OrderBookSnapshot {
    OrderBookSnapshot {
        symbol: symbol.to_string(),
        last_update_id: 1,
        bids: levels(bids),
        asks: levels(asks),
    }
}

/// Scripted ticker reply: `Some((bid, ask))` or `None` for a fetch failure.
pub(crate) type Quote = Option<(&'static str, &'static str)>;

/// In-memory source. Ticker scripts are consumed one reply per call; the last
/// reply repeats once the script runs out.
#[derive(Default)]
pub(crate) struct StubSource {
    instruments: Option<Vec<InstrumentSnapshot>>,
    books: HashMap<String, OrderBookSnapshot>,
    tickers: Mutex<HashMap<String, VecDeque<Quote>>>,
    ticker_calls: AtomicUsize,
}

impl StubSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_instruments(mut self, instruments: Vec<InstrumentSnapshot>) -> Self {
        self.instruments = Some(instruments);
        self
    }

    pub(crate) fn with_book(mut self, book: OrderBookSnapshot) -> Self {
        self.books.insert(book.symbol.clone(), book);
        self
    }

    pub(crate) fn with_quotes(self, symbol: &str, quotes: &[Quote]) -> Self {
        self.tickers
            .lock()
            .unwrap()
            .insert(symbol.to_string(), quotes.iter().copied().collect());
        self
    }

    /// Replace the remaining script for `symbol`.
    pub(crate) fn set_quotes(&self, symbol: &str, quotes: &[Quote]) {
        self.tickers
            .lock()
            .unwrap()
            .insert(symbol.to_string(), quotes.iter().copied().collect());
    }

    pub(crate) fn ticker_calls(&self) -> usize {
        self.ticker_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataSource for StubSource {
    async fn instruments(&self, url: &str) -> Result<Vec<InstrumentSnapshot>> {
        self.instruments
            .clone()
            .ok_or_else(|| MarketDataError::FetchFailure(format!("{}: unreachable", url)))
    }

    async fn order_book(&self, _url: &str, symbol: &str, _limit: u32) -> Result<OrderBookSnapshot> {
        self.books
            .get(symbol)
            .cloned()
            .ok_or_else(|| MarketDataError::FetchFailure(format!("no book for {}", symbol)))
    }

    async fn book_ticker(&self, _url: &str, symbol: &str) -> Result<BookTicker> {
        self.ticker_calls.fetch_add(1, Ordering::SeqCst);

        let mut tickers = self.tickers.lock().unwrap();
        let script = tickers
            .get_mut(symbol)
            .ok_or_else(|| MarketDataError::FetchFailure(format!("unknown symbol {}", symbol)))?;
        let quote = if script.len() > 1 {
            script.pop_front().flatten()
        } else {
            script.front().copied().flatten()
        };

        let (bid, ask) =
            quote.ok_or_else(|| MarketDataError::FetchFailure(format!("{}: timed out", symbol)))?;
        Ok(BookTicker {
            symbol: symbol.to_string(),
            bid_price: Decimal::from_str(bid).unwrap(),
            ask_price: Decimal::from_str(ask).unwrap(),
        })
    }
}
