//! Spread Exporter Library
//!
//! Ranks Binance symbols by 24h activity, summarises their order books and
//! tracks spread changes on a fixed cadence, exposing the latest values as
//! Prometheus gauges.

pub mod book;
pub mod config;
pub mod error;
pub mod metrics;
pub mod parser;
pub mod ranker;
pub mod report;
pub mod scheduler;
pub mod server;
pub mod source;
pub mod tracker;

#[cfg(test)]
mod testutil;

pub use book::{aggregate, aggregate_all, BookSummary};
pub use config::Config;
pub use error::{MarketDataError, Result};
pub use metrics::{MetricSample, MetricsRegistry};
pub use parser::{BookTicker, InstrumentSnapshot, OrderBookSnapshot, PriceLevel};
pub use ranker::select;
pub use scheduler::Scheduler;
pub use source::{BinanceRestClient, MarketDataSource};
pub use tracker::{SpreadTracker, TrackedSymbol, TrackingState};
