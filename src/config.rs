//! Configuration module for the spread exporter
//!
//! Settings come from a YAML file layered with `SPREAD_EXPORTER__*` environment
//! variables, e.g. `SPREAD_EXPORTER__SPREADS__INTERVAL_SECS=5`.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{MarketDataError, Result};

const TICKER_24H_URL: &str = "https://api.binance.com/api/v3/ticker/24hr";
const DEPTH_URL: &str = "https://api.binance.com/api/v3/depth";
const BOOK_TICKER_URL: &str = "https://api.binance.com/api/v3/ticker/bookTicker";

/// Ranking query: which instruments to keep and how to order them
#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    /// 24h ticker endpoint
    pub url: String,

    /// Quote asset suffix, matched case-insensitively
    pub quote_asset: String,

    /// Numeric column to sort by, descending
    pub sort_field: String,

    /// How many symbols to keep
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

/// Order book totals query
#[derive(Debug, Clone, Deserialize)]
pub struct OrderBooksConfig {
    /// Depth endpoint
    pub url: String,

    /// Levels per side to request
    pub limit: u32,
}

/// Spread sampling
#[derive(Debug, Clone, Deserialize)]
pub struct SpreadsConfig {
    /// Book ticker endpoint
    pub url: String,

    /// Seconds between refresh ticks
    pub interval_secs: u64,
}

/// Scrape endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

/// Outbound HTTP
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Top symbols by 24h volume
    pub volume_leaders: RankingConfig,

    /// Top symbols by 24h trade count
    pub trade_leaders: RankingConfig,

    /// Book totals for the volume leaders
    pub order_books: OrderBooksConfig,

    /// Spreads of the trade leaders
    pub spreads: SpreadsConfig,

    pub server: ServerConfig,

    pub http: HttpConfig,
}

fn default_top_n() -> usize {
    5
}

impl Config {
    /// Load configuration from `path` (optional) and the environment
    pub fn load(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();
        let settings = config::Config::builder()
            .set_default("volume_leaders.url", defaults.volume_leaders.url)?
            .set_default("volume_leaders.quote_asset", defaults.volume_leaders.quote_asset)?
            .set_default("volume_leaders.sort_field", defaults.volume_leaders.sort_field)?
            .set_default("volume_leaders.top_n", defaults.volume_leaders.top_n as i64)?
            .set_default("trade_leaders.url", defaults.trade_leaders.url)?
            .set_default("trade_leaders.quote_asset", defaults.trade_leaders.quote_asset)?
            .set_default("trade_leaders.sort_field", defaults.trade_leaders.sort_field)?
            .set_default("trade_leaders.top_n", defaults.trade_leaders.top_n as i64)?
            .set_default("order_books.url", defaults.order_books.url)?
            .set_default("order_books.limit", defaults.order_books.limit as i64)?
            .set_default("spreads.url", defaults.spreads.url)?
            .set_default("spreads.interval_secs", defaults.spreads.interval_secs as i64)?
            .set_default("server.bind", defaults.server.bind.to_string())?
            .set_default("http.timeout_secs", defaults.http.timeout_secs as i64)?
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("SPREAD_EXPORTER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        for (group, ranking) in [
            ("volume_leaders", &self.volume_leaders),
            ("trade_leaders", &self.trade_leaders),
        ] {
            if ranking.url.trim().is_empty() {
                return Err(MarketDataError::ConfigError(format!("{}.url is empty", group)));
            }
            if ranking.quote_asset.trim().is_empty() {
                return Err(MarketDataError::ConfigError(format!(
                    "{}.quote_asset is empty",
                    group
                )));
            }
            if ranking.sort_field.trim().is_empty() {
                return Err(MarketDataError::ConfigError(format!(
                    "{}.sort_field is empty",
                    group
                )));
            }
        }
        if self.order_books.url.trim().is_empty() {
            return Err(MarketDataError::ConfigError("order_books.url is empty".into()));
        }
        if self.spreads.url.trim().is_empty() {
            return Err(MarketDataError::ConfigError("spreads.url is empty".into()));
        }
        if self.spreads.interval_secs == 0 {
            return Err(MarketDataError::ConfigError(
                "spreads.interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.spreads.interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            volume_leaders: RankingConfig {
                url: TICKER_24H_URL.to_string(),
                quote_asset: "btc".to_string(),
                sort_field: "volume".to_string(),
                top_n: 5,
            },
            trade_leaders: RankingConfig {
                url: TICKER_24H_URL.to_string(),
                quote_asset: "usdt".to_string(),
                sort_field: "count".to_string(),
                top_n: 5,
            },
            order_books: OrderBooksConfig {
                url: DEPTH_URL.to_string(),
                limit: 200,
            },
            spreads: SpreadsConfig {
                url: BOOK_TICKER_URL.to_string(),
                interval_secs: 10,
            },
            server: ServerConfig {
                bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            },
            http: HttpConfig { timeout_secs: 10 },
        }
    }
}
