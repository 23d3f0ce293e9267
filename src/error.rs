//! Error types for the spread exporter

use thiserror::Error;

/// Spread exporter errors
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Fetch failed: {0}")]
    FetchFailure(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

impl MarketDataError {
    /// Whether this error means "no data available this round" rather than a fault.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            MarketDataError::FetchFailure(_) | MarketDataError::MalformedResponse(_)
        )
    }
}

impl From<reqwest::Error> for MarketDataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MarketDataError::MalformedResponse(err.to_string())
        } else {
            MarketDataError::FetchFailure(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MarketDataError {
    fn from(err: serde_json::Error) -> Self {
        MarketDataError::MalformedResponse(err.to_string())
    }
}

impl From<config::ConfigError> for MarketDataError {
    fn from(err: config::ConfigError) -> Self {
        MarketDataError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for MarketDataError {
    fn from(err: std::io::Error) -> Self {
        MarketDataError::ServerError(err.to_string())
    }
}

impl From<prometheus::Error> for MarketDataError {
    fn from(err: prometheus::Error) -> Self {
        MarketDataError::ServerError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MarketDataError>;
