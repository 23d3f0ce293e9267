//! Gauge registry exposed to the scrape endpoint

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::error::{MarketDataError, Result};
use crate::tracker::TrackedSymbol;

/// Name of the current-spread gauge family
pub const SPREAD_METRIC: &str = "Spread";
/// Name of the spread-delta gauge family
pub const DELTA_METRIC: &str = "Delta";

/// One exported time series
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub metric: String,
    pub symbol: String,
    pub value: f64,
}

/// Current spread and delta gauges, labeled by symbol.
///
/// Each series is an independent atomic gauge, so the writer and any number of
/// scrapers can share one instance behind an `Arc`.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    spread: GaugeVec,
    delta: GaugeVec,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let spread = GaugeVec::new(
            Opts::new(SPREAD_METRIC, "Shows current spread of the symbol"),
            &["symbol"],
        )?;
        let delta = GaugeVec::new(
            Opts::new(DELTA_METRIC, "Shows spread-delta of the symbol"),
            &["symbol"],
        )?;

        registry.register(Box::new(spread.clone()))?;
        registry.register(Box::new(delta.clone()))?;

        Ok(Self {
            registry,
            spread,
            delta,
        })
    }

    pub fn set_current(&self, symbol: &str, value: f64) {
        self.spread.with_label_values(&[symbol]).set(value);
    }

    pub fn set_delta(&self, symbol: &str, value: f64) {
        self.delta.with_label_values(&[symbol]).set(value);
    }

    /// Copy the scalar state of every initialized symbol into the gauges
    pub fn publish<'a>(&self, symbols: impl IntoIterator<Item = &'a TrackedSymbol>) {
        for symbol in symbols.into_iter().filter(|s| s.is_tracking()) {
            self.set_current(symbol.name(), symbol.current());
            self.set_delta(symbol.name(), symbol.delta());
        }
    }

    /// Every series currently held, grouped by metric family
    pub fn snapshot(&self) -> Vec<MetricSample> {
        let mut samples = Vec::new();
        for family in self.registry.gather() {
            for metric in family.get_metric() {
                let symbol = metric
                    .get_label()
                    .iter()
                    .find(|l| l.get_name() == "symbol")
                    .map(|l| l.get_value().to_string())
                    .unwrap_or_default();
                samples.push(MetricSample {
                    metric: family.get_name().to_string(),
                    symbol,
                    value: metric.get_gauge().get_value(),
                });
            }
        }
        samples
    }

    /// Prometheus text exposition of both families
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| MarketDataError::ServerError(e.to_string()))
    }
}
