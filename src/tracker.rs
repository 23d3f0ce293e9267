//! Spread tracking
//!
//! Keeps the current and previous spread of every observed symbol and the
//! absolute change between consecutive samples.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{MarketDataError, Result};
use crate::source::MarketDataSource;

/// Lifecycle of a tracked symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    /// No sample has been observed yet
    Uninitialized,
    /// At least one sample observed; terminal while the process runs
    Tracking,
}

/// Spread state of one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedSymbol {
    name: String,
    current: f64,
    previous: f64,
    delta: f64,
    state: TrackingState,
}

impl TrackedSymbol {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            current: 0.0,
            previous: 0.0,
            delta: 0.0,
            state: TrackingState::Uninitialized,
        }
    }

    /// Record a new spread sample.
    ///
    /// The first sample seeds both current and previous, so delta starts at zero.
    pub fn observe(&mut self, spread: f64) {
        self.previous = match self.state {
            TrackingState::Uninitialized => spread,
            TrackingState::Tracking => self.current,
        };
        self.current = spread;
        self.delta = (self.previous - self.current).abs();
        self.state = TrackingState::Tracking;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn previous(&self) -> f64 {
        self.previous
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state == TrackingState::Tracking
    }
}

/// What happened to a symbol on one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    Updated,
    Skipped,
}

/// Apply one fetched sample to a symbol.
///
/// A failed fetch leaves the symbol exactly as it was; it will be retried on the
/// next tick.
pub fn apply_sample(symbol: &mut TrackedSymbol, sample: &Result<f64>) -> SampleOutcome {
    match sample {
        Ok(spread) => {
            symbol.observe(*spread);
            SampleOutcome::Updated
        }
        Err(e) => {
            warn!(symbol = %symbol.name, error = %e, "Spread unavailable, keeping previous state");
            SampleOutcome::Skipped
        }
    }
}

/// Per-tick summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub updated: Vec<String>,
    pub skipped: Vec<String>,
}

/// Fetch the current spread (ask - bid) of `symbol`
pub async fn fetch_spread(source: &dyn MarketDataSource, url: &str, symbol: &str) -> Result<f64> {
    let ticker = source.book_ticker(url, symbol).await?;
    let spread = ticker.spread();
    if spread.is_finite() {
        Ok(spread)
    } else {
        Err(MarketDataError::MalformedResponse(format!(
            "{}: spread not representable",
            symbol
        )))
    }
}

/// Spreads of every symbol in order. The first failure aborts the batch.
pub async fn spreads_all(
    source: &dyn MarketDataSource,
    url: &str,
    symbols: &[String],
) -> Result<Vec<(String, f64)>> {
    let mut spreads = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let spread = fetch_spread(source, url, symbol).await?;
        spreads.push((symbol.clone(), spread));
    }
    Ok(spreads)
}

/// Owns the tracked symbols and refreshes them from a market data source
pub struct SpreadTracker {
    source: Arc<dyn MarketDataSource>,
    url: String,
    symbols: BTreeMap<String, TrackedSymbol>,
}

impl SpreadTracker {
    /// Create a tracker for `names`, sampling each once.
    ///
    /// A symbol whose first fetch fails stays uninitialized until a later tick succeeds.
    pub async fn create_all(source: Arc<dyn MarketDataSource>, url: &str, names: &[String]) -> Self {
        let mut tracker = Self {
            source,
            url: url.to_string(),
            symbols: names
                .iter()
                .map(|name| (name.clone(), TrackedSymbol::new(name)))
                .collect(),
        };

        let report = tracker.refresh().await;
        info!(
            tracked = tracker.symbols.len(),
            initialized = report.updated.len(),
            "Spread tracker created"
        );
        tracker
    }

    /// Sample every symbol once, sequentially, then apply the samples.
    pub async fn refresh(&mut self) -> RefreshReport {
        let mut samples = Vec::with_capacity(self.symbols.len());
        for name in self.symbols.keys() {
            let sample = fetch_spread(self.source.as_ref(), &self.url, name).await;
            samples.push((name.clone(), sample));
        }

        let mut report = RefreshReport::default();
        for (name, sample) in samples {
            let Some(symbol) = self.symbols.get_mut(&name) else {
                continue;
            };
            match apply_sample(symbol, &sample) {
                SampleOutcome::Updated => {
                    debug!(
                        symbol = %name,
                        current = symbol.current,
                        previous = symbol.previous,
                        delta = symbol.delta,
                        "Spread updated"
                    );
                    report.updated.push(name);
                }
                SampleOutcome::Skipped => report.skipped.push(name),
            }
        }

        report
    }

    pub fn get(&self, name: &str) -> Option<&TrackedSymbol> {
        self.symbols.get(name)
    }

    /// Tracked symbols in name order
    pub fn symbols(&self) -> impl Iterator<Item = &TrackedSymbol> {
        self.symbols.values()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubSource;

    const URL: &str = "http://stub/bookTicker";

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_first_sample_has_zero_delta() {
        let mut symbol = TrackedSymbol::new("BTCUSDT");
        assert_eq!(symbol.state(), TrackingState::Uninitialized);

        symbol.observe(0.5);
        assert!(symbol.is_tracking());
        assert_eq!(symbol.previous(), 0.5);
        assert_eq!(symbol.current(), 0.5);
        assert_eq!(symbol.delta(), 0.0);
    }

    #[test]
    fn test_zero_spread_is_a_real_sample() {
        let mut symbol = TrackedSymbol::new("BTCUSDT");
        symbol.observe(0.0);
        symbol.observe(0.25);
        assert_eq!(symbol.previous(), 0.0);
        assert_eq!(symbol.delta(), 0.25);
    }

    #[test]
    fn test_delta_invariant_over_sequence() {
        let mut symbol = TrackedSymbol::new("ETHUSDT");
        for spread in [0.5, 0.2, 0.2, -0.1, 3.75, 0.0, 1e-8] {
            symbol.observe(spread);
            assert_eq!(symbol.delta(), (symbol.previous() - symbol.current()).abs());
            assert!(symbol.delta() >= 0.0);
        }
    }

    #[test]
    fn test_failed_sample_leaves_state_untouched() {
        let mut symbol = TrackedSymbol::new("ETHUSDT");
        symbol.observe(0.5);
        symbol.observe(0.2);
        let before = symbol.clone();

        let failed: Result<f64> = Err(MarketDataError::FetchFailure("timeout".into()));
        assert_eq!(apply_sample(&mut symbol, &failed), SampleOutcome::Skipped);
        assert_eq!(symbol, before);

        assert_eq!(apply_sample(&mut symbol, &Ok(0.4)), SampleOutcome::Updated);
        assert_close(symbol.previous(), 0.2);
        assert_close(symbol.delta(), 0.2);
    }

    #[tokio::test]
    async fn test_create_then_refresh_example() {
        let source = Arc::new(
            StubSource::new().with_quotes("BTCUSDT", &[Some(("10.0", "10.5")), Some(("10.0", "10.2"))]),
        );
        let mut tracker = SpreadTracker::create_all(source, URL, &names(&["BTCUSDT"])).await;

        let symbol = tracker.get("BTCUSDT").unwrap();
        assert_close(symbol.current(), 0.5);
        assert_eq!(symbol.delta(), 0.0);

        let report = tracker.refresh().await;
        assert_eq!(report.updated, names(&["BTCUSDT"]));

        let symbol = tracker.get("BTCUSDT").unwrap();
        assert_close(symbol.previous(), 0.5);
        assert_close(symbol.current(), 0.2);
        assert_close(symbol.delta(), 0.3);
    }

    #[tokio::test]
    async fn test_every_symbol_starts_at_zero_delta() {
        let source = Arc::new(
            StubSource::new()
                .with_quotes("AAAUSDT", &[Some(("1.0", "1.1"))])
                .with_quotes("BBBUSDT", &[Some(("2.0", "2.5"))]),
        );
        let tracker = SpreadTracker::create_all(source, URL, &names(&["AAAUSDT", "BBBUSDT"])).await;
        assert_eq!(tracker.len(), 2);
        assert!(tracker.symbols().all(|s| s.is_tracking() && s.delta() == 0.0));
    }

    #[tokio::test]
    async fn test_unchanged_value_gives_zero_delta() {
        let source = Arc::new(StubSource::new().with_quotes(
            "BTCUSDT",
            &[Some(("10.0", "10.5")), Some(("10.0", "10.2")), Some(("10.0", "10.2"))],
        ));
        let mut tracker = SpreadTracker::create_all(source, URL, &names(&["BTCUSDT"])).await;
        tracker.refresh().await;
        assert!(tracker.get("BTCUSDT").unwrap().delta() > 0.0);

        tracker.refresh().await;
        assert_eq!(tracker.get("BTCUSDT").unwrap().delta(), 0.0);
    }

    #[tokio::test]
    async fn test_refresh_skips_failed_symbol_only() {
        let source = Arc::new(
            StubSource::new()
                .with_quotes("AAAUSDT", &[Some(("1.0", "1.5")), None, Some(("1.0", "1.1"))])
                .with_quotes("BBBUSDT", &[Some(("2.0", "2.5")), Some(("2.0", "2.1"))]),
        );
        let mut tracker =
            SpreadTracker::create_all(source.clone(), URL, &names(&["AAAUSDT", "BBBUSDT"])).await;

        let report = tracker.refresh().await;
        assert_eq!(report.updated, names(&["BBBUSDT"]));
        assert_eq!(report.skipped, names(&["AAAUSDT"]));
        assert_close(tracker.get("AAAUSDT").unwrap().current(), 0.5);
        assert_close(tracker.get("BBBUSDT").unwrap().delta(), 0.4);

        // Next tick recovers and diffs against the last good sample.
        tracker.refresh().await;
        let a = tracker.get("AAAUSDT").unwrap();
        assert_close(a.previous(), 0.5);
        assert_close(a.current(), 0.1);
        assert_close(a.delta(), 0.4);
    }

    #[tokio::test]
    async fn test_symbol_failing_at_creation_initializes_later() {
        let source = Arc::new(StubSource::new().with_quotes("AAAUSDT", &[None, Some(("1.0", "1.5"))]));
        let mut tracker = SpreadTracker::create_all(source, URL, &names(&["AAAUSDT"])).await;
        assert_eq!(
            tracker.get("AAAUSDT").unwrap().state(),
            TrackingState::Uninitialized
        );

        tracker.refresh().await;
        let symbol = tracker.get("AAAUSDT").unwrap();
        assert!(symbol.is_tracking());
        assert_eq!(symbol.delta(), 0.0);
    }

    #[tokio::test]
    async fn test_spreads_all() {
        let source = StubSource::new()
            .with_quotes("AAAUSDT", &[Some(("1.0", "1.5"))])
            .with_quotes("BBBUSDT", &[Some(("2.0", "2.25"))]);
        let spreads = spreads_all(&source, URL, &names(&["BBBUSDT", "AAAUSDT"]))
            .await
            .unwrap();
        assert_eq!(spreads, vec![("BBBUSDT".to_string(), 0.25), ("AAAUSDT".to_string(), 0.5)]);

        let err = spreads_all(&source, URL, &names(&["AAAUSDT", "NOPE"])).await;
        assert!(err.unwrap_err().is_fetch_failure());
    }
}
