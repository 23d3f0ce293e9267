//! Fixed-cadence refresh loop
//!
//! Samples every tracked symbol, publishes the result, sleeps, repeats.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::metrics::MetricsRegistry;
use crate::source::MarketDataSource;
use crate::tracker::{RefreshReport, SpreadTracker, TrackedSymbol};

/// Drives `SpreadTracker::refresh` every `interval` until cancelled.
/// Without a registry the loop only tracks and reports through `on_tick`.
pub struct Scheduler {
    source: Arc<dyn MarketDataSource>,
    url: String,
    symbols: Vec<String>,
    registry: Option<Arc<MetricsRegistry>>,
    interval: Duration,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        url: &str,
        symbols: Vec<String>,
        registry: Option<Arc<MetricsRegistry>>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            url: url.to_string(),
            symbols,
            registry,
            interval,
            cancel,
        }
    }

    /// Run until the cancellation token fires. `on_tick` sees the tracked
    /// state after every publish, including the initial one.
    ///
    /// Fetches inside a tick are sequential and the sleep starts after the
    /// tick finishes, so slow fetches stretch the cadence.
    pub async fn run<F>(self, mut on_tick: F) -> SpreadTracker
    where
        F: FnMut(u64, &RefreshReport, &SpreadTracker) + Send,
    {
        let mut tracker =
            SpreadTracker::create_all(self.source.clone(), &self.url, &self.symbols).await;
        self.publish(&tracker);
        let initial = RefreshReport {
            updated: tracker
                .symbols()
                .filter(|s| s.is_tracking())
                .map(|s| s.name().to_string())
                .collect(),
            skipped: tracker
                .symbols()
                .filter(|s| !s.is_tracking())
                .map(|s| s.name().to_string())
                .collect(),
        };
        on_tick(0, &initial, &tracker);

        info!(
            symbols = tracker.len(),
            interval_secs = self.interval.as_secs(),
            "Scheduler started"
        );

        let mut tick = 0u64;
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = sleep(self.interval) => {}
            }

            tick += 1;
            let report = tracker.refresh().await;
            self.publish(&tracker);

            info!(
                tick,
                updated = report.updated.len(),
                skipped = report.skipped.len(),
                "Tick complete"
            );
            on_tick(tick, &report, &tracker);
        }

        info!(ticks = tick, "Scheduler stopped");
        tracker
    }

    fn publish(&self, tracker: &SpreadTracker) {
        if let Some(registry) = &self.registry {
            registry.publish(tracker.symbols());
        }
    }
}

/// Log one line per symbol with the values of the latest tick
pub fn log_symbols(tracker: &SpreadTracker) {
    for symbol in tracker.symbols().filter(|s| s.is_tracking()) {
        log_symbol(symbol);
    }
}

fn log_symbol(symbol: &TrackedSymbol) {
    info!(
        symbol = %symbol.name(),
        delta = %format!("{:.10}", symbol.delta()),
        current_spread = %format!("{:.10}", symbol.current()),
        last_spread = %format!("{:.10}", symbol.previous()),
        "Spread"
    );
}
