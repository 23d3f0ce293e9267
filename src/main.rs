//! Spread Exporter
//!
//! Samples Binance REST endpoints, ranks symbols, and exports spread gauges
//! for Prometheus to scrape.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spread_exporter::ranker::fetch_and_select;
use spread_exporter::scheduler::{log_symbols, Scheduler};
use spread_exporter::{report, server, BinanceRestClient, Config, MarketDataSource, MetricsRegistry};

#[derive(Parser, Debug)]
#[command(name = "spread-exporter")]
#[command(about = "Ranks Binance symbols and exports spread deltas to Prometheus")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, default_value = "conf.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Fetch every report section once and print it as JSON
    Report,
    /// Track trade-leader spreads and log them every tick
    Stream,
    /// Track trade-leader spreads and serve them on /metrics
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;
    info!(path = %cli.config.display(), "Configuration loaded");

    let source: Arc<dyn MarketDataSource> = Arc::new(BinanceRestClient::new(config.http_timeout())?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Report => run_report(source.as_ref(), &config).await,
        Command::Stream => run_stream(source, &config).await,
        Command::Serve => run_serve(source, &config).await,
    }
}

async fn run_report(source: &dyn MarketDataSource, config: &Config) -> anyhow::Result<()> {
    let report = report::build(source, config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn trade_leaders(source: &dyn MarketDataSource, config: &Config) -> anyhow::Result<Vec<String>> {
    let ranking = &config.trade_leaders;
    let symbols = fetch_and_select(
        source,
        &ranking.url,
        &ranking.quote_asset,
        &ranking.sort_field,
        ranking.top_n,
    )
    .await?;
    info!(symbols = ?symbols, "Tracking trade leaders");
    Ok(symbols)
}

fn shutdown_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            return;
        }
        info!("Shutdown requested");
        cancel.cancel();
    });
}

async fn run_stream(source: Arc<dyn MarketDataSource>, config: &Config) -> anyhow::Result<()> {
    let symbols = trade_leaders(source.as_ref(), config).await?;
    let cancel = CancellationToken::new();
    shutdown_on_ctrl_c(cancel.clone());

    Scheduler::new(
        source,
        &config.spreads.url,
        symbols,
        None,
        config.refresh_interval(),
        cancel,
    )
    .run(|_, _, tracker| log_symbols(tracker))
    .await;

    Ok(())
}

async fn run_serve(source: Arc<dyn MarketDataSource>, config: &Config) -> anyhow::Result<()> {
    let symbols = trade_leaders(source.as_ref(), config).await?;
    let registry = Arc::new(MetricsRegistry::new()?);
    let cancel = CancellationToken::new();
    shutdown_on_ctrl_c(cancel.clone());

    let scheduler = Scheduler::new(
        source,
        &config.spreads.url,
        symbols,
        Some(registry.clone()),
        config.refresh_interval(),
        cancel.clone(),
    );
    let refresher = tokio::spawn(scheduler.run(|_, _, _| {}));

    let served = server::serve(config.server.bind, registry, cancel.clone()).await;
    cancel.cancel();
    refresher.await?;
    served?;

    Ok(())
}
