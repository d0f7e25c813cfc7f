//! Runs one cycle per key and prints the result as JSON lines.
//!
//! Each line carries the cycle outcome (signal contract or skip reason), the zone
//! events replayed from the fetched window and the resulting zone state. Logs go
//! to stderr so stdout stays machine-readable.

use anyhow::{Context, Result};
use clap::Parser;
use marginzone::application::agents::KeyWorker;
use marginzone::application::bootstrap::services::ServicesBootstrap;
use marginzone::application::pipeline::CycleOutcome;
use marginzone::config::Config;
use marginzone::domain::market::timeframe::Timeframe;
use marginzone::domain::zones::ZoneEngine;
use marginzone::infrastructure::{InMemorySignalRepository, InMemoryZoneRepository};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Symbols to scan (default: SYMBOLS from the environment)
    #[arg(short, long, value_delimiter = ',')]
    symbol: Vec<String>,

    /// Timeframes to scan, e.g. 15 or 1h (default: TF_LIST from the environment)
    #[arg(short, long, value_delimiter = ',')]
    timeframe: Vec<String>,

    /// Serve synthetic candles instead of calling Bybit
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    if !cli.symbol.is_empty() {
        config.service.symbols = cli.symbol.iter().map(|s| s.trim().to_uppercase()).collect();
    }
    if !cli.timeframe.is_empty() {
        config.service.timeframes = cli
            .timeframe
            .iter()
            .map(|tf| Timeframe::from_str(tf))
            .collect::<Result<Vec<_>>>()
            .context("Invalid --timeframe")?;
    }
    config.source.offline |= cli.offline;

    let services = ServicesBootstrap::init(&config);
    let signal_repository = Arc::new(InMemorySignalRepository::new());
    let zone_repository = Arc::new(InMemoryZoneRepository::new());

    for key in config.keys() {
        let mut worker = KeyWorker::new(
            ZoneEngine::new(key.clone(), config.engine.zone.clone()),
            services.candle_source.clone(),
            services.orchestrator.clone(),
            signal_repository.clone(),
            zone_repository.clone(),
            services.notifier.clone(),
            config.poll_interval(key.timeframe),
        );

        let line = match worker.tick().await {
            Ok(report) => {
                let outcome = match &report.outcome {
                    CycleOutcome::Signal(signal) => json!({ "signal": signal }),
                    CycleOutcome::Skipped(reason) => json!({ "skipped": reason.to_string() }),
                };
                json!({
                    "key": key.to_string(),
                    "outcome": outcome,
                    "zone_state": worker.engine().state().to_string(),
                    "zone": worker.engine().active_zone(),
                    "zone_events": report.events,
                })
            }
            Err(e) => json!({
                "key": key.to_string(),
                "error": format!("{:#}", e),
            }),
        };
        println!("{}", line);
    }

    Ok(())
}
