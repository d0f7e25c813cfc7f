//! MarginZone Server - headless signal service
//!
//! Runs one worker per configured (symbol, timeframe). Zone transitions and
//! signals are persisted to SQLite and written to stdout as structured log lines.
//!
//! # Usage
//! ```sh
//! SYMBOLS=ADAUSDT,INJUSDT TF_LIST=15,60 cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `OFFLINE` - Serve synthetic candles instead of Bybit (default: false)
//! - `DATABASE_URL` - SQLite database (default: sqlite://marginzone.db)
//! - `RUST_LOG` - Log filter (default: info)

use anyhow::Result;
use marginzone::application::system::Application;
use marginzone::config::Config;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("MarginZone Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: Symbols={:?}, Timeframes={:?}, Offline={}",
        config.service.symbols, config.service.timeframes, config.source.offline
    );

    let app = Application::build(config).await?;

    info!("Starting signal workers...");
    let handle = app.start().await?;

    info!("Server running. Press Ctrl+C to shutdown.");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Finishing in-flight ticks...");
    handle.shutdown().await;

    Ok(())
}
