use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

/// Shared SQLite pool holding signals and zone state
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        let in_memory = db_url.contains(":memory:");

        // Ensure the directory exists if it's a file path
        if !in_memory && let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let mut options = SqliteConnectOptions::from_str(db_url)
            .with_context(|| format!("Invalid database url {}", db_url))?
            .create_if_missing(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // every pooled connection to :memory: would open its own empty database
        let max_connections = if in_memory { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        // 1. Latest signal per series
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS signals_latest (
                symbol TEXT NOT NULL,
                timeframe TEXT NOT NULL,
                direction TEXT NOT NULL,
                score INTEGER NOT NULL,
                base_candle_id INTEGER NOT NULL,
                contract_json TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (symbol, timeframe)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create signals_latest table")?;

        // 2. Append-only signal log
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS signal_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                timeframe TEXT NOT NULL,
                direction TEXT NOT NULL,
                score INTEGER NOT NULL,
                base_candle_id INTEGER NOT NULL,
                contract_json TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create signal_history table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_signal_history_series
            ON signal_history (symbol, timeframe, id);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create signal_history index")?;

        // 3. Zone lifecycle events
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS zone_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                timeframe TEXT NOT NULL,
                zone_id TEXT NOT NULL,
                state TEXT NOT NULL,
                center TEXT NOT NULL,
                upper TEXT NOT NULL,
                lower TEXT NOT NULL,
                bar_timestamp INTEGER NOT NULL,
                event_json TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create zone_events table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_zone_events_series
            ON zone_events (symbol, timeframe, id);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create zone_events index")?;

        // 4. Engine state per series, restored on startup
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS zone_snapshots (
                symbol TEXT NOT NULL,
                timeframe TEXT NOT NULL,
                state TEXT NOT NULL,
                bars_processed INTEGER NOT NULL,
                last_timestamp INTEGER,
                snapshot_json TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (symbol, timeframe)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create zone_snapshots table")?;

        info!("Database schema initialized");
        Ok(())
    }
}
