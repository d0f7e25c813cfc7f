use crate::domain::market::candle::SeriesKey;
use crate::domain::repositories::SignalRepository;
use crate::domain::signals::types::SignalContract;
use crate::infrastructure::persistence::database::Database;
use anyhow::{Context, Result};
use async_trait::async_trait;

/// Signals stored as JSON contracts, keyed by (symbol, timeframe)
pub struct SqliteSignalRepository {
    database: Database,
}

impl SqliteSignalRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

fn decode(json: &str) -> Result<SignalContract> {
    serde_json::from_str(json).context("Failed to decode stored signal contract")
}

#[async_trait]
impl SignalRepository for SqliteSignalRepository {
    /// Upserts the latest signal of the series and appends it to the history
    async fn save(&self, signal: &SignalContract) -> Result<()> {
        let json = serde_json::to_string(signal).context("Failed to encode signal contract")?;
        let direction = signal.direction.to_string();
        let created_at = signal.timestamp.timestamp_millis();

        let mut tx = self
            .database
            .pool
            .begin()
            .await
            .context("Failed to open signal transaction")?;

        sqlx::query(
            r#"
            INSERT INTO signals_latest (
                symbol,
                timeframe,
                direction,
                score,
                base_candle_id,
                contract_json,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT(symbol, timeframe) DO UPDATE SET
                direction = excluded.direction,
                score = excluded.score,
                base_candle_id = excluded.base_candle_id,
                contract_json = excluded.contract_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&signal.symbol)
        .bind(&signal.timeframe)
        .bind(&direction)
        .bind(signal.score as i64)
        .bind(signal.base_candle_id)
        .bind(&json)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .context("Failed to upsert latest signal")?;

        sqlx::query(
            r#"
            INSERT INTO signal_history (
                symbol, timeframe, direction, score, base_candle_id, contract_json, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&signal.symbol)
        .bind(&signal.timeframe)
        .bind(&direction)
        .bind(signal.score as i64)
        .bind(signal.base_candle_id)
        .bind(&json)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .context("Failed to append signal history")?;

        tx.commit().await.context("Failed to commit signal")?;
        Ok(())
    }

    async fn load_latest(&self, key: &SeriesKey) -> Result<Option<SignalContract>> {
        let row = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT contract_json
            FROM signals_latest
            WHERE symbol = $1 AND timeframe = $2
            "#,
        )
        .bind(&key.symbol)
        .bind(key.timeframe.to_string())
        .fetch_optional(&self.database.pool)
        .await
        .context("Failed to load latest signal")?;

        row.map(|(json,)| decode(&json)).transpose()
    }

    /// Newest first
    async fn history(&self, key: &SeriesKey, limit: usize) -> Result<Vec<SignalContract>> {
        let rows = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT contract_json
            FROM signal_history
            WHERE symbol = $1 AND timeframe = $2
            ORDER BY id DESC
            LIMIT $3
            "#,
        )
        .bind(&key.symbol)
        .bind(key.timeframe.to_string())
        .bind(limit as i64)
        .fetch_all(&self.database.pool)
        .await
        .context("Failed to load signal history")?;

        rows.iter().map(|(json,)| decode(json)).collect()
    }
}
