use crate::domain::market::candle::SeriesKey;
use crate::domain::repositories::ZoneRepository;
use crate::domain::zones::{ZoneEvent, ZoneSnapshot};
use crate::infrastructure::persistence::database::Database;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

pub struct SqliteZoneRepository {
    database: Database,
}

impl SqliteZoneRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl ZoneRepository for SqliteZoneRepository {
    async fn append_event(&self, event: &ZoneEvent) -> Result<()> {
        let json = serde_json::to_string(event).context("Failed to encode zone event")?;

        sqlx::query(
            r#"
            INSERT INTO zone_events (
                symbol, timeframe, zone_id, state, center, upper, lower, bar_timestamp, event_json
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&event.key.symbol)
        .bind(event.key.timeframe.to_string())
        .bind(&event.zone.id)
        .bind(event.state.to_string())
        .bind(event.zone.center.to_string())
        .bind(event.zone.upper.to_string())
        .bind(event.zone.lower.to_string())
        .bind(event.bar_timestamp)
        .bind(json)
        .execute(&self.database.pool)
        .await
        .context("Failed to append zone event")?;

        Ok(())
    }

    /// Upserts the engine state of one series
    async fn save_snapshot(&self, snapshot: &ZoneSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot).context("Failed to encode zone snapshot")?;

        sqlx::query(
            r#"
            INSERT INTO zone_snapshots (
                symbol,
                timeframe,
                state,
                bars_processed,
                last_timestamp,
                snapshot_json,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT(symbol, timeframe) DO UPDATE SET
                state = excluded.state,
                bars_processed = excluded.bars_processed,
                last_timestamp = excluded.last_timestamp,
                snapshot_json = excluded.snapshot_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&snapshot.key.symbol)
        .bind(snapshot.key.timeframe.to_string())
        .bind(snapshot.state.to_string())
        .bind(snapshot.bars_processed as i64)
        .bind(snapshot.last_timestamp)
        .bind(json)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.database.pool)
        .await
        .context("Failed to save zone snapshot")?;

        Ok(())
    }

    async fn load_snapshot(&self, key: &SeriesKey) -> Result<Option<ZoneSnapshot>> {
        let row = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT snapshot_json
            FROM zone_snapshots
            WHERE symbol = $1 AND timeframe = $2
            "#,
        )
        .bind(&key.symbol)
        .bind(key.timeframe.to_string())
        .fetch_optional(&self.database.pool)
        .await
        .context("Failed to load zone snapshot")?;

        row.map(|(json,)| serde_json::from_str(&json).context("Failed to decode zone snapshot"))
            .transpose()
    }

    /// Every stored snapshot that still decodes, ordered by key
    async fn load_snapshots(&self) -> Result<Vec<ZoneSnapshot>> {
        let rows = sqlx::query_as::<_, (String, String, String)>(
            r#"
            SELECT symbol, timeframe, snapshot_json
            FROM zone_snapshots
            "#,
        )
        .fetch_all(&self.database.pool)
        .await
        .context("Failed to load zone snapshots")?;

        let mut snapshots = Vec::with_capacity(rows.len());
        for (symbol, timeframe, json) in rows {
            match serde_json::from_str::<ZoneSnapshot>(&json) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!(
                    "SqliteZoneRepository: skipping unreadable snapshot {}/{}: {}",
                    symbol, timeframe, e
                ),
            }
        }
        snapshots.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(snapshots)
    }

    /// Newest first
    async fn events(&self, key: &SeriesKey, limit: usize) -> Result<Vec<ZoneEvent>> {
        let rows = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT event_json
            FROM zone_events
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
        .context("Failed to load zone events")?;

        rows.iter()
            .map(|(json,)| serde_json::from_str(json).context("Failed to decode zone event"))
            .collect()
    }
}
