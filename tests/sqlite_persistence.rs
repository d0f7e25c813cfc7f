mod common;

use common::{IMPULSE_INDEX, SYMBOL, TF, gate, orchestrator, trending_series};
use marginzone::application::agents::KeyWorker;
use marginzone::domain::market::candle::SeriesKey;
use marginzone::domain::repositories::{SignalRepository, ZoneRepository};
use marginzone::domain::signals::types::{Bias, Direction, GatePosition};
use marginzone::domain::zones::{ZoneConfig, ZoneEngine, ZoneState};
use marginzone::infrastructure::mock::{MockCandleSource, MockStructureGate, RecordingNotifier};
use marginzone::infrastructure::persistence::{Database, SqliteSignalRepository, SqliteZoneRepository};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Database file under the temp dir, removed with its WAL files on drop
struct TempDb {
    path: PathBuf,
}

impl TempDb {
    fn new(name: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir()
            .join(format!("marginzone-{}-{}-{}", name, std::process::id(), nanos))
            .join("signals.db");
        Self { path }
    }

    fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        if let Some(dir) = self.path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

fn key() -> SeriesKey {
    SeriesKey::new(SYMBOL, TF)
}

fn worker(db: &Database, source: &MockCandleSource, engine: ZoneEngine) -> KeyWorker {
    let gate = MockStructureGate::new(gate(GatePosition::Inside, Bias::Long));
    KeyWorker::new(
        engine,
        Arc::new(source.clone()),
        orchestrator(source, &gate, vec![]),
        Arc::new(SqliteSignalRepository::new(db.clone())),
        Arc::new(SqliteZoneRepository::new(db.clone())),
        Arc::new(RecordingNotifier::new()),
        Duration::from_secs(60),
    )
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let temp = TempDb::new("reopen");
    let source = MockCandleSource::new();
    source.set_series(SYMBOL, TF, trending_series(TF)).await;

    {
        let db = Database::new(&temp.url()).await.unwrap();
        let mut first = worker(&db, &source, ZoneEngine::new(key(), ZoneConfig::default()));
        let report = first.tick().await.unwrap();
        assert!(report.published);
        assert_eq!(report.events.len(), 1);
        db.pool.close().await;
    }
    assert!(temp.path.exists());

    let db = Database::new(&temp.url()).await.unwrap();
    let signals = SqliteSignalRepository::new(db.clone());
    let zones = SqliteZoneRepository::new(db.clone());

    let latest = signals.load_latest(&key()).await.unwrap().unwrap();
    assert_eq!(latest.direction, Direction::Long);
    assert_eq!(latest.base_candle_id, trending_series(TF)[IMPULSE_INDEX].timestamp);
    assert_eq!(signals.history(&key(), 10).await.unwrap().len(), 1);

    let snapshots = zones.load_snapshots().await.unwrap();
    assert_eq!(snapshots.len(), 1);
    let snapshot = snapshots.into_iter().next().unwrap();
    assert_eq!(snapshot.state, ZoneState::Created);
    assert_eq!(snapshot.bars_processed, 200);

    // restored worker neither replays the zone nor republishes the signal
    let mut restored = worker(&db, &source, ZoneEngine::restore(ZoneConfig::default(), snapshot));
    restored.restore_last_signal().await;
    let report = restored.tick().await.unwrap();
    assert!(report.events.is_empty());
    assert!(!report.published);

    assert_eq!(zones.events(&key(), 10).await.unwrap().len(), 1);
    assert_eq!(signals.history(&key(), 10).await.unwrap().len(), 1);
    db.pool.close().await;
}
