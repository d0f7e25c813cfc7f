use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::domain::repositories::{SignalRepository, ZoneRepository};
use crate::infrastructure::persistence::database::Database;
use crate::infrastructure::persistence::repositories::{
    SqliteSignalRepository, SqliteZoneRepository,
};

pub struct PersistenceHandle {
    pub db: Database,
    pub signal_repository: Arc<dyn SignalRepository>,
    pub zone_repository: Arc<dyn ZoneRepository>,
}

pub struct PersistenceBootstrap;

impl PersistenceBootstrap {
    pub async fn init(config: &Config) -> Result<PersistenceHandle> {
        let db_url = &config.service.database_url;
        info!("Initializing Database at {}", db_url);

        let db = Database::new(db_url)
            .await
            .context("Failed to initialize database")?;

        let signal_repository = Arc::new(SqliteSignalRepository::new(db.clone()));
        let zone_repository = Arc::new(SqliteZoneRepository::new(db.clone()));

        Ok(PersistenceHandle {
            db,
            signal_repository,
            zone_repository,
        })
    }
}
