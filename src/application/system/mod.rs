use anyhow::Result;
use std::collections::HashSet;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::agents::key_worker::KeyWorker;
use crate::application::bootstrap::{
    persistence::{PersistenceBootstrap, PersistenceHandle},
    services::{ServicesBootstrap, ServicesHandle},
};
use crate::config::Config;
use crate::domain::market::candle::SeriesKey;
use crate::domain::zones::ZoneRegistry;

/// Running workers plus the stop flag they watch
pub struct SystemHandle {
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<(SeriesKey, JoinHandle<()>)>,
}

impl SystemHandle {
    pub fn keys(&self) -> Vec<SeriesKey> {
        self.workers.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Raises the stop flag and waits for every worker to finish its tick
    pub async fn shutdown(self) {
        info!("Stopping {} workers...", self.workers.len());
        let _ = self.shutdown_tx.send(true);

        let (keys, handles): (Vec<_>, Vec<_>) = self.workers.into_iter().unzip();
        let results = futures::future::join_all(handles).await;
        for (key, result) in keys.iter().zip(results) {
            if let Err(e) = result {
                warn!("KeyWorker [{}] ended abnormally: {}", key, e);
            }
        }
        info!("All workers stopped.");
    }
}

pub struct Application {
    pub config: Config,
    pub persistence: PersistenceHandle,
    pub services: ServicesHandle,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self> {
        info!(
            "Building MarginZone Application ({} symbols x {} timeframes)...",
            config.service.symbols.len(),
            config.service.timeframes.len()
        );

        let persistence = PersistenceBootstrap::init(&config).await?;
        let services = ServicesBootstrap::init(&config);

        Ok(Self {
            config,
            persistence,
            services,
        })
    }

    /// Restores zone state for the configured keys
    pub async fn load_registry(&self) -> ZoneRegistry {
        let keys = self.config.keys();
        let mut registry = ZoneRegistry::with_keys(self.config.engine.zone.clone(), keys.iter().cloned());

        match self.persistence.zone_repository.load_snapshots().await {
            Ok(snapshots) => {
                let configured: HashSet<&SeriesKey> = keys.iter().collect();
                let mut restored = 0;
                for snapshot in snapshots {
                    if configured.contains(&snapshot.key) {
                        registry.restore(snapshot);
                        restored += 1;
                    }
                }
                info!("Restored zone state for {}/{} keys", restored, keys.len());
            }
            Err(e) => warn!("Failed to load zone snapshots, starting fresh: {:#}", e),
        }

        registry
    }

    /// Spawns one worker per (symbol, timeframe)
    pub async fn start(self) -> Result<SystemHandle> {
        info!("Starting workers...");

        let registry = self.load_registry().await;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut workers = Vec::with_capacity(registry.len());
        for engine in registry.into_engines() {
            let key = engine.key().clone();
            let worker = KeyWorker::new(
                engine,
                self.services.candle_source.clone(),
                self.services.orchestrator.clone(),
                self.persistence.signal_repository.clone(),
                self.persistence.zone_repository.clone(),
                self.services.notifier.clone(),
                self.config.poll_interval(key.timeframe),
            );
            let handle = tokio::spawn(worker.run(shutdown_rx.clone()));
            workers.push((key, handle));
        }

        info!("{} workers running.", workers.len());
        Ok(SystemHandle {
            shutdown_tx,
            workers,
        })
    }
}
