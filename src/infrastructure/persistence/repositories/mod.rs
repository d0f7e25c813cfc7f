pub mod signal_repository;
pub mod zone_repository;

pub use signal_repository::SqliteSignalRepository;
pub use zone_repository::SqliteZoneRepository;
