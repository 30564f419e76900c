//! Infrastructure layer: configuration, Postgres adapters, background workers.

pub mod catalog_loader;
pub mod config;
pub mod scan_history;
pub mod workers;

pub use config::{AppConfig, ConfigError};
pub use scan_history::{
    InMemoryScanHistory, NewScanRecord, PostgresScanHistory, ScanAction, ScanHistoryStore, ScanRecord, ScanTotals,
    StoreError,
};
