//! Core domain logic for the desktop reminder app.
//! This crate owns reminder invariants, persistence and due detection;
//! presentation layers call into it and render what it returns.

pub mod clock;
pub mod config;
pub mod logging;
pub mod model;
pub mod notify;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ReminderConfig, StoreBackend, DEFAULT_SCAN_INTERVAL};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::reminder::{Reminder, ReminderId, ReminderValidationError};
pub use notify::{CommandSink, LogSink, NotificationDeliveryError, NotificationSink};
pub use service::collection::{CollectionError, ReminderCollection};
pub use service::scanner::{DueScanner, ScanReport};
pub use store::{
    JsonFileStore, LoadCorruption, MemoryStore, PersistenceError, ReminderStore, SqliteOpenError,
    SqliteStore, StoreResult, SCHEMA_VERSION,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
