//! Runtime configuration for embedding the reminder core.
//!
//! # Responsibility
//! - Hold the store location/backend, scan cadence and logging options.
//! - Build the configured store.
//!
//! # Invariants
//! - `scan_interval` is never zero after `validate()`.
//! - The default data file is a single well-known per-user path.

use crate::logging::default_log_level;
use crate::store::{JsonFileStore, ReminderStore, SqliteOpenError, SqliteStore};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);
const JSON_FILE_NAME: &str = ".reminder_app_tasks.json";
const SQLITE_FILE_NAME: &str = ".reminder_app_tasks.sqlite3";

/// Durable medium used by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Json,
    Sqlite,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Sqlite => "sqlite",
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            Self::Json => JSON_FILE_NAME,
            Self::Sqlite => SQLITE_FILE_NAME,
        }
    }
}

impl Display for StoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownBackend(String),
    ZeroScanInterval,
    EmptyDataFile,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownBackend(value) => {
                write!(f, "unsupported store backend `{value}`; expected json|sqlite")
            }
            Self::ZeroScanInterval => write!(f, "scan interval must be greater than zero"),
            Self::EmptyDataFile => write!(f, "data file path cannot be empty"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderConfig {
    pub data_file: PathBuf,
    pub backend: StoreBackend,
    pub scan_interval: Duration,
    pub log_level: String,
    /// File logging is off when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        let backend = StoreBackend::default();
        Self {
            data_file: default_data_file(backend),
            backend,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl ReminderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_interval.is_zero() {
            return Err(ConfigError::ZeroScanInterval);
        }
        if self.data_file.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDataFile);
        }
        Ok(())
    }

    /// Opens the configured store.
    ///
    /// # Errors
    /// - SQLite open failures, including a schema newer than this build
    ///   supports. The JSON backend never fails here.
    pub fn open_store(&self) -> Result<Box<dyn ReminderStore + Send>, SqliteOpenError> {
        match self.backend {
            StoreBackend::Json => Ok(Box::new(JsonFileStore::new(self.data_file.clone()))),
            StoreBackend::Sqlite => Ok(Box::new(SqliteStore::open(&self.data_file)?)),
        }
    }
}

/// Per-user default location for `backend`, under the home directory.
pub fn default_data_file(backend: StoreBackend) -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(backend.file_name())
}

#[cfg(test)]
mod tests {
    use super::{default_data_file, ConfigError, ReminderConfig, StoreBackend};
    use crate::store::ReminderStore;
    use std::time::Duration;

    #[test]
    fn default_config_scans_every_thirty_seconds() {
        let config = ReminderConfig::default();
        assert_eq!(config.scan_interval, Duration::from_secs(30));
        assert_eq!(config.backend, StoreBackend::Json);
        assert!(config.data_file.ends_with(".reminder_app_tasks.json"));
        config.validate().unwrap();
    }

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!(" SQLite ".parse::<StoreBackend>().unwrap(), StoreBackend::Sqlite);
        assert_eq!("json".parse::<StoreBackend>().unwrap(), StoreBackend::Json);
        let err = "yaml".parse::<StoreBackend>().unwrap_err();
        assert_eq!(err, ConfigError::UnknownBackend("yaml".to_string()));
    }

    #[test]
    fn validate_rejects_zero_interval_and_empty_path() {
        let mut config = ReminderConfig {
            scan_interval: Duration::ZERO,
            ..ReminderConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroScanInterval));

        config.scan_interval = Duration::from_secs(5);
        config.data_file = Default::default();
        assert_eq!(config.validate(), Err(ConfigError::EmptyDataFile));
    }

    #[test]
    fn open_store_builds_each_backend() {
        let dir = tempfile::tempdir().unwrap();
        for backend in [StoreBackend::Json, StoreBackend::Sqlite] {
            let config = ReminderConfig {
                data_file: dir.path().join(format!("tasks.{backend}")),
                backend,
                ..ReminderConfig::default()
            };
            let store = config.open_store().unwrap();
            assert!(store.try_load().unwrap().is_empty());
        }
    }

    #[test]
    fn sqlite_default_file_differs_from_json() {
        assert_ne!(
            default_data_file(StoreBackend::Json),
            default_data_file(StoreBackend::Sqlite)
        );
    }
}
