//! Durable storage for the reminder collection.
//!
//! # Responsibility
//! - Translate between the in-memory reminder sequence and a durable form.
//! - Keep backend details (JSON file, SQLite, memory) behind one contract.
//!
//! # Invariants
//! - `save` fully replaces the durable form; a later `load` never observes a
//!   partial write.
//! - `load` never fails: corrupt state falls back to an empty sequence.
//! - Write failures are returned, never swallowed.

use crate::model::reminder::{Reminder, ReminderId};
use log::warn;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod json;
pub mod memory;
pub mod sqlite;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::{SqliteOpenError, SqliteStore, SCHEMA_VERSION};

pub type StoreResult<T> = Result<T, PersistenceError>;

/// Failure to write the durable form.
#[derive(Debug)]
pub enum PersistenceError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Serialize(serde_json::Error),
    Db(rusqlite::Error),
    /// Backend refused the write without an underlying OS error.
    Unavailable(String),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to write `{}`: {source}", path.display())
            }
            Self::Serialize(err) => write!(f, "failed to encode reminders: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(value)
    }
}

/// Durable form exists but cannot be turned back into reminders.
#[derive(Debug)]
pub enum LoadCorruption {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Db(rusqlite::Error),
    InvalidRecord(String),
    DuplicateId(ReminderId),
}

impl Display for LoadCorruption {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read reminders: {err}"),
            Self::Parse(err) => write!(f, "malformed reminder data: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidRecord(message) => write!(f, "invalid persisted reminder: {message}"),
            Self::DuplicateId(id) => write!(f, "duplicate reminder id: {id}"),
        }
    }
}

impl Error for LoadCorruption {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidRecord(_) | Self::DuplicateId(_) => None,
        }
    }
}

impl From<rusqlite::Error> for LoadCorruption {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(value)
    }
}

/// Storage contract for the ordered reminder sequence.
pub trait ReminderStore {
    /// Reads the durable form. An absent form is `Ok(vec![])`.
    fn try_load(&self) -> Result<Vec<Reminder>, LoadCorruption>;

    /// Atomically replaces the durable form with `reminders`.
    fn save(&self, reminders: &[Reminder]) -> StoreResult<()>;

    /// Fail-soft load: corruption is logged and masked as an empty sequence.
    fn load(&self) -> Vec<Reminder> {
        match self.try_load() {
            Ok(reminders) => reminders,
            Err(err) => {
                warn!(
                    "event=store_load module=store status=corrupt fallback=empty error={}",
                    err
                );
                Vec::new()
            }
        }
    }
}

impl<S: ReminderStore + ?Sized> ReminderStore for Box<S> {
    fn try_load(&self) -> Result<Vec<Reminder>, LoadCorruption> {
        (**self).try_load()
    }

    fn save(&self, reminders: &[Reminder]) -> StoreResult<()> {
        (**self).save(reminders)
    }

    fn load(&self) -> Vec<Reminder> {
        (**self).load()
    }
}

/// Rejects sequences that reuse an id.
pub(crate) fn ensure_unique_ids(reminders: &[Reminder]) -> Result<(), LoadCorruption> {
    let mut seen = HashSet::with_capacity(reminders.len());
    for reminder in reminders {
        if !seen.insert(reminder.id()) {
            return Err(LoadCorruption::DuplicateId(reminder.id()));
        }
    }
    Ok(())
}
