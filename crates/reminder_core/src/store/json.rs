//! JSON file store.
//!
//! # Responsibility
//! - Persist reminders as a pretty-printed JSON array of
//!   `{ id, desc, due, notified }` records.
//! - Stay readable for files written before reminders carried ids; those
//!   records get ids derived from their position and content.
//!
//! # Invariants
//! - Writes go to a sibling temp file that is renamed over the target, so
//!   readers see either the previous or the new content.

use super::{ensure_unique_ids, LoadCorruption, PersistenceError, ReminderStore, StoreResult};
use crate::model::reminder::{Reminder, ReminderRecord};
use log::{debug, error};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

/// File-backed store holding the whole collection in one JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn write_atomically(&self, bytes: &[u8]) -> StoreResult<()> {
        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|err| self.io_error(err))?;

        let mut tmp = NamedTempFile::new_in(&parent).map_err(|err| self.io_error(err))?;
        tmp.write_all(bytes).map_err(|err| self.io_error(err))?;
        tmp.as_file().sync_all().map_err(|err| self.io_error(err))?;
        tmp.persist(&self.path).map_err(|err| self.io_error(err.error))?;
        Ok(())
    }
}

impl ReminderStore for JsonFileStore {
    fn try_load(&self) -> Result<Vec<Reminder>, LoadCorruption> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(LoadCorruption::Io(err)),
        };

        let records: Vec<ReminderRecord> =
            serde_json::from_str(&text).map_err(LoadCorruption::Parse)?;
        let reminders = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| {
                record.into_reminder(position).map_err(|err| {
                    LoadCorruption::InvalidRecord(format!("record {position}: {err}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        ensure_unique_ids(&reminders)?;

        debug!(
            "event=store_load module=store backend=json status=ok count={}",
            reminders.len()
        );
        Ok(reminders)
    }

    fn save(&self, reminders: &[Reminder]) -> StoreResult<()> {
        let started_at = Instant::now();
        let bytes = serde_json::to_vec_pretty(reminders).map_err(PersistenceError::Serialize)?;

        match self.write_atomically(&bytes) {
            Ok(()) => {
                debug!(
                    "event=store_save module=store backend=json status=ok count={} duration_ms={}",
                    reminders.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_save module=store backend=json status=error count={} error={}",
                    reminders.len(),
                    err
                );
                Err(err)
            }
        }
    }
}
