//! SQLite reminder store.
//!
//! # Responsibility
//! - Persist reminders in the `reminders` table, keeping insertion order
//!   through the `position` column.
//! - Create the schema on first open and refuse databases from newer builds.
//! - Move an unreadable database file aside and start from a fresh one.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - `save` replaces every row inside one transaction.
//! - Read paths reject rows that do not decode into a valid `Reminder`.

use super::{LoadCorruption, PersistenceError, ReminderStore, StoreResult};
use crate::model::reminder::{Reminder, ReminderId};
use chrono::NaiveDateTime;
use log::{debug, error, info, warn};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;
const SCHEMA_SQL: &str = include_str!("sqlite_schema.sql");
const DUE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const QUARANTINE_SUFFIX: &str = ".corrupt";

/// Failure to open a usable reminder database.
#[derive(Debug)]
pub enum SqliteOpenError {
    Sqlite(rusqlite::Error),
    /// Written by a newer build; opening it would risk overwriting its data.
    UnsupportedSchemaVersion { found: u32, supported: u32 },
    /// Unreadable file could not be moved aside.
    Quarantine {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for SqliteOpenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "reminder database schema version {found} is newer than supported {supported}"
            ),
            Self::Quarantine { path, source } => write!(
                f,
                "failed to move unreadable database `{}` aside: {source}",
                path.display()
            ),
        }
    }
}

impl Error for SqliteOpenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::Quarantine { source, .. } => Some(source),
        }
    }
}

impl From<rusqlite::Error> for SqliteOpenError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// SQLite-backed reminder store owning its connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens the database at `path`, creating the schema when absent.
    ///
    /// A file that is not a database (or is corrupt) is renamed to
    /// `<path>.corrupt` and replaced by an empty database.
    ///
    /// # Errors
    /// - `UnsupportedSchemaVersion` for databases written by a newer build.
    /// - `Quarantine` when the unreadable file cannot be renamed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqliteOpenError> {
        let path = path.as_ref();
        let started_at = Instant::now();

        let result = match Self::open_file(path) {
            Err(SqliteOpenError::Sqlite(err)) if is_unreadable_file(&err) => {
                let aside = quarantine(path)?;
                warn!(
                    "event=store_open module=store backend=sqlite status=corrupt action=quarantine moved_to={} error={}",
                    aside.display(),
                    err
                );
                Self::open_file(path)
            }
            other => other,
        };

        match &result {
            Ok(_) => info!(
                "event=store_open module=store backend=sqlite status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=store_open module=store backend=sqlite status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    pub fn open_in_memory() -> Result<Self, SqliteOpenError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Exposes the connection for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn open_file(path: &Path) -> Result<Self, SqliteOpenError> {
        Self::from_connection(Connection::open(path)?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self, SqliteOpenError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        ensure_schema(&mut conn)?;
        Ok(Self { conn })
    }

    fn replace_all(&self, reminders: &[Reminder]) -> rusqlite::Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM reminders;", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO reminders (id, position, desc, due, notified)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
            )?;
            for (position, reminder) in reminders.iter().enumerate() {
                stmt.execute(params![
                    reminder.id().to_string(),
                    position as i64,
                    reminder.description(),
                    reminder.due_at().format(DUE_FORMAT).to_string(),
                    bool_to_int(reminder.notified()),
                ])?;
            }
        }
        tx.commit()
    }
}

impl ReminderStore for SqliteStore {
    fn try_load(&self) -> Result<Vec<Reminder>, LoadCorruption> {
        let mut stmt = self.conn.prepare(
            "SELECT id, desc, due, notified
             FROM reminders
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut reminders = Vec::new();
        while let Some(row) = rows.next()? {
            reminders.push(parse_reminder_row(row)?);
        }

        debug!(
            "event=store_load module=store backend=sqlite status=ok count={}",
            reminders.len()
        );
        Ok(reminders)
    }

    fn save(&self, reminders: &[Reminder]) -> StoreResult<()> {
        match self.replace_all(reminders) {
            Ok(()) => {
                debug!(
                    "event=store_save module=store backend=sqlite status=ok count={}",
                    reminders.len()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_save module=store backend=sqlite status=error count={} error={}",
                    reminders.len(),
                    err
                );
                Err(PersistenceError::from(err))
            }
        }
    }
}

fn ensure_schema(conn: &mut Connection) -> Result<(), SqliteOpenError> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    match found {
        SCHEMA_VERSION => Ok(()),
        0 => {
            let tx = conn.transaction()?;
            tx.execute_batch(SCHEMA_SQL)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
            info!(
                "event=store_schema module=store backend=sqlite status=created version={}",
                SCHEMA_VERSION
            );
            Ok(())
        }
        newer => Err(SqliteOpenError::UnsupportedSchemaVersion {
            found: newer,
            supported: SCHEMA_VERSION,
        }),
    }
}

fn is_unreadable_file(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
    )
}

/// Renames `path` to `<path>.corrupt`, replacing an older quarantined copy.
fn quarantine(path: &Path) -> Result<PathBuf, SqliteOpenError> {
    let mut aside = path.as_os_str().to_owned();
    aside.push(QUARANTINE_SUFFIX);
    let aside = PathBuf::from(aside);
    std::fs::rename(path, &aside).map_err(|source| SqliteOpenError::Quarantine {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(aside)
}

fn parse_reminder_row(row: &Row<'_>) -> Result<Reminder, LoadCorruption> {
    let id_text: String = row.get("id")?;
    let id: ReminderId = Uuid::parse_str(&id_text).map_err(|_| {
        LoadCorruption::InvalidRecord(format!("invalid uuid value `{id_text}` in reminders.id"))
    })?;

    let due_text: String = row.get("due")?;
    let due = NaiveDateTime::parse_from_str(&due_text, DUE_FORMAT).map_err(|_| {
        LoadCorruption::InvalidRecord(format!(
            "invalid timestamp `{due_text}` in reminders.due"
        ))
    })?;

    let notified = match row.get::<_, i64>("notified")? {
        0 => false,
        1 => true,
        other => {
            return Err(LoadCorruption::InvalidRecord(format!(
                "invalid notified value `{other}` in reminders.notified"
            )));
        }
    };

    let desc: String = row.get("desc")?;
    Reminder::from_parts(id, &desc, due, notified)
        .map_err(|err| LoadCorruption::InvalidRecord(format!("reminder {id}: {err}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
