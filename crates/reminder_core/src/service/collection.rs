//! Reminder collection service.
//!
//! # Responsibility
//! - Own the ordered reminder sequence for one process.
//! - Route every mutation through validation and a synchronous store flush.
//!
//! # Invariants
//! - Insertion order is display order; nothing here re-sorts.
//! - A mutating call that returns `Ok` has been saved.
//! - Calls that change nothing never touch the store.
//! - A failed save does not roll back the in-memory change.

use crate::model::reminder::{Reminder, ReminderId, ReminderValidationError};
use crate::store::{PersistenceError, ReminderStore, StoreResult};
use chrono::NaiveDateTime;
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure of a collection mutation.
#[derive(Debug)]
pub enum CollectionError {
    /// Caller-supplied data was rejected; nothing changed.
    Validation(ReminderValidationError),
    /// State changed in memory but could not be made durable.
    Persistence(PersistenceError),
}

impl Display for CollectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CollectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<ReminderValidationError> for CollectionError {
    fn from(value: ReminderValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersistenceError> for CollectionError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

/// Ordered, store-backed set of reminders.
pub struct ReminderCollection<S: ReminderStore> {
    store: S,
    reminders: Vec<Reminder>,
}

impl<S: ReminderStore> ReminderCollection<S> {
    /// Loads the collection from `store`. Corrupt state yields an empty collection.
    pub fn open(store: S) -> Self {
        let reminders = store.load();
        info!(
            "event=collection_open module=collection status=ok count={}",
            reminders.len()
        );
        Self { store, reminders }
    }

    /// Creates and appends a reminder, then flushes.
    ///
    /// # Errors
    /// - `Validation` when `description` is blank; the store is not touched.
    /// - `Persistence` when the flush fails; the reminder stays in memory.
    pub fn add(
        &mut self,
        description: impl AsRef<str>,
        due_at: NaiveDateTime,
    ) -> Result<Reminder, CollectionError> {
        let reminder = Reminder::new(description, due_at)?;
        self.reminders.push(reminder.clone());
        info!(
            "event=reminder_add module=collection status=ok id={}",
            reminder.id()
        );
        self.flush()?;
        Ok(reminder)
    }

    /// Deletes every reminder whose id is in `ids` and returns how many went.
    ///
    /// Unknown ids are ignored. Nothing is saved when nothing was deleted.
    pub fn remove(&mut self, ids: &HashSet<ReminderId>) -> StoreResult<usize> {
        let before = self.reminders.len();
        self.reminders.retain(|reminder| !ids.contains(&reminder.id()));
        let removed = before - self.reminders.len();

        if removed == 0 {
            return Ok(0);
        }

        info!(
            "event=reminder_remove module=collection status=ok removed={}",
            removed
        );
        self.flush()?;
        Ok(removed)
    }

    /// Read-only view in insertion order.
    pub fn all(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn get(&self, id: ReminderId) -> Option<&Reminder> {
        self.reminders.iter().find(|reminder| reminder.id() == id)
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    /// Reminders that have not fired yet, in insertion order.
    pub fn pending(&self) -> impl Iterator<Item = &Reminder> + '_ {
        self.reminders.iter().filter(|reminder| !reminder.notified())
    }

    /// Ids of reminders due at `now`, in insertion order.
    pub fn due_ids(&self, now: NaiveDateTime) -> Vec<ReminderId> {
        self.reminders
            .iter()
            .filter(|reminder| reminder.is_due(now))
            .map(Reminder::id)
            .collect()
    }

    /// Flags a reminder as notified.
    ///
    /// Returns `Ok(true)` when the flag flipped, `Ok(false)` when the id is
    /// unknown or already notified (no save in that case).
    pub fn mark_notified(&mut self, id: ReminderId) -> StoreResult<bool> {
        let changed = self
            .reminders
            .iter_mut()
            .find(|reminder| reminder.id() == id)
            .is_some_and(Reminder::mark_notified);

        if !changed {
            return Ok(false);
        }

        self.flush()?;
        Ok(true)
    }

    /// Writes the current in-memory state to the store.
    ///
    /// Callers use this to retry after a `PersistenceError`.
    pub fn flush(&self) -> StoreResult<()> {
        self.store.save(&self.reminders).map_err(|err| {
            warn!(
                "event=collection_flush module=collection status=error count={} error={}",
                self.reminders.len(),
                err
            );
            err
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
