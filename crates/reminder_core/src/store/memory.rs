//! In-process store.
//!
//! Clones share one backing buffer, so a handle kept by the caller observes
//! saves made through the collection that owns another clone.

use super::{LoadCorruption, PersistenceError, ReminderStore, StoreResult};
use crate::model::reminder::Reminder;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    saved: Option<Vec<Reminder>>,
    save_count: usize,
    fail_saves: bool,
    corrupt: bool,
}

/// Memory-backed store with a save counter and injectable write failure.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose durable form already holds `reminders`.
    pub fn with_reminders(reminders: Vec<Reminder>) -> Self {
        let store = Self::default();
        store.lock().saved = Some(reminders);
        store
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    /// Last successfully saved sequence.
    pub fn snapshot(&self) -> Vec<Reminder> {
        self.lock().saved.clone().unwrap_or_default()
    }

    /// Makes subsequent saves fail with `PersistenceError::Unavailable`.
    pub fn set_fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    /// Makes subsequent loads report corruption.
    pub fn set_corrupt(&self, corrupt: bool) {
        self.lock().corrupt = corrupt;
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned buffer is still a consistent Vec; keep using it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ReminderStore for MemoryStore {
    fn try_load(&self) -> Result<Vec<Reminder>, LoadCorruption> {
        let state = self.lock();
        if state.corrupt {
            return Err(LoadCorruption::InvalidRecord(
                "memory store marked corrupt".to_string(),
            ));
        }
        Ok(state.saved.clone().unwrap_or_default())
    }

    fn save(&self, reminders: &[Reminder]) -> StoreResult<()> {
        let mut state = self.lock();
        if state.fail_saves {
            return Err(PersistenceError::Unavailable(
                "memory store rejecting writes".to_string(),
            ));
        }
        state.saved = Some(reminders.to_vec());
        state.save_count += 1;
        Ok(())
    }
}
