//! Reminder entity.
//!
//! # Responsibility
//! - Define the reminder record and its wire shape (`id`, `desc`, `due`, `notified`).
//! - Enforce description validation at the creation boundary.
//!
//! # Invariants
//! - `id` is never nil and never changes after construction.
//! - `description` is trimmed and non-empty.
//! - `notified` starts `false` and is only set by crate-internal code.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a reminder within a collection.
pub type ReminderId = Uuid;

/// Validation failures for caller-supplied reminder data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderValidationError {
    /// Description is empty after trimming whitespace.
    EmptyDescription,
    /// Nil UUID is not a usable stable identity.
    NilId,
}

impl Display for ReminderValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "reminder description cannot be empty"),
            Self::NilId => write!(f, "reminder id must not be nil"),
        }
    }
}

impl Error for ReminderValidationError {}

/// A description paired with a due timestamp and a notified flag.
///
/// Fields are read-only outside the crate; all mutation goes through
/// `ReminderCollection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ReminderRecord")]
pub struct Reminder {
    id: ReminderId,
    #[serde(rename = "desc")]
    description: String,
    /// Local wall-clock time, no offset.
    #[serde(rename = "due")]
    due_at: NaiveDateTime,
    notified: bool,
}

impl Reminder {
    /// Creates a reminder with a generated id and `notified = false`.
    ///
    /// # Errors
    /// - `EmptyDescription` when `description` is blank after trimming.
    pub fn new(
        description: impl AsRef<str>,
        due_at: NaiveDateTime,
    ) -> Result<Self, ReminderValidationError> {
        Self::with_id(Uuid::new_v4(), description, due_at)
    }

    /// Creates a reminder with a caller-provided id.
    ///
    /// Used by import paths where identity already exists.
    pub fn with_id(
        id: ReminderId,
        description: impl AsRef<str>,
        due_at: NaiveDateTime,
    ) -> Result<Self, ReminderValidationError> {
        if id.is_nil() {
            return Err(ReminderValidationError::NilId);
        }
        let description = normalize_description(description.as_ref())?;
        Ok(Self {
            id,
            description,
            due_at,
            notified: false,
        })
    }

    pub fn id(&self) -> ReminderId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn due_at(&self) -> NaiveDateTime {
        self.due_at
    }

    pub fn notified(&self) -> bool {
        self.notified
    }

    /// Returns whether this reminder should fire at `now`.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        !self.notified && self.due_at <= now
    }

    /// Sets the notified flag. Returns `true` only on the first transition.
    pub(crate) fn mark_notified(&mut self) -> bool {
        if self.notified {
            return false;
        }
        self.notified = true;
        true
    }

    /// Rebuilds a record from persisted parts, keeping the stored flag.
    pub(crate) fn from_parts(
        id: ReminderId,
        description: &str,
        due_at: NaiveDateTime,
        notified: bool,
    ) -> Result<Self, ReminderValidationError> {
        let mut reminder = Self::with_id(id, description, due_at)?;
        reminder.notified = notified;
        Ok(reminder)
    }
}

fn normalize_description(value: &str) -> Result<String, ReminderValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ReminderValidationError::EmptyDescription);
    }
    Ok(trimmed.to_string())
}

/// Namespace for ids derived from records written before ids existed.
const LEGACY_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_93b7_4d05_8e2a_51c0_d7b9_3f64);

/// Untrusted persisted shape.
///
/// Records written before ids existed have no `id`. They get one derived
/// from their position and content, so every load of the same file agrees.
#[derive(Deserialize)]
pub(crate) struct ReminderRecord {
    #[serde(default)]
    id: Option<ReminderId>,
    desc: String,
    due: NaiveDateTime,
    #[serde(default)]
    notified: bool,
}

impl ReminderRecord {
    /// Validates the record found at `position` in its persisted list.
    pub(crate) fn into_reminder(
        self,
        position: usize,
    ) -> Result<Reminder, ReminderValidationError> {
        let id = self.id.unwrap_or_else(|| legacy_id(position, &self.desc, self.due));
        Reminder::from_parts(id, &self.desc, self.due, self.notified)
    }
}

fn legacy_id(position: usize, description: &str, due_at: NaiveDateTime) -> ReminderId {
    let name = format!("{position}\n{}\n{description}", due_at.format("%Y-%m-%dT%H:%M:%S%.f"));
    Uuid::new_v5(&LEGACY_ID_NAMESPACE, name.as_bytes())
}

impl TryFrom<ReminderRecord> for Reminder {
    type Error = ReminderValidationError;

    fn try_from(record: ReminderRecord) -> Result<Self, Self::Error> {
        record.into_reminder(0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Reminder, ReminderRecord, ReminderValidationError};
    use chrono::NaiveDate;

    #[test]
    fn mark_notified_only_transitions_once() {
        let due = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut reminder = Reminder::new("Pay rent", due).unwrap();

        assert!(reminder.mark_notified());
        assert!(!reminder.mark_notified());
        assert!(reminder.notified());
    }

    #[test]
    fn from_parts_rejects_blank_description() {
        let due = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let err = Reminder::from_parts(uuid::Uuid::new_v4(), " \t", due, true).unwrap_err();
        assert_eq!(err, ReminderValidationError::EmptyDescription);
    }

    #[test]
    fn legacy_ids_depend_on_position_and_content() {
        let record = || -> ReminderRecord {
            serde_json::from_value(serde_json::json!({
                "desc": "Pay rent",
                "due": "2024-01-01T09:00:00"
            }))
            .unwrap()
        };

        let first = record().into_reminder(0).unwrap();
        assert_eq!(first.id(), record().into_reminder(0).unwrap().id());
        assert_ne!(first.id(), record().into_reminder(1).unwrap().id());
        assert!(!first.id().is_nil());
    }

    #[test]
    fn stored_id_wins_over_derived_one() {
        let record: ReminderRecord = serde_json::from_value(serde_json::json!({
            "id": "11111111-2222-4333-8444-555555555555",
            "desc": "Pay rent",
            "due": "2024-01-01T09:00:00"
        }))
        .unwrap();

        let reminder = record.into_reminder(7).unwrap();
        assert_eq!(reminder.id().to_string(), "11111111-2222-4333-8444-555555555555");
    }
}
