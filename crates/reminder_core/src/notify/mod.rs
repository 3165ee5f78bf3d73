//! Notification delivery capability.
//!
//! # Responsibility
//! - Define the contract the scanner calls to raise a human-visible alert.
//! - Provide built-in sinks for the log and external-command media.
//!
//! # Invariants
//! - Sinks report failure instead of blocking a scan cycle indefinitely.
//! - Sinks never retry on their own; the next scan cycle is the retry.

use crate::model::reminder::{Reminder, ReminderId};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub mod command;

pub use command::CommandSink;

/// Alert title shown by sinks that have a title slot.
pub const NOTIFICATION_TITLE: &str = "Reminder";

/// Sink failed to deliver one reminder.
#[derive(Debug)]
pub enum NotificationDeliveryError {
    /// Delivery channel could not be reached or started.
    Unavailable {
        id: ReminderId,
        source: std::io::Error,
    },
    /// Channel did not answer within its timeout.
    TimedOut { id: ReminderId, after: Duration },
    /// Channel answered with a failure.
    Rejected { id: ReminderId, reason: String },
}

impl NotificationDeliveryError {
    pub fn reminder_id(&self) -> ReminderId {
        match self {
            Self::Unavailable { id, .. } | Self::TimedOut { id, .. } | Self::Rejected { id, .. } => {
                *id
            }
        }
    }
}

impl Display for NotificationDeliveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { id, source } => {
                write!(f, "notification channel unavailable for {id}: {source}")
            }
            Self::TimedOut { id, after } => write!(
                f,
                "notification for {id} timed out after {}ms",
                after.as_millis()
            ),
            Self::Rejected { id, reason } => write!(f, "notification for {id} rejected: {reason}"),
        }
    }
}

impl Error for NotificationDeliveryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable { source, .. } => Some(source),
            Self::TimedOut { .. } | Self::Rejected { .. } => None,
        }
    }
}

/// Delivery capability for due reminders.
pub trait NotificationSink {
    fn notify(&self, reminder: &Reminder) -> Result<(), NotificationDeliveryError>;
}

impl<N: NotificationSink + ?Sized> NotificationSink for &N {
    fn notify(&self, reminder: &Reminder) -> Result<(), NotificationDeliveryError> {
        (**self).notify(reminder)
    }
}

impl<N: NotificationSink + ?Sized> NotificationSink for Box<N> {
    fn notify(&self, reminder: &Reminder) -> Result<(), NotificationDeliveryError> {
        (**self).notify(reminder)
    }
}

/// Delivers alerts as `info` records on the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, reminder: &Reminder) -> Result<(), NotificationDeliveryError> {
        info!(
            target: "reminder::alert",
            "{}: {} (due {})",
            NOTIFICATION_TITLE,
            reminder.description(),
            reminder.due_at()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LogSink, NotificationDeliveryError, NotificationSink};
    use crate::model::reminder::Reminder;
    use chrono::NaiveDate;
    use std::time::Duration;

    #[test]
    fn log_sink_always_delivers() {
        let due = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let reminder = Reminder::new("Pay rent", due).unwrap();
        LogSink.notify(&reminder).unwrap();
    }

    #[test]
    fn delivery_error_exposes_reminder_id() {
        let id = uuid::Uuid::new_v4();
        let err = NotificationDeliveryError::TimedOut {
            id,
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.reminder_id(), id);
        assert!(err.to_string().contains("1500ms"));
    }
}
