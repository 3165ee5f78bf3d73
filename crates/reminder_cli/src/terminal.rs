//! Terminal rendering and the stdout alert sink.

use reminder_core::{NotificationDeliveryError, NotificationSink, Reminder, ScanReport};

const TABLE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Prints one alert line per due reminder.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalSink;

impl NotificationSink for TerminalSink {
    fn notify(&self, reminder: &Reminder) -> Result<(), NotificationDeliveryError> {
        println!(
            "\u{23F0} Reminder: {} (due {})",
            reminder.description(),
            reminder.due_at().format(TABLE_TIME_FORMAT)
        );
        Ok(())
    }
}

/// `<id>  <due>  <status>  <description>`
pub fn render_row(reminder: &Reminder) -> String {
    format!(
        "{}  {}  {}  {}",
        reminder.id(),
        reminder.due_at().format(TABLE_TIME_FORMAT),
        if reminder.notified() { "done" } else { "    " },
        reminder.description()
    )
}

/// Surfaces background failures without aborting.
pub fn print_report(report: &ScanReport) {
    for err in &report.delivery_failures {
        eprintln!("warning: {err}; will retry next cycle");
    }
    for (id, err) in &report.persistence_failures {
        eprintln!("warning: reminder {id} notified but not saved: {err}");
    }
}
