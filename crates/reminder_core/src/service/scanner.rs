//! Due-reminder scanner.
//!
//! # Responsibility
//! - Run one scan cycle: find un-notified reminders whose due time has
//!   passed, deliver each through the sink, then flag it notified.
//! - Collapse overlapping timer firings into a single cycle.
//!
//! # Invariants
//! - `now` is read once per cycle.
//! - Dispatch follows collection (insertion) order.
//! - A failed delivery leaves the reminder un-notified for the next cycle and
//!   does not stop the remaining deliveries.
//! - At most one cycle runs at a time per scanner.

use crate::clock::Clock;
use crate::model::reminder::ReminderId;
use crate::notify::{NotificationDeliveryError, NotificationSink};
use crate::service::collection::ReminderCollection;
use crate::store::{PersistenceError, ReminderStore};
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Outcome of one scan cycle.
#[derive(Debug)]
pub struct ScanReport {
    /// Threshold every reminder in this cycle was compared against.
    pub scanned_at: NaiveDateTime,
    /// Reminders delivered and flagged this cycle, in dispatch order.
    pub notified: Vec<ReminderId>,
    /// Deliveries that failed; those reminders stay pending.
    pub delivery_failures: Vec<NotificationDeliveryError>,
    /// Reminders delivered and flagged in memory whose flag could not be saved.
    pub persistence_failures: Vec<(ReminderId, PersistenceError)>,
}

impl ScanReport {
    fn new(scanned_at: NaiveDateTime) -> Self {
        Self {
            scanned_at,
            notified: Vec::new(),
            delivery_failures: Vec::new(),
            persistence_failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.delivery_failures.is_empty() && self.persistence_failures.is_empty()
    }
}

/// Periodic due detector driven by an injected clock and sink.
pub struct DueScanner<C: Clock, N: NotificationSink> {
    clock: C,
    sink: N,
    in_flight: AtomicBool,
}

impl<C: Clock, N: NotificationSink> DueScanner<C, N> {
    pub fn new(clock: C, sink: N) -> Self {
        Self {
            clock,
            sink,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// Runs one scan cycle over `collection`.
    pub fn scan<S: ReminderStore>(&self, collection: &mut ReminderCollection<S>) -> ScanReport {
        let started_at = Instant::now();
        let now = self.clock.now();
        let mut report = ScanReport::new(now);

        for id in collection.due_ids(now) {
            let Some(reminder) = collection.get(id).cloned() else {
                continue;
            };

            if let Err(err) = self.sink.notify(&reminder) {
                warn!(
                    "event=reminder_notify module=scanner status=error id={} error={}",
                    id, err
                );
                report.delivery_failures.push(err);
                continue;
            }

            // The flag stands in memory even if the save fails, so the alert
            // is not repeated; the next successful flush makes it durable.
            match collection.mark_notified(id) {
                Ok(_) => report.notified.push(id),
                Err(err) => {
                    warn!(
                        "event=reminder_mark module=scanner status=error id={} error={}",
                        id, err
                    );
                    report.notified.push(id);
                    report.persistence_failures.push((id, err));
                }
            }
        }

        if report.notified.is_empty() && report.delivery_failures.is_empty() {
            debug!(
                "event=scan_cycle module=scanner status=idle duration_ms={}",
                started_at.elapsed().as_millis()
            );
        } else {
            info!(
                "event=scan_cycle module=scanner status={} notified={} delivery_failures={} persistence_failures={} duration_ms={}",
                if report.is_clean() { "ok" } else { "degraded" },
                report.notified.len(),
                report.delivery_failures.len(),
                report.persistence_failures.len(),
                started_at.elapsed().as_millis()
            );
        }

        report
    }

    /// Timer entry point over a shared collection.
    ///
    /// Returns `None` without scanning when another cycle of this scanner is
    /// still running. The mutex serializes the cycle with presentation-layer
    /// mutations.
    pub fn tick<S: ReminderStore>(
        &self,
        shared: &Mutex<ReminderCollection<S>>,
    ) -> Option<ScanReport> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("event=scan_cycle module=scanner status=collapsed");
            return None;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let mut collection = shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Some(self.scan(&mut collection))
    }

    /// Whether a cycle is currently running.
    pub fn is_scanning(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
