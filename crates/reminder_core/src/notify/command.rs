//! External-command notification sink.
//!
//! Runs a program such as `notify-send` once per due reminder, passing the
//! alert title and the reminder description as trailing arguments.

use super::{NotificationDeliveryError, NotificationSink, NOTIFICATION_TITLE};
use crate::model::reminder::Reminder;
use log::{debug, warn};
use std::ffi::OsString;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Sink that shells out to a desktop notifier.
#[derive(Debug, Clone)]
pub struct CommandSink {
    program: OsString,
    args: Vec<OsString>,
    timeout: Duration,
}

impl CommandSink {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Adds a fixed leading argument, placed before title and description.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl NotificationSink for CommandSink {
    fn notify(&self, reminder: &Reminder) -> Result<(), NotificationDeliveryError> {
        let id = reminder.id();
        let started_at = Instant::now();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(NOTIFICATION_TITLE)
            .arg(reminder.description())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| NotificationDeliveryError::Unavailable { id, source })?;

        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => {
                    debug!(
                        "event=notify_command module=notify status=ok id={} duration_ms={}",
                        id,
                        started_at.elapsed().as_millis()
                    );
                    return Ok(());
                }
                Ok(Some(status)) => {
                    return Err(NotificationDeliveryError::Rejected {
                        id,
                        reason: format!("notifier exited with {status}"),
                    });
                }
                Ok(None) if started_at.elapsed() >= self.timeout => {
                    if let Err(err) = child.kill() {
                        warn!(
                            "event=notify_command module=notify status=kill_failed id={} error={}",
                            id, err
                        );
                    }
                    if let Err(err) = child.wait() {
                        warn!(
                            "event=notify_command module=notify status=reap_failed id={} error={}",
                            id, err
                        );
                    }
                    return Err(NotificationDeliveryError::TimedOut {
                        id,
                        after: self.timeout,
                    });
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    return Err(NotificationDeliveryError::Unavailable { id, source });
                }
            }
        }
    }
}
