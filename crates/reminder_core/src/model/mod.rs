//! Reminder domain model.
//!
//! # Responsibility
//! - Define the canonical reminder record shared by store, collection and scanner.
//!
//! # Invariants
//! - Every reminder is identified by a stable `ReminderId`.
//! - `notified` only moves from `false` to `true`.

pub mod reminder;
