//! Core use-case services.
//!
//! # Responsibility
//! - Own the reminder collection and its mutate-then-flush contract.
//! - Run due-reminder scan cycles against an injected clock and sink.

pub mod collection;
pub mod scanner;
