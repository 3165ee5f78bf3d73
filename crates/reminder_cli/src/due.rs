//! Due-time input parsing.

use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;

const ACCEPTED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
];

/// Parses a local wall-clock due time.
pub fn parse_due(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| {
            anyhow!("unrecognized due time `{value}`; try `YYYY-MM-DD HH:MM` or `DD/MM/YYYY HH:MM`")
        })
}
