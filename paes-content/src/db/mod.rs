//! Store client
//!
//! Row-level access to the shared SQLite schema created by
//! `paes_common::db::init_database`. Rows are converted to the canonical
//! models here; stored enum values are parsed leniently, the same way import
//! payloads are.

pub mod achievements;
pub mod exercises;
pub mod nodes;
pub mod progress;

use chrono::{DateTime, SecondsFormat, Utc};

/// Timestamp text format used for every TEXT time column
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text).ok().map(|ts| ts.with_timezone(&Utc))
}
