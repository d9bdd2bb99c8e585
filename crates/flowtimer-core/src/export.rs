//! Session data export.
//!
//! The exported document has the same shape as the stored session data,
//! so a web build of the timer can read it back.

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt::Display;

use crate::storage::SessionStore;

/// A rendered export and the name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportDocument {
    pub file_name: String,
    pub contents: String,
}

/// `flow-timer-data-YYYY-MM-DD.json`, dated in `now`'s time zone.
pub fn file_name<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("flow-timer-data-{}.json", now.format("%Y-%m-%d"))
}

/// Render the full log and the in-progress record as pretty JSON.
pub fn export_document<Tz>(
    store: &SessionStore,
    now: &DateTime<Tz>,
) -> Result<ExportDocument, serde_json::Error>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    Ok(ExportDocument {
        file_name: file_name(now),
        contents: serde_json::to_string_pretty(store)?,
    })
}
