//! Session log: completed intervals plus the one in progress.
//!
//! The log is append-only from the engine's point of view; the only removal
//! is [`SessionStore::pop_last`], used to reverse a skip. Records serialize
//! with the same field names the web app wrote, so its exports load here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::{KeyValueStore, SESSION_DATA_KEY};
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Focus,
    Break,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "type")]
    pub kind: SessionKind,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(rename = "plannedDuration")]
    pub planned_duration_secs: u64,
    #[serde(rename = "actualDuration", default)]
    pub actual_duration_secs: u64,
    /// Seconds spent beyond the planned duration. Always 0 for breaks.
    #[serde(rename = "flowStateDuration", default)]
    pub flow_state_duration_secs: u64,
    #[serde(rename = "isCompleted", default)]
    pub completed: bool,
}

impl SessionRecord {
    /// A fresh, not yet finalized record.
    pub fn begin(kind: SessionKind, planned_duration_secs: u64, start: DateTime<Utc>) -> Self {
        Self {
            kind,
            start,
            end: None,
            planned_duration_secs,
            actual_duration_secs: 0,
            flow_state_duration_secs: 0,
            completed: false,
        }
    }

    /// Stamp end time and actual duration, marking the record completed.
    pub fn finalize(mut self, end: DateTime<Utc>, actual_duration_secs: u64) -> Self {
        self.end = Some(end);
        self.actual_duration_secs = actual_duration_secs;
        self.flow_state_duration_secs = match self.kind {
            SessionKind::Focus => actual_duration_secs.saturating_sub(self.planned_duration_secs),
            SessionKind::Break => 0,
        };
        self.completed = true;
        self
    }

    pub fn is_focus(&self) -> bool {
        self.kind == SessionKind::Focus
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStore {
    sessions: Vec<SessionRecord>,
    #[serde(rename = "currentSession", default)]
    current: Option<SessionRecord>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized record to the log.
    pub fn append_completed(&mut self, record: SessionRecord) {
        debug_assert!(record.completed, "only finalized records belong in the log");
        self.sessions.push(record);
    }

    pub fn current(&self) -> Option<&SessionRecord> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut SessionRecord> {
        self.current.as_mut()
    }

    pub fn set_current(&mut self, record: Option<SessionRecord>) {
        self.current = record;
    }

    pub fn take_current(&mut self) -> Option<SessionRecord> {
        self.current.take()
    }

    /// The full log in completion order.
    pub fn all(&self) -> &[SessionRecord] {
        &self.sessions
    }

    /// Remove and return the most recently appended record.
    pub fn pop_last(&mut self) -> Option<SessionRecord> {
        self.sessions.pop()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
        self.current = None;
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn completed_focus_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.is_focus() && s.completed)
            .count()
    }

    /// Load from the key-value store. Absent or malformed data yields an
    /// empty store; individual malformed records are dropped.
    pub fn load(kv: &dyn KeyValueStore) -> Self {
        match kv.get(SESSION_DATA_KEY) {
            Ok(Some(raw)) => Self::from_json_lenient(&raw),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(error = %e, "failed to read session data, starting empty");
                Self::default()
            }
        }
    }

    pub fn from_json_lenient(raw: &str) -> Self {
        let value = match serde_json::from_str::<Value>(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "failed to parse session data, starting empty");
                return Self::default();
            }
        };

        let sessions = match value.get("sessions") {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| {
                    serde_json::from_value::<SessionRecord>(item.clone())
                        .map_err(|e| warn!(index, error = %e, "dropping malformed session record"))
                        .ok()
                })
                .collect(),
            Some(_) => {
                warn!("session list is not an array, starting empty");
                Vec::new()
            }
            None => Vec::new(),
        };

        let current = value
            .get("currentSession")
            .filter(|v| !v.is_null())
            .and_then(|v| {
                serde_json::from_value::<SessionRecord>(v.clone())
                    .map_err(|e| warn!(error = %e, "dropping malformed current session"))
                    .ok()
            });

        Self { sessions, current }
    }

    /// Persist to the key-value store.
    ///
    /// # Errors
    /// Returns an error if serialization or the underlying write fails.
    pub fn save(&self, kv: &mut dyn KeyValueStore) -> Result<(), CoreError> {
        let json = serde_json::to_string(self)?;
        kv.set(SESSION_DATA_KEY, &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, h, m, 0).unwrap()
    }

    #[test]
    fn finalize_stamps_flow_for_focus_only() {
        let focus = SessionRecord::begin(SessionKind::Focus, 1500, at(9, 0)).finalize(at(9, 25), 1501);
        assert!(focus.completed);
        assert_eq!(focus.end, Some(at(9, 25)));
        assert_eq!(focus.actual_duration_secs, 1501);
        assert_eq!(focus.flow_state_duration_secs, 1);

        let short = SessionRecord::begin(SessionKind::Focus, 1500, at(9, 0)).finalize(at(9, 10), 600);
        assert_eq!(short.flow_state_duration_secs, 0);

        let rest = SessionRecord::begin(SessionKind::Break, 300, at(9, 30)).finalize(at(9, 40), 600);
        assert_eq!(rest.flow_state_duration_secs, 0);
    }

    #[test]
    fn append_and_pop_preserve_order() {
        let mut store = SessionStore::new();
        let a = SessionRecord::begin(SessionKind::Focus, 60, at(9, 0)).finalize(at(9, 1), 60);
        let b = SessionRecord::begin(SessionKind::Break, 30, at(9, 1)).finalize(at(9, 2), 30);
        store.append_completed(a.clone());
        store.append_completed(b.clone());
        assert_eq!(store.all(), &[a.clone(), b.clone()]);
        assert_eq!(store.pop_last(), Some(b));
        assert_eq!(store.all(), &[a]);
    }

    #[test]
    fn save_and_load_roundtrip_through_kv() {
        let mut kv = MemoryStore::new();
        let mut store = SessionStore::new();
        store.append_completed(
            SessionRecord::begin(SessionKind::Focus, 1500, at(9, 0)).finalize(at(9, 30), 1800),
        );
        store.set_current(Some(SessionRecord::begin(SessionKind::Break, 300, at(9, 30))));
        store.save(&mut kv).unwrap();

        let loaded = SessionStore::load(&kv);
        assert_eq!(loaded, store);
    }

    #[test]
    fn web_format_uses_original_field_names() {
        let mut store = SessionStore::new();
        store.append_completed(
            SessionRecord::begin(SessionKind::Focus, 1500, at(9, 0)).finalize(at(9, 30), 1800),
        );
        let json: Value = serde_json::to_value(&store).unwrap();
        let rec = &json["sessions"][0];
        assert_eq!(rec["type"], "focus");
        assert_eq!(rec["plannedDuration"], 1500);
        assert_eq!(rec["actualDuration"], 1800);
        assert_eq!(rec["flowStateDuration"], 300);
        assert_eq!(rec["isCompleted"], true);
        assert!(rec["start"].as_str().unwrap().starts_with("2024-05-06T09:00:00"));
        assert!(json["currentSession"].is_null());
    }

    #[test]
    fn loads_break_record_without_flow_field() {
        let raw = r#"{"sessions":[{"type":"break","start":"2024-05-06T09:00:00.000Z",
            "end":"2024-05-06T09:05:00.000Z","plannedDuration":300,"actualDuration":300,
            "isCompleted":true}],"currentSession":null}"#;
        let store = SessionStore::from_json_lenient(raw);
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].flow_state_duration_secs, 0);
        assert_eq!(store.all()[0].end, Some(at(9, 5)));
    }

    #[test]
    fn malformed_data_falls_back_to_empty() {
        assert!(SessionStore::from_json_lenient("{{{").is_empty());
        assert!(SessionStore::from_json_lenient(r#"{"sessions": 5}"#).is_empty());

        let kv = MemoryStore::new().with_entry(SESSION_DATA_KEY, "nonsense");
        let store = SessionStore::load(&kv);
        assert!(store.is_empty());
        assert!(store.current().is_none());
    }

    #[test]
    fn malformed_records_are_dropped_individually() {
        let raw = r#"{"sessions":[
            {"type":"focus","start":"2024-05-06T09:00:00Z","plannedDuration":1500,
             "actualDuration":1500,"isCompleted":true},
            {"type":"nap","start":"yesterday"}
        ],"currentSession":{"type":"focus"}}"#;
        let store = SessionStore::from_json_lenient(raw);
        assert_eq!(store.len(), 1);
        assert!(store.current().is_none());
        assert_eq!(store.completed_focus_count(), 1);
    }
}
