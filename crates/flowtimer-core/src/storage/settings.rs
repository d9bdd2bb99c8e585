//! User settings persisted under [`SETTINGS_KEY`](super::SETTINGS_KEY).
//!
//! Stores:
//! - Planned focus, break and long-break durations (seconds)
//! - Long-break cadence
//! - Visual cue and sound preferences
//! - Theme and accent color
//! - Completed focus session counter
//!
//! The document is JSON with camelCase keys. Loading never rejects the
//! document wholesale: each field that is missing, mistyped, or out of range
//! falls back to its own default.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::keypath;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(rename = "focusTime")]
    pub focus_secs: u64,
    #[serde(rename = "breakTime")]
    pub break_secs: u64,
    #[serde(rename = "longBreakTime")]
    pub long_break_secs: u64,
    pub sessions_before_long_break: u32,
    pub enable_visual_cues: bool,
    pub enable_sound_notifications: bool,
    pub visual_cue_intensity: u8,
    pub theme: Theme,
    pub accent_color: String,
    /// Focus intervals completed since the last full reset.
    pub completed_sessions: u32,
}

const DEFAULT_ACCENT_COLOR: &str = "#4C8BF5";

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_secs: 25 * 60,
            break_secs: 5 * 60,
            long_break_secs: 15 * 60,
            sessions_before_long_break: 4,
            enable_visual_cues: true,
            enable_sound_notifications: false,
            visual_cue_intensity: 5,
            theme: Theme::Dark,
            accent_color: DEFAULT_ACCENT_COLOR.into(),
            completed_sessions: 0,
        }
    }
}

impl Settings {
    /// Parse a stored settings document, defaulting field by field.
    ///
    /// Malformed JSON yields full defaults.
    pub fn from_json_lenient(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self::from_map_lenient(&map),
            Ok(_) => {
                warn!("settings document is not an object, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "failed to parse settings, using defaults");
                Self::default()
            }
        }
    }

    fn from_map_lenient(map: &Map<String, Value>) -> Self {
        let d = Self::default();
        Self {
            focus_secs: field(map, "focusTime", d.focus_secs, |v| *v > 0),
            break_secs: field(map, "breakTime", d.break_secs, |v| *v > 0),
            long_break_secs: field(map, "longBreakTime", d.long_break_secs, |v| *v > 0),
            sessions_before_long_break: field(
                map,
                "sessionsBeforeLongBreak",
                d.sessions_before_long_break,
                |v| *v > 0,
            ),
            enable_visual_cues: field(map, "enableVisualCues", d.enable_visual_cues, |_| true),
            enable_sound_notifications: field(
                map,
                "enableSoundNotifications",
                d.enable_sound_notifications,
                |_| true,
            ),
            visual_cue_intensity: field(map, "visualCueIntensity", d.visual_cue_intensity, |v| {
                (1..=10).contains(v)
            }),
            theme: field(map, "theme", d.theme, |_| true),
            accent_color: field(map, "accentColor", d.accent_color, |v: &String| {
                !v.is_empty()
            }),
            completed_sessions: field(map, "completedSessions", d.completed_sessions, |_| true),
        }
    }

    /// Get a setting rendered as a string by its key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        keypath::get(&json, key).map(keypath::display)
    }

    /// Set a setting by key.
    ///
    /// # Errors
    /// Returns an error for unknown keys, unparseable values, or values the
    /// lenient loader would discard (zero durations, intensity outside 1..=10).
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        keypath::set(&mut json, key, value)?;
        let updated: Settings =
            serde_json::from_value(json.clone()).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        let normalized = match &json {
            Value::Object(map) => Self::from_map_lenient(map),
            _ => updated.clone(),
        };
        if normalized != updated {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{value}' is out of range"),
            });
        }
        *self = updated;
        Ok(())
    }
}

fn field<T, F>(map: &Map<String, Value>, key: &str, default: T, valid: F) -> T
where
    T: DeserializeOwned,
    F: Fn(&T) -> bool,
{
    let Some(raw) = map.get(key) else {
        return default;
    };
    if raw.is_null() {
        return default;
    }
    match serde_json::from_value::<T>(raw.clone()) {
        Ok(v) if valid(&v) => v,
        Ok(_) => {
            warn!(key, "setting out of range, using default");
            default
        }
        Err(e) => {
            warn!(key, error = %e, "malformed setting, using default");
            default
        }
    }
}
