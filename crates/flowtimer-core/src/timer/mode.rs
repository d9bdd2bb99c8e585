use serde::{Deserialize, Serialize};

use crate::storage::{SessionKind, Settings};

/// Which interval family is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Focus,
    Break,
    LongBreak,
}

impl Mode {
    pub fn is_break(self) -> bool {
        !matches!(self, Mode::Focus)
    }

    /// Kind of session record an interval in this mode produces.
    pub fn session_kind(self) -> SessionKind {
        match self {
            Mode::Focus => SessionKind::Focus,
            Mode::Break | Mode::LongBreak => SessionKind::Break,
        }
    }

    /// Planned length of an interval in this mode.
    pub fn planned_secs(self, settings: &Settings) -> u64 {
        match self {
            Mode::Focus => settings.focus_secs,
            Mode::Break => settings.break_secs,
            Mode::LongBreak => settings.long_break_secs,
        }
    }

    /// The break that follows `completed` focus intervals.
    pub fn break_after(completed: u32, sessions_before_long_break: u32) -> Self {
        if completed > 0
            && sessions_before_long_break > 0
            && completed % sessions_before_long_break == 0
        {
            Mode::LongBreak
        } else {
            Mode::Break
        }
    }
}

/// Whether the active interval is counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Configured but not started.
    #[default]
    Idle,
    Running,
    /// Started but frozen.
    Paused,
}

impl RunStatus {
    /// An interval is underway, counting or not.
    pub fn is_active(self) -> bool {
        !matches!(self, RunStatus::Idle)
    }
}
