//! Presentation values derived from timer state.

use serde::{Deserialize, Serialize};

use super::mode::{Mode, RunStatus};

/// `MM:SS`, prefixed with `-` while counting flow overtime.
pub fn format_countdown(current_seconds: i64, flow_active: bool) -> String {
    let abs = current_seconds.unsigned_abs();
    format!(
        "{}{:02}:{:02}",
        if flow_active { "-" } else { "" },
        abs / 60,
        abs % 60
    )
}

pub fn mode_label(mode: Mode, flow_active: bool) -> &'static str {
    match mode {
        Mode::Focus if flow_active => "Flow State",
        Mode::Focus => "Focus Time",
        Mode::Break => "Break Time",
        Mode::LongBreak => "Long Break",
    }
}

pub fn status_text(mode: Mode, run_status: RunStatus, flow_active: bool) -> &'static str {
    match run_status {
        RunStatus::Idle if mode.is_break() => "Ready to start break",
        RunStatus::Idle => "Ready to start",
        RunStatus::Paused => "Paused",
        RunStatus::Running if mode.is_break() => "Taking a break",
        RunStatus::Running if flow_active => "In flow state - timer continues",
        RunStatus::Running => "Focusing",
    }
}

/// Which controls are usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub start: bool,
    pub pause: bool,
    pub skip: bool,
    pub reset: bool,
    pub undo: bool,
    pub skip_label: String,
}

impl Controls {
    pub fn derive(mode: Mode, run_status: RunStatus, undo_pending: bool) -> Self {
        Self {
            start: run_status != RunStatus::Running,
            pause: run_status == RunStatus::Running,
            skip: run_status.is_active(),
            reset: run_status.is_active(),
            undo: undo_pending,
            skip_label: if mode.is_break() {
                "Skip to Focus".into()
            } else {
                "Skip to Break".into()
            },
        }
    }
}
