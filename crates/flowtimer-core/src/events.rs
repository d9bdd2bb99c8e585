use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{SessionRecord, Settings};
use crate::timer::{Controls, Mode, RunStatus, UndoKind};

/// Every state change in the engine produces an Event.
/// Presentation layers subscribe to them; none feed back into the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        planned_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        mode: Mode,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: Mode,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// A focus interval ran past its planned duration.
    FlowEntered {
        at: DateTime<Utc>,
    },
    FlowProgress {
        flow_secs: u64,
        at: DateTime<Utc>,
    },
    DisplayUpdated {
        countdown: String,
        current_seconds: i64,
        mode: Mode,
        flow_active: bool,
        label: String,
        status: String,
    },
    ControlsChanged {
        controls: Controls,
    },
    /// A record was finalized and appended to the session log.
    IntervalCompleted {
        record: SessionRecord,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: Mode,
        to: Mode,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: Mode,
        at: DateTime<Utc>,
    },
    ActionUndone {
        action: UndoKind,
        at: DateTime<Utc>,
    },
    FullReset {
        settings_reset: bool,
        at: DateTime<Utc>,
    },
    SettingsChanged {
        settings: Settings,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: Mode,
        run_status: RunStatus,
        flow_active: bool,
        elapsed_secs: u64,
        countdown: String,
        completed_focus_count: u32,
        undo_available: bool,
        at: DateTime<Utc>,
    },
}

/// Receives engine events.
pub trait EventListener {
    fn on_event(&mut self, event: &Event);
}

impl<F> EventListener for F
where
    F: FnMut(&Event),
{
    fn on_event(&mut self, event: &Event) {
        self(event)
    }
}
