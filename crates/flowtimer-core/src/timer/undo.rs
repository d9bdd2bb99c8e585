use serde::{Deserialize, Serialize};

use super::mode::{Mode, RunStatus};
use crate::storage::SessionRecord;

/// Timer fields captured right before a reversible action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub run_status: RunStatus,
    pub flow_active: bool,
    pub current_seconds: i64,
    pub accumulated_before_pause_secs: u64,
    pub start_epoch_ms: Option<i64>,
    /// The in-progress record at the time of the action.
    pub current: Option<SessionRecord>,
}

/// The single pending undo slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "snapshot", rename_all = "snake_case")]
pub enum UndoRecord {
    /// A focus interval was finalized and a break armed.
    SkipToBreak(Snapshot),
    /// A break was finalized and focus armed.
    SkipToWork(Snapshot),
    /// The in-progress interval was abandoned and re-armed from zero.
    Reset(Snapshot),
}

impl UndoRecord {
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            UndoRecord::SkipToBreak(s) | UndoRecord::SkipToWork(s) | UndoRecord::Reset(s) => s,
        }
    }

    pub fn kind(&self) -> UndoKind {
        match self {
            UndoRecord::SkipToBreak(_) => UndoKind::SkipToBreak,
            UndoRecord::SkipToWork(_) => UndoKind::SkipToWork,
            UndoRecord::Reset(_) => UndoKind::Reset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndoKind {
    SkipToBreak,
    SkipToWork,
    Reset,
}
