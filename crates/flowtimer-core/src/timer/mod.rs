mod display;
mod engine;
mod mode;
mod ticks;
mod undo;

pub use display::{format_countdown, mode_label, status_text, Controls};
pub use engine::{TimerEngine, TimerState};
pub use mode::{Mode, RunStatus};
pub use ticks::{IntervalTicks, ManualTicks, TickHandle, TickScheduler, TickSignal};
pub use undo::{Snapshot, UndoKind, UndoRecord};
