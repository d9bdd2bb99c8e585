//! # Flow Timer Core Library
//!
//! This library provides the core logic for Flow Timer, a focus timer whose
//! focus intervals do not end on their own: past the planned duration they
//! turn into "flow" and keep counting until the user moves on. The CLI binary
//! is a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine that requires the caller
//!   to periodically invoke `tick()` for progress updates
//! - **Storage**: Settings, session log and timer state behind a string
//!   key-value store (SQLite by default), plus TOML-based configuration
//! - **Stats**: Summaries, chart series and insights over the session log
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`SessionStore`]: Completed intervals plus the one in progress
//! - [`Database`]: SQLite key-value persistence
//! - [`AnalyticsReport`]: Analytics for a day, week or month

pub mod clock;
pub mod error;
pub mod events;
pub mod export;
pub mod stats;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StorageError};
pub use events::{Event, EventListener};
pub use export::{export_document, ExportDocument};
pub use stats::{AnalyticsReport, Timeframe};
pub use storage::{
    Config, Database, KeyValueStore, MemoryStore, SessionKind, SessionRecord, SessionStore,
    Settings, Theme,
};
pub use timer::{Mode, RunStatus, TimerEngine, TimerState};
