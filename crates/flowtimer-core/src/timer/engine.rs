//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. Elapsed time is
//! always `now - start`, never a count of ticks, so a delayed or missed tick
//! (a suspended laptop, a backgrounded terminal) cannot make it drift.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --start--> Running
//! Running|Paused --skip--> Idle (next mode, interval logged)
//! Running|Paused --reset--> Idle (same mode, interval discarded)
//! Running(break) --tick past planned--> Idle (focus, interval logged)
//! Running(focus) --tick past planned--> Running + flow
//! ```
//!
//! Invalid calls are no-ops that return `false`. Persistence failures are
//! logged and otherwise ignored; in-memory state stays authoritative.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::load(Database::open(config.database_path()?)?);
//! engine.subscribe(|event: &Event| println!("{event:?}"));
//! engine.start();
//! // Once per second:
//! engine.tick();
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::display::{self, Controls};
use super::mode::{Mode, RunStatus};
use super::ticks::{ManualTicks, TickHandle, TickScheduler};
use super::undo::{Snapshot, UndoKind, UndoRecord};
use crate::clock::{Clock, SystemClock};
use crate::error::CoreError;
use crate::events::{Event, EventListener};
use crate::storage::{
    KeyValueStore, SessionRecord, SessionStore, Settings, RUNTIME_KEY, SETTINGS_KEY,
};

/// Mutable timer fields. Configuration lives in [`Settings`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: Mode,
    pub run_status: RunStatus,
    /// Focus has run past its planned duration. Only ever set while a focus
    /// interval is underway; a pause keeps it.
    pub flow_active: bool,
    /// Wall-clock instant elapsed time is measured from.
    pub start_epoch_ms: Option<i64>,
    /// Seconds banked by the last pause.
    pub accumulated_before_pause_secs: u64,
    /// Countdown shown to the user; negative while in flow.
    pub current_seconds: i64,
    pub last_action: Option<UndoRecord>,
}

impl TimerState {
    /// Idle in `mode`, countdown armed to the planned duration.
    pub fn ready(mode: Mode, settings: &Settings) -> Self {
        Self {
            mode,
            run_status: RunStatus::Idle,
            flow_active: false,
            start_epoch_ms: None,
            accumulated_before_pause_secs: 0,
            current_seconds: clamp_secs(mode.planned_secs(settings)),
            last_action: None,
        }
    }

    fn snapshot(&self, current: Option<SessionRecord>) -> Snapshot {
        Snapshot {
            mode: self.mode,
            run_status: self.run_status,
            flow_active: self.flow_active,
            current_seconds: self.current_seconds,
            accumulated_before_pause_secs: self.accumulated_before_pause_secs,
            start_epoch_ms: self.start_epoch_ms,
            current,
        }
    }

    fn restore(&mut self, snapshot: &Snapshot) {
        self.mode = snapshot.mode;
        self.run_status = snapshot.run_status;
        self.flow_active = snapshot.flow_active;
        self.current_seconds = snapshot.current_seconds;
        self.accumulated_before_pause_secs = snapshot.accumulated_before_pause_secs;
        self.start_epoch_ms = snapshot.start_epoch_ms;
    }
}

/// Core timer engine.
///
/// Owns the timer state, the settings and the session log, and writes all
/// three through the key-value store whenever they change.
pub struct TimerEngine {
    state: TimerState,
    settings: Settings,
    sessions: SessionStore,
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    scheduler: Box<dyn TickScheduler>,
    ticker: Option<Box<dyn TickHandle>>,
    listeners: Vec<Box<dyn EventListener>>,
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .field("sessions", &self.sessions.len())
            .field("ticking", &self.ticker.is_some())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TimerEngine {
    /// Restore an engine from `store`.
    ///
    /// Settings, session log and runtime state are each loaded tolerantly:
    /// anything absent or unreadable falls back to defaults.
    pub fn load<S: KeyValueStore + 'static>(store: S) -> Self {
        let settings = match store.get(SETTINGS_KEY) {
            Ok(Some(raw)) => Settings::from_json_lenient(&raw),
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!(error = %e, "failed to read settings, using defaults");
                Settings::default()
            }
        };
        let sessions = SessionStore::load(&store);
        let state = match store.get(RUNTIME_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<TimerState>(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "failed to parse timer state, starting idle");
                TimerState::ready(Mode::Focus, &settings)
            }),
            Ok(None) => TimerState::ready(Mode::Focus, &settings),
            Err(e) => {
                warn!(error = %e, "failed to read timer state, starting idle");
                TimerState::ready(Mode::Focus, &settings)
            }
        };

        let mut engine = Self {
            state,
            settings,
            sessions,
            store: Box::new(store),
            clock: Box::new(SystemClock),
            scheduler: Box::new(ManualTicks::new()),
            ticker: None,
            listeners: Vec::new(),
        };
        engine.reconcile();
        if engine.state.run_status == RunStatus::Running {
            engine.arm_ticker();
        }
        engine
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the tick source, moving a live stream over to it.
    pub fn with_scheduler<T: TickScheduler + 'static>(mut self, scheduler: T) -> Self {
        self.disarm_ticker();
        self.scheduler = Box::new(scheduler);
        if self.state.run_status == RunStatus::Running {
            self.arm_ticker();
        }
        self
    }

    pub fn subscribe<L: EventListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn run_status(&self) -> RunStatus {
        self.state.run_status
    }

    pub fn flow_active(&self) -> bool {
        self.state.flow_active
    }

    pub fn current_seconds(&self) -> i64 {
        self.state.current_seconds
    }

    pub fn completed_focus_count(&self) -> u32 {
        self.settings.completed_sessions
    }

    pub fn undo_available(&self) -> bool {
        self.state.last_action.is_some()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    /// Planned duration of the active mode.
    pub fn planned_secs(&self) -> u64 {
        self.state.mode.planned_secs(&self.settings)
    }

    /// Planned duration of the interval underway, as stamped on its record
    /// when it started. Falls back to the settings when idle.
    pub fn interval_planned_secs(&self) -> u64 {
        self.sessions
            .current()
            .map_or_else(|| self.planned_secs(), |record| record.planned_duration_secs)
    }

    /// Whole seconds elapsed in the current interval.
    ///
    /// Frozen at the banked value while paused; 0 when idle.
    pub fn elapsed_secs(&self) -> u64 {
        if self.state.run_status == RunStatus::Paused {
            return self.state.accumulated_before_pause_secs;
        }
        match self.state.start_epoch_ms {
            Some(start) => (self.clock.now_ms().saturating_sub(start).max(0) / 1000) as u64,
            None => 0,
        }
    }

    pub fn countdown(&self) -> String {
        display::format_countdown(self.state.current_seconds, self.state.flow_active)
    }

    pub fn controls(&self) -> Controls {
        Controls::derive(
            self.state.mode,
            self.state.run_status,
            self.state.last_action.is_some(),
        )
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            mode: self.state.mode,
            run_status: self.state.run_status,
            flow_active: self.state.flow_active,
            elapsed_secs: self.elapsed_secs(),
            countdown: self.countdown(),
            completed_focus_count: self.settings.completed_sessions,
            undo_available: self.undo_available(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin the armed interval, or resume a paused one.
    pub fn start(&mut self) -> bool {
        match self.state.run_status {
            RunStatus::Running => false,
            RunStatus::Idle => {
                self.rebase_start();
                self.state.run_status = RunStatus::Running;

                let planned = self.planned_secs();
                let record =
                    SessionRecord::begin(self.state.mode.session_kind(), planned, self.clock.now());
                self.sessions.set_current(Some(record));
                self.persist_sessions();
                self.arm_ticker();

                debug!(mode = ?self.state.mode, planned, "timer started");
                self.emit(Event::TimerStarted {
                    mode: self.state.mode,
                    planned_secs: planned,
                    at: self.clock.now(),
                });
                self.publish_state();
                true
            }
            RunStatus::Paused => {
                let elapsed = self.state.accumulated_before_pause_secs;
                self.rebase_start();
                self.state.run_status = RunStatus::Running;
                self.arm_ticker();

                debug!(mode = ?self.state.mode, elapsed, "timer resumed");
                self.emit(Event::TimerResumed {
                    mode: self.state.mode,
                    elapsed_secs: elapsed,
                    at: self.clock.now(),
                });
                self.publish_state();
                true
            }
        }
    }

    /// Resume a paused interval. Unlike [`start`](Self::start), does nothing
    /// when idle.
    pub fn resume(&mut self) -> bool {
        self.state.run_status == RunStatus::Paused && self.start()
    }

    pub fn pause(&mut self) -> bool {
        if self.state.run_status != RunStatus::Running {
            return false;
        }
        let elapsed = self.elapsed_secs();
        self.state.accumulated_before_pause_secs = elapsed;
        self.disarm_ticker();
        self.state.run_status = RunStatus::Paused;

        debug!(mode = ?self.state.mode, elapsed, "timer paused");
        self.emit(Event::TimerPaused {
            mode: self.state.mode,
            elapsed_secs: elapsed,
            at: self.clock.now(),
        });
        self.publish_state();
        true
    }

    /// Call periodically while running.
    ///
    /// Breaks end on their own once their planned duration has elapsed.
    /// Focus never does: past its planned duration it turns into flow and
    /// keeps counting until skipped or reset.
    pub fn tick(&mut self) {
        if self.state.run_status != RunStatus::Running {
            return;
        }
        let elapsed = self.elapsed_secs();
        let planned = self.interval_planned_secs();

        if self.state.mode.is_break() && elapsed >= planned {
            self.complete_break(elapsed);
            return;
        }

        if self.state.mode == Mode::Focus && elapsed > planned && !self.state.flow_active {
            self.state.flow_active = true;
            info!(elapsed, planned, "entered flow state");
            self.emit(Event::FlowEntered {
                at: self.clock.now(),
            });
            self.publish_state();
        }

        if self.state.flow_active {
            let flow_secs = elapsed.saturating_sub(planned);
            let changed = match self.sessions.current_mut() {
                Some(current) if current.flow_state_duration_secs != flow_secs => {
                    current.flow_state_duration_secs = flow_secs;
                    true
                }
                _ => false,
            };
            if changed {
                self.persist_sessions();
            }
            self.emit(Event::FlowProgress {
                flow_secs,
                at: self.clock.now(),
            });
            self.state.current_seconds = -clamp_secs(flow_secs);
        } else {
            self.state.current_seconds = clamp_secs(planned.saturating_sub(elapsed));
        }
        self.emit_display();
    }

    /// Finish the active interval early: focus moves to a break, a break
    /// moves to focus. The interval is logged as completed.
    pub fn skip(&mut self) -> bool {
        if !self.state.run_status.is_active() {
            return false;
        }
        let from = self.state.mode;
        let snapshot = self.state.snapshot(self.sessions.current().cloned());
        self.state.last_action = Some(match from {
            Mode::Focus => UndoRecord::SkipToBreak(snapshot),
            Mode::Break | Mode::LongBreak => UndoRecord::SkipToWork(snapshot),
        });

        self.disarm_ticker();
        let elapsed = self.elapsed_secs();
        self.finalize_current(elapsed);

        let to = match from {
            Mode::Focus => Mode::break_after(
                self.settings.completed_sessions,
                self.settings.sessions_before_long_break,
            ),
            Mode::Break | Mode::LongBreak => Mode::Focus,
        };
        self.arm_mode(to);

        debug!(?from, ?to, elapsed, "interval skipped");
        self.emit(Event::TimerSkipped {
            from,
            to,
            at: self.clock.now(),
        });
        self.publish_state();
        true
    }

    /// Abandon the active interval and re-arm the same mode from zero.
    /// The interval is discarded, not logged.
    pub fn reset_current(&mut self) -> bool {
        if !self.state.run_status.is_active() {
            return false;
        }
        let snapshot = self.state.snapshot(self.sessions.current().cloned());
        self.state.last_action = Some(UndoRecord::Reset(snapshot));

        self.disarm_ticker();
        self.sessions.set_current(None);
        self.persist_sessions();
        let mode = self.state.mode;
        self.arm_mode(mode);

        debug!(?mode, "interval reset");
        self.emit(Event::TimerReset {
            mode,
            at: self.clock.now(),
        });
        self.publish_state();
        true
    }

    /// Reverse the last skip or reset. Single use.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.state.last_action.take() else {
            return false;
        };
        self.disarm_ticker();

        let kind = action.kind();
        let snapshot = action.snapshot();
        self.state.restore(snapshot);

        match kind {
            UndoKind::SkipToBreak | UndoKind::SkipToWork => {
                // Only a skip that actually finalized a record appended one.
                if snapshot.current.is_some() {
                    let popped = self.sessions.pop_last();
                    if kind == UndoKind::SkipToBreak
                        && popped.as_ref().is_some_and(SessionRecord::is_focus)
                    {
                        self.settings.completed_sessions =
                            self.settings.completed_sessions.saturating_sub(1);
                        self.persist_settings();
                    }
                    self.sessions.set_current(snapshot.current.clone());
                }
            }
            UndoKind::Reset => self.sessions.set_current(snapshot.current.clone()),
        }
        self.persist_sessions();

        if self.state.run_status == RunStatus::Running {
            self.arm_ticker();
        }

        info!(action = ?kind, "undid last action");
        self.emit(Event::ActionUndone {
            action: kind,
            at: self.clock.now(),
        });
        self.publish_state();
        true
    }

    /// Clear the log, the in-progress record and the timer state.
    ///
    /// Settings survive unless `reset_settings` is set; the completed
    /// session counter always returns to zero.
    pub fn full_reset(&mut self, reset_settings: bool) {
        self.disarm_ticker();
        self.sessions.clear();
        if reset_settings {
            self.settings = Settings::default();
        } else {
            self.settings.completed_sessions = 0;
        }
        self.state = TimerState::ready(Mode::Focus, &self.settings);
        self.persist_sessions();
        self.persist_settings();

        info!(reset_settings, "full reset");
        self.emit(Event::FullReset {
            settings_reset: reset_settings,
            at: self.clock.now(),
        });
        self.publish_state();
    }

    /// Replace the settings. An idle countdown is re-armed to the new
    /// planned duration.
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        if self.state.run_status == RunStatus::Idle {
            self.state.current_seconds = clamp_secs(self.planned_secs());
        }
        self.persist_settings();
        self.emit(Event::SettingsChanged {
            settings: self.settings.clone(),
            at: self.clock.now(),
        });
        self.publish_state();
    }

    pub fn toggle_theme(&mut self) {
        let mut settings = self.settings.clone();
        settings.theme = settings.theme.toggled();
        self.update_settings(settings);
    }

    /// Write settings, session data and timer state.
    pub fn save(&mut self) {
        self.persist_settings();
        self.persist_sessions();
        self.persist_runtime();
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Point the start instant so that elapsed time continues from the
    /// banked seconds.
    fn rebase_start(&mut self) {
        let banked_ms = clamp_secs(self.state.accumulated_before_pause_secs).saturating_mul(1000);
        self.state.start_epoch_ms = Some(self.clock.now_ms().saturating_sub(banked_ms));
        self.state.accumulated_before_pause_secs = 0;
    }

    /// Idle and ready in `mode`. The undo slot is kept.
    fn arm_mode(&mut self, mode: Mode) {
        let last_action = self.state.last_action.take();
        self.state = TimerState::ready(mode, &self.settings);
        self.state.last_action = last_action;
    }

    fn complete_break(&mut self, elapsed: u64) {
        self.disarm_ticker();
        self.finalize_current(elapsed);
        // The log just grew underneath any pending undo.
        self.state.last_action = None;
        self.arm_mode(Mode::Focus);
        self.publish_state();
    }

    /// Finalize the in-progress record, append it to the log, and count it
    /// if it was focus.
    fn finalize_current(&mut self, elapsed: u64) -> Option<SessionRecord> {
        let record = self
            .sessions
            .take_current()?
            .finalize(self.clock.now(), elapsed);
        self.sessions.append_completed(record.clone());
        if record.is_focus() {
            self.settings.completed_sessions = self.settings.completed_sessions.saturating_add(1);
            self.persist_settings();
        }
        self.persist_sessions();

        info!(
            kind = ?record.kind,
            actual = record.actual_duration_secs,
            flow = record.flow_state_duration_secs,
            "interval completed"
        );
        self.emit(Event::IntervalCompleted {
            record: record.clone(),
            at: self.clock.now(),
        });
        Some(record)
    }

    fn arm_ticker(&mut self) {
        self.disarm_ticker();
        self.ticker = Some(self.scheduler.arm());
    }

    fn disarm_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    /// Bring state loaded from storage back within its invariants.
    fn reconcile(&mut self) {
        let logged = self.sessions.completed_focus_count() as u32;
        if logged > self.settings.completed_sessions {
            self.settings.completed_sessions = logged;
        }

        let state = &mut self.state;
        if state.flow_active && !(state.mode == Mode::Focus && state.run_status.is_active()) {
            state.flow_active = false;
        }
        match state.run_status {
            RunStatus::Idle => {
                if self.sessions.current().is_some() {
                    warn!("dropping in-progress record with no running timer");
                    self.sessions.set_current(None);
                }
                let last_action = state.last_action.take();
                *state = TimerState::ready(state.mode, &self.settings);
                state.last_action = last_action;
            }
            RunStatus::Running | RunStatus::Paused => {
                if self.sessions.current().is_none() || state.start_epoch_ms.is_none() {
                    warn!("timer state has no interval to continue, starting idle");
                    *state = TimerState::ready(Mode::Focus, &self.settings);
                    self.sessions.set_current(None);
                }
            }
        }
    }

    fn persist_sessions(&mut self) {
        if let Err(e) = self.sessions.save(&mut *self.store) {
            warn!(error = %e, "failed to save session data");
        }
    }

    fn persist_settings(&mut self) {
        if let Err(e) = write_json(&mut *self.store, SETTINGS_KEY, &self.settings) {
            warn!(error = %e, "failed to save settings");
        }
    }

    fn persist_runtime(&mut self) {
        if let Err(e) = write_json(&mut *self.store, RUNTIME_KEY, &self.state) {
            warn!(error = %e, "failed to save timer state");
        }
    }

    /// Persist the timer state and tell listeners about it.
    fn publish_state(&mut self) {
        self.persist_runtime();
        let controls = self.controls();
        self.emit(Event::ControlsChanged { controls });
        self.emit_display();
    }

    fn emit_display(&mut self) {
        let event = Event::DisplayUpdated {
            countdown: self.countdown(),
            current_seconds: self.state.current_seconds,
            mode: self.state.mode,
            flow_active: self.state.flow_active,
            label: display::mode_label(self.state.mode, self.state.flow_active).into(),
            status: display::status_text(
                self.state.mode,
                self.state.run_status,
                self.state.flow_active,
            )
            .into(),
        };
        self.emit(event);
    }

    fn emit(&mut self, event: Event) {
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
    }
}

/// Seconds as a signed countdown value, saturating at `i64::MAX`.
fn clamp_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

fn write_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), CoreError> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)?;
    Ok(())
}
