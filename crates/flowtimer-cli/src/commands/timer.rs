use std::cell::RefCell;
use std::rc::Rc;

use clap::Subcommand;
use flowtimer_core::{Config, Event};
use serde::Serialize;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the armed interval, or resume a paused one
    Start,
    /// Pause the running interval
    Pause,
    /// Resume a paused interval
    Resume,
    /// Finish the current interval early and move to the next mode
    Skip,
    /// Abandon the current interval and re-arm the same mode
    Reset,
    /// Reverse the last skip or reset
    Undo,
    /// Bring the timer up to date with the wall clock
    Tick,
    /// Print current timer state as JSON
    Status,
    /// Clear the session log and timer state
    FullReset {
        /// Also restore default settings
        #[arg(long)]
        settings: bool,
    },
}

/// What a single invocation did.
#[derive(Serialize)]
struct Outcome {
    /// False when the action did not apply in the current state.
    applied: bool,
    events: Vec<Event>,
    state: Event,
}

pub fn run(action: TimerAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = super::open_engine(config)?;

    let events: Rc<RefCell<Vec<Event>>> = Rc::default();
    let sink = Rc::clone(&events);
    engine.subscribe(move |event: &Event| {
        if !matches!(
            event,
            Event::DisplayUpdated { .. } | Event::ControlsChanged { .. } | Event::FlowProgress { .. }
        ) {
            sink.borrow_mut().push(event.clone());
        }
    });

    // Time has passed since the last invocation; a break may be over.
    engine.tick();

    let applied = match action {
        TimerAction::Start => engine.start(),
        TimerAction::Pause => engine.pause(),
        TimerAction::Resume => engine.resume(),
        TimerAction::Skip => engine.skip(),
        TimerAction::Reset => engine.reset_current(),
        TimerAction::Undo => engine.undo(),
        TimerAction::Tick | TimerAction::Status => true,
        TimerAction::FullReset { settings } => {
            engine.full_reset(settings);
            true
        }
    };
    engine.save();

    let outcome = Outcome {
        applied,
        events: events.take(),
        state: engine.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
