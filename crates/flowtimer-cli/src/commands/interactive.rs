//! Foreground timer driven by a tokio interval and stdin commands.

use std::io::Write;
use std::time::Duration;

use flowtimer_core::events::EventListener;
use flowtimer_core::timer::IntervalTicks;
use flowtimer_core::{Config, Event, TimerEngine};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

const HELP: &str = "commands: start (s), pause (p), skip (k), reset (r), undo (u), status, help, quit (q)";

pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(session(config))
}

async fn session(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let period = Duration::from_millis(config.runtime.tick_interval_ms.max(1));
    let (ticks, mut tick_rx) = IntervalTicks::new(period);
    let mut engine = super::open_engine(config)?.with_scheduler(ticks);
    engine.subscribe(TerminalView::default());

    println!("{HELP}");
    engine.tick();
    print_status(&engine);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(_) = tick_rx.recv() => engine.tick(),
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !dispatch(&mut engine, line.trim()) {
                    break;
                }
            }
        }
    }

    engine.save();
    info!("interactive session ended");
    Ok(())
}

/// Apply one command line. Returns false to quit.
fn dispatch(engine: &mut TimerEngine, command: &str) -> bool {
    let applied = match command {
        "" => return true,
        "start" | "s" => engine.start(),
        "pause" | "p" => engine.pause(),
        "skip" | "k" => engine.skip(),
        "reset" | "r" => engine.reset_current(),
        "undo" | "u" => engine.undo(),
        "status" => {
            print_status(engine);
            true
        }
        "help" | "h" | "?" => {
            println!("{HELP}");
            true
        }
        "quit" | "q" | "exit" => return false,
        other => {
            println!("unknown command: {other}");
            println!("{HELP}");
            true
        }
    };
    if !applied {
        debug!(command, "command did not apply");
        println!("nothing to {command} right now");
    }
    true
}

fn print_status(engine: &TimerEngine) {
    let controls = engine.controls();
    println!(
        "{} completed, undo {}, skip goes: {}",
        engine.completed_focus_count(),
        if controls.undo { "available" } else { "empty" },
        controls.skip_label
    );
}

/// Redraws the countdown in place and prints transitions on their own line.
#[derive(Default)]
struct TerminalView {
    mid_line: bool,
}

impl TerminalView {
    fn line(&mut self, text: &str) {
        if self.mid_line {
            println!();
            self.mid_line = false;
        }
        println!("{text}");
    }
}

impl EventListener for TerminalView {
    fn on_event(&mut self, event: &Event) {
        match event {
            Event::DisplayUpdated {
                countdown,
                label,
                status,
                ..
            } => {
                print!("\r{label:<11} {countdown:>7}  {status:<32}");
                let _ = std::io::stdout().flush();
                self.mid_line = true;
            }
            Event::FlowEntered { .. } => self.line("Entered flow state - the timer keeps counting"),
            Event::IntervalCompleted { record, .. } => self.line(&format!(
                "Logged {:?} interval: {}s ({}s flow)",
                record.kind, record.actual_duration_secs, record.flow_state_duration_secs
            )),
            Event::TimerSkipped { to, .. } => self.line(&format!("Skipped to {to:?}")),
            Event::TimerReset { mode, .. } => self.line(&format!("Reset {mode:?}")),
            Event::ActionUndone { action, .. } => self.line(&format!("Undid {action:?}")),
            _ => {}
        }
    }
}
