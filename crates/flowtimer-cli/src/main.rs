use std::env;

use clap::{Parser, Subcommand};
use flowtimer_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "flowtimer", version, about = "Flow Timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Timer settings (durations, cadence, appearance)
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Program configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Session analytics
    Stats(commands::stats::StatsArgs),
    /// Export the session log as JSON
    Export(commands::export::ExportArgs),
    /// Run the timer interactively in this terminal
    Run,
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_logging(&config);

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, &config),
        Commands::Settings { action } => commands::settings::run(action, &config),
        Commands::Config { action } => commands::config::run(action),
        Commands::Stats(args) => commands::stats::run(args, &config),
        Commands::Export(args) => commands::export::run(args, &config),
        Commands::Run => commands::interactive::run(&config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so JSON on stdout stays parseable.
///
/// `FLOWTIMER_DEBUG_LOG` forces debug output; otherwise `RUST_LOG` wins over
/// the configured filter.
fn init_logging(config: &Config) {
    let debug_enabled = env::var("FLOWTIMER_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.logging.filter))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
