pub mod config;
pub mod export;
pub mod interactive;
pub mod settings;
pub mod stats;
pub mod timer;

use flowtimer_core::{Config, Database, TimerEngine};

/// Open the configured database.
pub fn open_database(config: &Config) -> Result<Database, Box<dyn std::error::Error>> {
    let path = config.database_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Database::open(path)?)
}

/// Restore the engine from the configured database.
pub fn open_engine(config: &Config) -> Result<TimerEngine, Box<dyn std::error::Error>> {
    Ok(TimerEngine::load(open_database(config)?))
}
