use clap::Subcommand;
use flowtimer_core::{Config, ConfigError, Settings};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Get a setting (e.g. "focusTime", "theme")
    Get {
        /// Setting key
        key: String,
    },
    /// Set a setting
    Set {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },
    /// List all settings
    List,
    /// Restore default settings, keeping the completed session count
    Reset,
    /// Switch between dark and light theme
    ToggleTheme,
}

pub fn run(action: SettingsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = super::open_engine(config)?;

    match action {
        SettingsAction::Get { key } => match engine.settings().get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(ConfigError::UnknownKey(key).into()),
        },
        SettingsAction::Set { key, value } => {
            let mut settings = engine.settings().clone();
            settings.set(&key, &value)?;
            engine.update_settings(settings);
            println!("ok");
        }
        SettingsAction::List => {
            println!("{}", serde_json::to_string_pretty(engine.settings())?);
        }
        SettingsAction::Reset => {
            let settings = Settings {
                completed_sessions: engine.completed_focus_count(),
                ..Settings::default()
            };
            engine.update_settings(settings);
            println!("settings reset to defaults");
        }
        SettingsAction::ToggleTheme => {
            engine.toggle_theme();
            println!("{}", engine.settings().get("theme").unwrap_or_default());
        }
    }
    engine.save();
    Ok(())
}
