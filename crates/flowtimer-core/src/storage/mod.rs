mod config;
pub mod database;
pub(crate) mod keypath;
pub mod session;
mod settings;

pub use config::{Config, LoggingConfig, RuntimeConfig, StorageConfig};
pub use database::Database;
pub use session::{SessionKind, SessionRecord, SessionStore};
pub use settings::{Settings, Theme};

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::StorageError;

/// Key holding the user settings document.
pub const SETTINGS_KEY: &str = "flowTimerSettings";
/// Key holding the session log and the in-progress record.
pub const SESSION_DATA_KEY: &str = "flowTimerSessionData";
/// Key holding the serialized timer state between processes.
pub const RUNTIME_KEY: &str = "flowTimerRuntime";

/// Opaque string key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process store backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    reject_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every `set` fails, for exercising write-failure paths.
    pub fn rejecting_writes() -> Self {
        Self {
            entries: HashMap::new(),
            reject_writes: true,
        }
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.reject_writes {
            return Err(StorageError::WriteRejected {
                key: key.to_string(),
            });
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Returns `~/.config/flowtimer[-dev]/` based on FLOWTIMER_ENV.
///
/// Set FLOWTIMER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FLOWTIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("flowtimer-dev")
    } else {
        base_dir.join("flowtimer")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.get("k").unwrap().is_none());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn rejecting_store_fails_writes_but_reads() {
        let mut store = MemoryStore::rejecting_writes();
        assert!(matches!(
            store.set("k", "v"),
            Err(StorageError::WriteRejected { .. })
        ));
        assert!(store.get("k").unwrap().is_none());
    }
}
