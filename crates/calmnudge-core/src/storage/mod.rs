mod config;
pub mod database;
mod store;

pub use config::{Config, ReminderConfig};
pub use database::{ActivityRecord, Database, OutboxEntry};
pub use store::{Clock, InMemoryStateStore, SqliteStore};

use std::path::PathBuf;

use crate::error::DatabaseError;
use crate::reminder::ReminderState;

/// Persistence for [`ReminderState`].
pub trait ReminderStateStore: Send + Sync {
    fn load(&self) -> Result<ReminderState, DatabaseError>;
    fn save(&self, state: &ReminderState) -> Result<(), DatabaseError>;
}

impl ReminderStateStore for InMemoryStateStore {
    fn load(&self) -> Result<ReminderState, DatabaseError> {
        Ok(self.state.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, state: &ReminderState) -> Result<(), DatabaseError> {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state.clone();
        Ok(())
    }
}

/// Returns `~/.config/calmnudge[-dev]/` based on CALMNUDGE_ENV.
///
/// Set CALMNUDGE_ENV=dev to use the development data directory.
/// CALMNUDGE_HOME replaces the whole path.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("CALMNUDGE_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("CALMNUDGE_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("calmnudge-dev")
            } else {
                base_dir.join("calmnudge")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
