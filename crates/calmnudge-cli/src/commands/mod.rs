pub mod activity;
pub mod config;
pub mod permission;
pub mod reminder;

use std::future::Future;
use std::sync::Arc;

use calmnudge_core::{
    CallbackPermissionGate, Collaborators, Config, Database, PermissionCallback, PermissionGate,
    SchedulingEngine, SqliteStore,
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Prompt answering with a fixed value, standing in for the OS dialog.
pub type Prompt = Box<dyn Fn(PermissionCallback) + Send + Sync>;

/// Engine wired to the on-disk store.
pub struct Host {
    pub store: Arc<SqliteStore>,
    pub gate: Arc<CallbackPermissionGate<Prompt>>,
    pub engine: SchedulingEngine,
    pub config: Config,
}

impl Host {
    /// Open the store and build an engine. `answer` is what the simulated
    /// permission prompt replies, `None` when no prompt is expected.
    pub fn open(answer: Option<bool>) -> CliResult<Self> {
        Self::open_at(answer, None)
    }

    /// Like [`Host::open`], with the outbox clock pinned to `at` when
    /// replaying an evaluation at another instant.
    pub fn open_at(answer: Option<bool>, at: Option<DateTime<Utc>>) -> CliResult<Self> {
        let config = Config::load()?;
        let db = Database::open()?;
        let store = Arc::new(match at {
            Some(at) => SqliteStore::with_clock(db, move || at),
            None => SqliteStore::new(db),
        });

        let prompt: Prompt = Box::new(move |callback: PermissionCallback| {
            if let Some(granted) = answer {
                callback(granted);
            }
        });
        let gate = Arc::new(CallbackPermissionGate::new(store.permission_status()?, prompt));

        // The CLI owns the settings for the lifetime of one command.
        let (_settings_tx, settings_rx) = watch::channel(config.settings());
        let engine = SchedulingEngine::new(
            Collaborators {
                permission: gate.clone(),
                ledger: store.clone(),
                delivery: store.clone(),
                store: store.clone(),
            },
            settings_rx,
        )?;

        Ok(Self {
            store,
            gate,
            engine,
            config,
        })
    }

    /// Persist the gate's status after a prompt.
    pub async fn save_permission(&self) -> CliResult {
        let status = self.gate.current_status().await;
        self.store.set_permission_status(status)?;
        Ok(())
    }
}

pub fn block_on<F: Future>(future: F) -> CliResult<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 timestamp: {e}"))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
