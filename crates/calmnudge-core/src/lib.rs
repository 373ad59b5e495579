//! # calmnudge Core Library
//!
//! Decides whether and when to nudge the user with a local notification,
//! given their recent wellbeing activity, notification permission and
//! quiet hours. The engine computes decisions; delivering notifications is
//! left to a [`DeliveryBackend`].
//!
//! ## Architecture
//!
//! - **Scheduling Engine**: pull-based; the host calls
//!   `evaluate_and_schedule_if_needed()` on lifecycle or data events
//! - **Policies**: pure cooldown and quiet-hours functions
//! - **Collaborators**: permission gate, activity ledger, delivery backend
//!   and state store, all injected as trait objects
//! - **Storage**: SQLite-backed adapters and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SchedulingEngine`]: reminder decision engine
//! - [`SqliteStore`]: persistent collaborators for CLI hosts
//! - [`Config`]: application configuration management

pub mod activity;
pub mod delivery;
pub mod error;
pub mod permission;
pub mod reminder;
pub mod storage;

pub use activity::{ActivityKind, ActivityLedger, ActivitySnapshot};
pub use delivery::{DeliveryBackend, NotificationPayload, ReminderId};
pub use error::{
    ConfigError, CoreError, DatabaseError, DeliveryError, PermissionRequestError, ValidationError,
};
pub use permission::{CallbackPermissionGate, PermissionCallback, PermissionGate, PermissionStatus};
pub use reminder::{
    Collaborators, CooldownPolicy, EvaluateOptions, PermissionOutcome, QuietHoursConfig,
    QuietHoursPolicy, ReminderPhase, ReminderSettings, ReminderState, ReminderStatus,
    SchedulingDecision, SchedulingEngine, SkipReason,
};
pub use storage::{Config, Database, InMemoryStateStore, ReminderStateStore, SqliteStore};
