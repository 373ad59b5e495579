//! Core error types for calmnudge-core.
//!
//! Skip outcomes such as "no permission" or "cooldown active" are not
//! errors; they are reported through [`crate::SchedulingDecision`]. The
//! types here cover failures that prevent a decision from being applied.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for calmnudge-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The delivery backend refused a schedule command
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored value could not be decoded
    #[error("Corrupt value for '{key}': {message}")]
    Corrupt { key: String, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Hour of day outside 0..=23
    #[error("Hour for '{field}' must be in 0..=23, got {value}")]
    HourOutOfRange { field: String, value: u8 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Failures reported by a delivery backend when asked to schedule.
///
/// Cancellation never fails from the engine's point of view, so there is
/// no cancel variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The platform refused the request (e.g. notifications disabled at OS level)
    #[error("Platform rejected the notification: {0}")]
    Rejected(String),

    /// The trigger could not be built (e.g. fire time in the past)
    #[error("Invalid trigger for fire time {fire_at}")]
    InvalidTrigger { fire_at: chrono::DateTime<chrono::Utc> },

    /// The backend is not reachable right now
    #[error("Delivery backend unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the authorization request itself, distinct from the user
/// saying no. Callers treat every variant as a denial.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionRequestError {
    /// OS-level failure while presenting the prompt
    #[error("Permission request failed: {0}")]
    Platform(String),

    /// No answer within the configured bound
    #[error("Permission request timed out after {timeout_secs} seconds")]
    TimedOut { timeout_secs: u64 },

    /// The prompt callback was dropped without being invoked
    #[error("Permission prompt completed without an answer")]
    CallbackDropped,
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => {
                if code.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
