//! Delivery backend contract.
//!
//! The backend turns "schedule at instant I with payload P under id ID"
//! into a platform notification. It holds no decision logic.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DeliveryError;

/// Opaque identifier of a scheduled reminder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(String);

impl ReminderId {
    /// Fresh random identifier.
    pub fn new() -> Self {
        Self(format!("reminder-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ReminderId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for ReminderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ReminderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Notification content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
}

/// Platform notification scheduler.
pub trait DeliveryBackend: Send + Sync {
    /// Schedule a one-shot notification.
    fn schedule(
        &self,
        id: &ReminderId,
        fire_at: DateTime<Utc>,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError>;

    /// Cancel a scheduled notification. Unknown or already cancelled ids
    /// are a no-op.
    fn cancel(&self, id: &ReminderId);
}
