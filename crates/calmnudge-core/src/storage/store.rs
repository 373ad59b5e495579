//! Collaborator adapters over [`Database`].
//!
//! `SqliteStore` plays three roles for a host without a native
//! notification center: activity ledger, reminder state store and
//! delivery backend (an outbox table the host drains).

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::database::{Database, OutboxEntry};
use super::ReminderStateStore;
use crate::activity::{ActivityKind, ActivityLedger};
use crate::delivery::{DeliveryBackend, NotificationPayload, ReminderId};
use crate::error::{DatabaseError, DeliveryError};
use crate::permission::PermissionStatus;
use crate::reminder::ReminderState;

const STATE_KEY: &str = "reminder_state";
const PERMISSION_KEY: &str = "permission_status";

/// Fire times this far in the past are still accepted (clock jitter
/// between decision and delivery).
fn past_tolerance() -> Duration {
    Duration::minutes(5)
}

/// Reminder state held in memory only.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    pub(super) state: Mutex<ReminderState>,
}

/// Source of "now" for outbox bookkeeping.
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// SQLite-backed collaborators.
pub struct SqliteStore {
    db: Mutex<Database>,
    clock: Clock,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Utc::now)
    }

    /// Store whose trigger checks and outbox timestamps follow `clock`
    /// instead of the wall clock, for hosts replaying a past instant.
    pub fn with_clock(db: Database, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            db: Mutex::new(db),
            clock: Box::new(clock),
        }
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record_activity(
        &self,
        kind: ActivityKind,
        completed_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.db().record_activity(kind, completed_at)
    }

    pub fn recent_activities(
        &self,
        limit: usize,
    ) -> Result<Vec<super::ActivityRecord>, DatabaseError> {
        self.db().recent_activities(limit)
    }

    pub fn pending_notifications(&self) -> Result<Vec<OutboxEntry>, DatabaseError> {
        self.db().outbox_list()
    }

    /// Stored permission status; `Undetermined` when never set.
    pub fn permission_status(&self) -> Result<PermissionStatus, DatabaseError> {
        match self.db().kv_get(PERMISSION_KEY)? {
            None => Ok(PermissionStatus::Undetermined),
            Some(raw) => raw.parse().map_err(|e: crate::error::ValidationError| {
                DatabaseError::Corrupt {
                    key: PERMISSION_KEY.to_string(),
                    message: e.to_string(),
                }
            }),
        }
    }

    pub fn set_permission_status(&self, status: PermissionStatus) -> Result<(), DatabaseError> {
        self.db().kv_set(PERMISSION_KEY, status.as_str())
    }
}

#[async_trait]
impl ActivityLedger for SqliteStore {
    async fn last_completed(&self, kind: ActivityKind) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        self.db().last_completed(kind)
    }
}

impl ReminderStateStore for SqliteStore {
    fn load(&self) -> Result<ReminderState, DatabaseError> {
        match self.db().kv_get(STATE_KEY)? {
            None => Ok(ReminderState::default()),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| DatabaseError::Corrupt {
                key: STATE_KEY.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn save(&self, state: &ReminderState) -> Result<(), DatabaseError> {
        let raw = serde_json::to_string(state).map_err(|e| DatabaseError::Corrupt {
            key: STATE_KEY.to_string(),
            message: e.to_string(),
        })?;
        self.db().kv_set(STATE_KEY, &raw)
    }
}

impl DeliveryBackend for SqliteStore {
    fn schedule(
        &self,
        id: &ReminderId,
        fire_at: DateTime<Utc>,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError> {
        let now = (self.clock)();
        if fire_at < now - past_tolerance() {
            return Err(DeliveryError::InvalidTrigger { fire_at });
        }
        let entry = OutboxEntry {
            id: id.as_str().to_string(),
            fire_at,
            title: payload.title.clone(),
            body: payload.body.clone(),
            created_at: now,
        };
        self.db()
            .outbox_put(&entry)
            .map_err(|e| DeliveryError::Unavailable(e.to_string()))
    }

    fn cancel(&self, id: &ReminderId) {
        if let Err(e) = self.db().outbox_remove(id.as_str()) {
            tracing::warn!(%id, error = %e, "failed to remove reminder from outbox");
        }
    }
}
