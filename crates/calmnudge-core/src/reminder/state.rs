//! Persisted reminder state and the per-installation phase machine.
//!
//! ## Phases
//!
//! ```text
//! NoPermission --request granted--> PermissionGrantedNoReminder
//! PermissionGrantedNoReminder --evaluate (cooldown cleared)--> PermissionGrantedPending
//! PermissionGrantedPending --disable | delivered--> PermissionGrantedNoReminder
//! any --permission revoked--> NoPermission
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::delivery::ReminderId;
use crate::permission::PermissionStatus;

/// State owned by the scheduling engine, persisted across launches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderState {
    /// When the currently pending reminder was scheduled (not when it fires).
    #[serde(default)]
    pub last_scheduled_at: Option<DateTime<Utc>>,
    /// Most recent evaluation that produced a scheduling decision.
    /// Cooldown is measured from here.
    #[serde(default)]
    pub last_fired_or_evaluated_at: Option<DateTime<Utc>>,
    /// Scheduled, not-yet-delivered reminder.
    #[serde(default)]
    pub pending_identifier: Option<ReminderId>,
    /// When the pending reminder is due to fire.
    #[serde(default)]
    pub pending_fire_at: Option<DateTime<Utc>>,
    /// Last time the authorization prompt was shown.
    #[serde(default)]
    pub permission_prompted_at: Option<DateTime<Utc>>,
}

impl ReminderState {
    /// Record a durably applied scheduling decision.
    ///
    /// Timestamps never move backwards, even if the wall clock did.
    pub fn commit_scheduled(&mut self, now: DateTime<Utc>, id: ReminderId, fire_at: DateTime<Utc>) {
        self.last_scheduled_at = Some(later(self.last_scheduled_at, now));
        self.last_fired_or_evaluated_at = Some(later(self.last_fired_or_evaluated_at, now));
        self.pending_identifier = Some(id);
        self.pending_fire_at = Some(fire_at);
    }

    /// Forget the pending reminder. Cooldown bookkeeping is left alone.
    pub fn clear_pending(&mut self) -> Option<ReminderId> {
        self.pending_fire_at = None;
        self.pending_identifier.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending_identifier.is_some()
    }

    /// Current phase given the live permission status.
    pub fn phase(&self, permission: PermissionStatus) -> ReminderPhase {
        match (permission, self.has_pending()) {
            (PermissionStatus::Granted, true) => ReminderPhase::PermissionGrantedPending,
            (PermissionStatus::Granted, false) => ReminderPhase::PermissionGrantedNoReminder,
            _ => ReminderPhase::NoPermission,
        }
    }
}

fn later(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    previous.map_or(now, |p| p.max(now))
}

/// Per-installation lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderPhase {
    NoPermission,
    PermissionGrantedNoReminder,
    PermissionGrantedPending,
}

impl ReminderPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPermission => "no_permission",
            Self::PermissionGrantedNoReminder => "permission_granted_no_reminder",
            Self::PermissionGrantedPending => "permission_granted_pending",
        }
    }
}

impl std::fmt::Display for ReminderPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
