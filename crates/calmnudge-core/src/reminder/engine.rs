//! Reminder scheduling engine.
//!
//! The engine is reactive: it only runs when the host raises a trigger
//! (app foreground, settings change, activity completed) and calls
//! [`SchedulingEngine::evaluate_and_schedule_if_needed`]. There is no
//! background clock.
//!
//! ## Evaluation
//!
//! ```text
//! permission != granted  -> cancel pending, Skipped(NoPermission)
//! reminders disabled     -> cancel pending, Skipped(Disabled)
//! cooldown still running -> Skipped(CooldownActive)   (unless forced)
//! otherwise              -> cancel pending, schedule fresh id, commit
//! ```
//!
//! Every operation holds the state lock for its whole read-decide-commit
//! sequence, so concurrent triggers are serialized and at most one
//! reminder is ever pending.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};

use super::cooldown::{default_cooldown, CooldownPolicy};
use super::payload::{CadenceConfig, PayloadSelector};
use super::quiet_hours::{QuietHoursConfig, QuietHoursPolicy};
use super::state::{ReminderPhase, ReminderState};
use crate::activity::{ActivityKind, ActivityLedger, ActivitySnapshot};
use crate::delivery::{DeliveryBackend, ReminderId};
use crate::error::{PermissionRequestError, Result};
use crate::permission::{PermissionGate, PermissionStatus};
use crate::storage::ReminderStateStore;

/// Candidates this close to `now` count as "now".
fn cooldown_epsilon() -> Duration {
    Duration::seconds(1)
}

/// Settings the engine reads on every evaluation. Owned by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderSettings {
    /// Master switch for reminders.
    pub enabled: bool,
    /// Minimum spacing between scheduling decisions.
    pub cooldown: Duration,
    /// A reminder never fires sooner than this after any tracked activity.
    /// Zero (the default) leaves the fire time to cooldown and quiet hours.
    pub activity_grace: Duration,
    /// Upper bound on waiting for the authorization prompt.
    pub permission_timeout: std::time::Duration,
    pub quiet_hours: QuietHoursConfig,
    pub cadence: CadenceConfig,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown: default_cooldown(),
            activity_grace: Duration::zero(),
            permission_timeout: std::time::Duration::from_secs(60),
            quiet_hours: QuietHoursConfig::default(),
            cadence: CadenceConfig::default(),
        }
    }
}

/// Why an evaluation did not schedule anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkipReason {
    /// Notifications are not authorized.
    NoPermission,
    /// The user switched reminders off.
    Disabled,
    /// The previous decision is too recent.
    CooldownActive { eligible_at: DateTime<Utc> },
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SchedulingDecision {
    Scheduled {
        fire_at: DateTime<Utc>,
        id: ReminderId,
        kind: ActivityKind,
    },
    Skipped {
        reason: SkipReason,
    },
}

impl SchedulingDecision {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, SchedulingDecision::Scheduled { .. })
    }

    fn skipped(reason: SkipReason) -> Self {
        SchedulingDecision::Skipped { reason }
    }
}

/// Per-call evaluation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluateOptions {
    /// Re-place the pending reminder even while the cooldown runs.
    pub force: bool,
}

/// Result of [`SchedulingEngine::request_permission_then_schedule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOutcome {
    pub granted: bool,
    /// Decision of the evaluation that follows a grant, if it succeeded.
    pub decision: Option<SchedulingDecision>,
}

/// Snapshot for settings screens and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderStatus {
    pub phase: ReminderPhase,
    pub permission: PermissionStatus,
    pub state: ReminderState,
}

/// Injected collaborators.
#[derive(Clone)]
pub struct Collaborators {
    pub permission: Arc<dyn PermissionGate>,
    pub ledger: Arc<dyn ActivityLedger>,
    pub delivery: Arc<dyn DeliveryBackend>,
    pub store: Arc<dyn ReminderStateStore>,
}

/// Orchestrates permission, cooldown, quiet hours and delivery.
pub struct SchedulingEngine<Tz: TimeZone = Local> {
    state: Mutex<ReminderState>,
    permission: Arc<dyn PermissionGate>,
    ledger: Arc<dyn ActivityLedger>,
    delivery: Arc<dyn DeliveryBackend>,
    store: Arc<dyn ReminderStateStore>,
    settings: watch::Receiver<ReminderSettings>,
    zone: Tz,
}

impl SchedulingEngine<Local> {
    /// Engine evaluating quiet hours in the system time zone.
    pub fn new(
        collaborators: Collaborators,
        settings: watch::Receiver<ReminderSettings>,
    ) -> Result<Self> {
        Self::with_zone(collaborators, settings, Local)
    }
}

impl<Tz> SchedulingEngine<Tz>
where
    Tz: TimeZone + Send + Sync,
{
    /// Engine evaluating quiet hours in `zone`. Loads the persisted state.
    pub fn with_zone(
        collaborators: Collaborators,
        settings: watch::Receiver<ReminderSettings>,
        zone: Tz,
    ) -> Result<Self> {
        let state = collaborators.store.load()?;
        Ok(Self {
            state: Mutex::new(state),
            permission: collaborators.permission,
            ledger: collaborators.ledger,
            delivery: collaborators.delivery,
            store: collaborators.store,
            settings,
            zone,
        })
    }

    fn settings(&self) -> ReminderSettings {
        self.settings.borrow().clone()
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Decide whether a reminder should be scheduled and apply it.
    ///
    /// # Errors
    /// Returns [`crate::CoreError::Delivery`] when the backend refuses the
    /// schedule command. The cooldown is not consumed in that case, so the
    /// next trigger retries.
    pub async fn evaluate_and_schedule_if_needed(
        &self,
        now: DateTime<Utc>,
    ) -> Result<SchedulingDecision> {
        self.evaluate_with(now, EvaluateOptions::default()).await
    }

    /// [`Self::evaluate_and_schedule_if_needed`] with explicit options.
    pub async fn evaluate_with(
        &self,
        now: DateTime<Utc>,
        options: EvaluateOptions,
    ) -> Result<SchedulingDecision> {
        let mut state = self.state.lock().await;
        let settings = self.settings();

        let permission = self.permission.current_status().await;
        if !permission.is_granted() {
            self.cancel_pending(&mut state);
            tracing::debug!(%permission, "reminder evaluation skipped: no permission");
            return Ok(SchedulingDecision::skipped(SkipReason::NoPermission));
        }

        if !settings.enabled {
            self.cancel_pending(&mut state);
            tracing::debug!("reminder evaluation skipped: reminders disabled");
            return Ok(SchedulingDecision::skipped(SkipReason::Disabled));
        }

        let snapshot = ActivitySnapshot::read(self.ledger.as_ref()).await?;

        let candidate = CooldownPolicy::next_eligible_instant(
            state.last_fired_or_evaluated_at,
            now,
            settings.cooldown,
        );
        if !options.force && CooldownPolicy::is_deferred(candidate, now, cooldown_epsilon()) {
            tracing::debug!(eligible_at = %candidate, "reminder evaluation skipped: cooldown active");
            return Ok(SchedulingDecision::skipped(SkipReason::CooldownActive {
                eligible_at: candidate,
            }));
        }

        let base = match snapshot.most_recent() {
            Some(at) if settings.activity_grace > Duration::zero() => {
                let settled = at
                    .checked_add_signed(settings.activity_grace)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                candidate.max(settled)
            }
            _ => candidate,
        };
        let fire_at = QuietHoursPolicy::adjust(base, &settings.quiet_hours, &self.zone);

        let selector = PayloadSelector::new(settings.cadence);
        let kind = selector.select_kind(&snapshot, now);
        let payload = PayloadSelector::render(kind);

        // The stale reminder is gone once cancelled, whatever happens next.
        self.cancel_pending(&mut state);

        let id = ReminderId::new();
        if let Err(e) = self.delivery.schedule(&id, fire_at, &payload) {
            tracing::warn!(error = %e, %fire_at, "reminder delivery failed; cooldown not consumed");
            return Err(e.into());
        }

        state.commit_scheduled(now, id.clone(), fire_at);
        self.persist(&state);
        tracing::info!(%id, %fire_at, %kind, forced = options.force, "reminder scheduled");

        Ok(SchedulingDecision::Scheduled { fire_at, id, kind })
    }

    /// Cancel the pending reminder, if any. Cooldown bookkeeping is kept so
    /// toggling reminders off and on cannot bypass it.
    pub async fn disable_reminders(&self) -> Option<ReminderId> {
        let mut state = self.state.lock().await;
        let cancelled = self.cancel_pending(&mut state);
        if let Some(id) = &cancelled {
            tracing::info!(%id, "reminders disabled; pending reminder cancelled");
        }
        cancelled
    }

    /// Ask for authorization and, if granted, evaluate immediately.
    ///
    /// Denials, prompt failures and timeouts all report `granted: false`
    /// and leave the scheduling fields untouched. `permission_prompted_at`
    /// is the exception: it is recorded and persisted before the prompt is
    /// shown, whatever the answer.
    pub async fn request_permission_then_schedule(&self, now: DateTime<Utc>) -> PermissionOutcome {
        let timeout = self.settings().permission_timeout;

        {
            let mut state = self.state.lock().await;
            state.permission_prompted_at = Some(now);
            self.persist(&state);
        }

        let answer = match tokio::time::timeout(timeout, self.permission.request_authorization()).await {
            Ok(answer) => answer,
            Err(_) => Err(PermissionRequestError::TimedOut {
                timeout_secs: timeout.as_secs(),
            }),
        };

        match answer {
            Ok(true) => {
                tracing::info!("notification permission granted");
                let decision = match self.evaluate_and_schedule_if_needed(now).await {
                    Ok(decision) => Some(decision),
                    Err(e) => {
                        tracing::warn!(error = %e, "evaluation after permission grant failed");
                        None
                    }
                };
                PermissionOutcome {
                    granted: true,
                    decision,
                }
            }
            Ok(false) => {
                tracing::info!("notification permission denied");
                PermissionOutcome {
                    granted: false,
                    decision: None,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "notification permission request failed");
                PermissionOutcome {
                    granted: false,
                    decision: None,
                }
            }
        }
    }

    /// The host reports that a reminder was shown. Clears it when it is
    /// the pending one; returns whether it was.
    pub async fn on_reminder_delivered(&self, id: &ReminderId) -> bool {
        let mut state = self.state.lock().await;
        if state.pending_identifier.as_ref() != Some(id) {
            tracing::debug!(%id, "delivered reminder is not the pending one");
            return false;
        }
        state.clear_pending();
        self.persist(&state);
        tracing::info!(%id, "pending reminder delivered");
        true
    }

    pub async fn status(&self) -> ReminderStatus {
        let state = self.state.lock().await;
        let permission = self.permission.current_status().await;
        ReminderStatus {
            phase: state.phase(permission),
            permission,
            state: state.clone(),
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    fn cancel_pending(&self, state: &mut ReminderState) -> Option<ReminderId> {
        let id = state.clear_pending()?;
        self.delivery.cancel(&id);
        self.persist(state);
        tracing::info!(%id, "pending reminder cancelled");
        Some(id)
    }

    fn persist(&self, state: &ReminderState) {
        if let Err(e) = self.store.save(state) {
            tracing::warn!(error = %e, "failed to persist reminder state");
        }
    }
}
