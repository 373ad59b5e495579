//! Reminder message selection.
//!
//! One reminder slot exists; its message nudges toward whichever activity
//! is most overdue relative to its own cadence.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::{ActivityKind, ActivitySnapshot};
use crate::delivery::NotificationPayload;

/// Target cadence per activity, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default = "default_test_days")]
    pub test_days: u32,
    #[serde(default = "default_reflection_days")]
    pub reflection_days: u32,
    #[serde(default = "default_breathing_days")]
    pub breathing_days: u32,
}

fn default_test_days() -> u32 {
    7
}
fn default_reflection_days() -> u32 {
    3
}
fn default_breathing_days() -> u32 {
    2
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            test_days: default_test_days(),
            reflection_days: default_reflection_days(),
            breathing_days: default_breathing_days(),
        }
    }
}

impl CadenceConfig {
    pub fn cadence(&self, kind: ActivityKind) -> Duration {
        let days = match kind {
            ActivityKind::Test => self.test_days,
            ActivityKind::Reflection => self.reflection_days,
            ActivityKind::Breathing => self.breathing_days,
        };
        // Zero-day cadences would divide by zero; treat them as one day.
        Duration::days(i64::from(days.max(1)))
    }
}

/// Picks the reminder kind and renders its text.
#[derive(Debug, Clone, Default)]
pub struct PayloadSelector {
    cadence: CadenceConfig,
}

impl PayloadSelector {
    pub fn new(cadence: CadenceConfig) -> Self {
        Self { cadence }
    }

    /// Activity most overdue relative to its cadence.
    ///
    /// Never-completed activities are infinitely stale. Ties keep the
    /// order Test, Reflection, Breathing.
    pub fn select_kind(&self, snapshot: &ActivitySnapshot, now: DateTime<Utc>) -> ActivityKind {
        let mut best = ActivityKind::Test;
        let mut best_score = f64::NEG_INFINITY;
        for kind in ActivityKind::ALL {
            let score = self.staleness(snapshot.get(kind), kind, now);
            if score > best_score {
                best = kind;
                best_score = score;
            }
        }
        best
    }

    fn staleness(&self, last: Option<DateTime<Utc>>, kind: ActivityKind, now: DateTime<Utc>) -> f64 {
        match last {
            None => f64::INFINITY,
            Some(at) => {
                let elapsed = (now - at).num_seconds().max(0) as f64;
                elapsed / self.cadence.cadence(kind).num_seconds() as f64
            }
        }
    }

    pub fn render(kind: ActivityKind) -> NotificationPayload {
        let (title, body) = match kind {
            ActivityKind::Test => (
                "Time for your weekly check-in",
                "A short anxiety check-in helps you see how your week has been.",
            ),
            ActivityKind::Reflection => (
                "How are you feeling?",
                "Take a minute to write down what's on your mind.",
            ),
            ActivityKind::Breathing => (
                "Take a breath",
                "A two-minute breathing exercise can settle a busy mind.",
            ),
        };
        NotificationPayload {
            title: title.to_string(),
            body: body.to_string(),
        }
    }
}
