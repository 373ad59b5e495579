//! Tracked wellbeing activities and the read-only ledger the engine queries.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DatabaseError, ValidationError};

/// Kind of activity whose completion resets the need for a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Anxiety check-in test
    Test,
    /// Free-form reflection
    Reflection,
    /// Breathing exercise
    Breathing,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 3] = [
        ActivityKind::Test,
        ActivityKind::Reflection,
        ActivityKind::Breathing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Test => "test",
            ActivityKind::Reflection => "reflection",
            ActivityKind::Breathing => "breathing",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "test" => Ok(ActivityKind::Test),
            "reflection" => Ok(ActivityKind::Reflection),
            "breathing" => Ok(ActivityKind::Breathing),
            other => Err(ValidationError::InvalidValue {
                field: "activity".to_string(),
                message: format!("unknown activity kind '{other}'"),
            }),
        }
    }
}

/// Last completion per activity, read fresh on every evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    pub last_test_completed_at: Option<DateTime<Utc>>,
    pub last_reflection_completed_at: Option<DateTime<Utc>>,
    pub last_breathing_completed_at: Option<DateTime<Utc>>,
}

impl ActivitySnapshot {
    /// Query every tracked activity from `ledger`.
    pub async fn read(ledger: &dyn ActivityLedger) -> Result<Self, DatabaseError> {
        Ok(Self {
            last_test_completed_at: ledger.last_completed(ActivityKind::Test).await?,
            last_reflection_completed_at: ledger.last_completed(ActivityKind::Reflection).await?,
            last_breathing_completed_at: ledger.last_completed(ActivityKind::Breathing).await?,
        })
    }

    pub fn get(&self, kind: ActivityKind) -> Option<DateTime<Utc>> {
        match kind {
            ActivityKind::Test => self.last_test_completed_at,
            ActivityKind::Reflection => self.last_reflection_completed_at,
            ActivityKind::Breathing => self.last_breathing_completed_at,
        }
    }

    /// Latest completion across all activities, `None` if nothing was ever done.
    pub fn most_recent(&self) -> Option<DateTime<Utc>> {
        ActivityKind::ALL.iter().filter_map(|k| self.get(*k)).max()
    }
}

/// Read-only source of activity completion timestamps.
///
/// Implementations may cross a storage boundary, hence async.
#[async_trait]
pub trait ActivityLedger: Send + Sync {
    async fn last_completed(&self, kind: ActivityKind) -> Result<Option<DateTime<Utc>>, DatabaseError>;
}
