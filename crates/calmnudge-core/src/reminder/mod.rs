mod cooldown;
mod engine;
mod payload;
mod quiet_hours;
mod state;

pub use cooldown::{default_cooldown, CooldownPolicy, DEFAULT_COOLDOWN_HOURS};
pub use engine::{
    Collaborators, EvaluateOptions, PermissionOutcome, ReminderSettings, ReminderStatus,
    SchedulingDecision, SchedulingEngine, SkipReason,
};
pub use payload::{CadenceConfig, PayloadSelector};
pub use quiet_hours::{QuietHoursConfig, QuietHoursPolicy};
pub use state::{ReminderPhase, ReminderState};
