//! Minimum spacing between two scheduling decisions.
//!
//! The cooldown is measured from the last *decision*, never from delivery,
//! and applies regardless of which trigger caused the evaluation.

use chrono::{DateTime, Duration, Utc};

/// Default spacing between two reminders, in hours.
pub const DEFAULT_COOLDOWN_HOURS: u32 = 72;

/// Default spacing between two reminders.
pub fn default_cooldown() -> Duration {
    Duration::hours(i64::from(DEFAULT_COOLDOWN_HOURS))
}

/// Pure cooldown policy.
pub struct CooldownPolicy;

impl CooldownPolicy {
    /// Earliest instant at which a new reminder may be scheduled.
    ///
    /// With no previous decision there is no cooldown and `now` is returned.
    /// Otherwise the result is `max(now, last_decision_at + cooldown)`.
    pub fn next_eligible_instant(
        last_decision_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> DateTime<Utc> {
        match last_decision_at {
            None => now,
            Some(last) => {
                let eligible = last
                    .checked_add_signed(cooldown)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                eligible.max(now)
            }
        }
    }

    /// Whether `candidate` is meaningfully later than `now`.
    ///
    /// Differences up to `epsilon` are treated as "now" so that a candidate
    /// computed a few milliseconds after the cooldown expired still counts.
    pub fn is_deferred(candidate: DateTime<Utc>, now: DateTime<Utc>, epsilon: Duration) -> bool {
        candidate - now > epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
    }

    #[test]
    fn first_evaluation_has_no_cooldown() {
        let now = t0();
        assert_eq!(
            CooldownPolicy::next_eligible_instant(None, now, default_cooldown()),
            now
        );
    }

    #[test]
    fn cooldown_still_running_returns_expiry() {
        let last = t0();
        let now = last + Duration::hours(10);
        assert_eq!(
            CooldownPolicy::next_eligible_instant(Some(last), now, default_cooldown()),
            last + Duration::hours(72)
        );
    }

    #[test]
    fn expired_cooldown_returns_now() {
        let last = t0();
        let now = last + Duration::hours(100);
        assert_eq!(
            CooldownPolicy::next_eligible_instant(Some(last), now, default_cooldown()),
            now
        );
    }

    #[test]
    fn zero_cooldown_is_always_eligible() {
        let last = t0();
        assert_eq!(
            CooldownPolicy::next_eligible_instant(Some(last), last, Duration::zero()),
            last
        );
    }

    #[test]
    fn deferral_respects_epsilon() {
        let now = t0();
        let eps = Duration::seconds(1);
        assert!(!CooldownPolicy::is_deferred(now, now, eps));
        assert!(!CooldownPolicy::is_deferred(now + Duration::milliseconds(500), now, eps));
        assert!(CooldownPolicy::is_deferred(now + Duration::minutes(1), now, eps));
    }

    proptest! {
        #[test]
        fn eligible_is_never_before_now(offset_h in -200i64..200, cooldown_h in 0i64..200) {
            let now = t0();
            let last = now + Duration::hours(offset_h);
            let eligible = CooldownPolicy::next_eligible_instant(
                Some(last),
                now,
                Duration::hours(cooldown_h),
            );
            prop_assert!(eligible >= now);
            prop_assert!(eligible >= last + Duration::hours(cooldown_h));
        }
    }
}
