//! Quiet hours: a local-time window during which no reminder may fire.
//!
//! ## Window semantics
//!
//! - `start_hour < end_hour`: daytime window `[start, end)` on one day.
//! - `start_hour > end_hour`: overnight window `[start, 24) ∪ [0, end)`.
//! - `start_hour == end_hour`: quiet all day. A candidate is pushed exactly
//!   24 hours later.
//!
//! A candidate inside the window moves to the next local `end_hour:00:00`,
//! which is the first non-quiet instant at or after it.

use chrono::{DateTime, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Upper bound on window exits applied to one candidate. A well-formed
/// window is left after a single shift; the second pass only confirms it.
const MAX_ADJUST_PASSES: usize = 2;

/// User-configured quiet hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHoursConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_start_hour")]
    pub start_hour: u8,
    #[serde(default = "default_end_hour")]
    pub end_hour: u8,
}

fn default_true() -> bool {
    true
}
fn default_start_hour() -> u8 {
    22
}
fn default_end_hour() -> u8 {
    7
}

impl Default for QuietHoursConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
        }
    }
}

impl QuietHoursConfig {
    /// Disabled quiet hours.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Both hours must be in `0..=23`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [("start_hour", self.start_hour), ("end_hour", self.end_hour)] {
            if value > 23 {
                return Err(ValidationError::HourOutOfRange {
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Window spans midnight (or the whole day when start equals end).
    pub fn wraps_midnight(&self) -> bool {
        self.start_hour >= self.end_hour
    }

    /// Whether a local hour of day falls inside the window.
    pub fn contains_hour(&self, hour: u32) -> bool {
        if !self.enabled {
            return false;
        }
        let start = u32::from(self.start_hour);
        let end = u32::from(self.end_hour);

        if start == end {
            return true;
        }

        // Overnight window (e.g., 22:00 - 07:00)
        if start > end {
            return hour >= start || hour < end;
        }

        // Daytime window (e.g., 09:00 - 17:00)
        hour >= start && hour < end
    }
}

/// Pure quiet-hours policy.
pub struct QuietHoursPolicy;

impl QuietHoursPolicy {
    /// Whether `instant` falls inside quiet hours in `zone`.
    pub fn is_quiet<Tz: TimeZone>(instant: DateTime<Utc>, config: &QuietHoursConfig, zone: &Tz) -> bool {
        let local = instant.with_timezone(zone);
        config.contains_hour(local.hour())
    }

    /// Move `candidate` out of the quiet window.
    ///
    /// Returns `candidate` unchanged when quiet hours are disabled or the
    /// candidate is outside the window. The result is never earlier than
    /// `candidate`.
    pub fn adjust<Tz: TimeZone>(
        candidate: DateTime<Utc>,
        config: &QuietHoursConfig,
        zone: &Tz,
    ) -> DateTime<Utc> {
        if !config.enabled {
            return candidate;
        }

        let mut adjusted = candidate;
        for _ in 0..MAX_ADJUST_PASSES {
            if !Self::is_quiet(adjusted, config, zone) {
                break;
            }
            if config.start_hour == config.end_hour {
                // Quiet all day: there is no exit, push one day and stop.
                return adjusted
                    .checked_add_signed(Duration::hours(24))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
            }
            match Self::window_end(adjusted, config, zone) {
                Some(end) if end > adjusted => adjusted = end,
                _ => break,
            }
        }
        adjusted
    }

    /// Local `end_hour:00:00` that closes the window containing `instant`.
    fn window_end<Tz: TimeZone>(
        instant: DateTime<Utc>,
        config: &QuietHoursConfig,
        zone: &Tz,
    ) -> Option<DateTime<Utc>> {
        let local = instant.with_timezone(zone);
        let today = local.date_naive();

        // In an overnight window the evening half ends tomorrow morning,
        // the early-morning half ends today.
        let end_date = if config.wraps_midnight() && local.hour() >= u32::from(config.start_hour) {
            today.checked_add_days(Days::new(1))?
        } else {
            today
        };

        resolve_local(zone, end_date, u32::from(config.end_hour))
    }
}

/// Map a local wall-clock hour on `date` to an instant.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times
/// that do not exist (DST spring-forward) resolve to the first valid hour
/// after the gap.
fn resolve_local<Tz: TimeZone>(zone: &Tz, date: NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
    let naive: NaiveDateTime = date.and_hms_opt(hour, 0, 0)?;
    for shift in 0..3 {
        let shifted = naive.checked_add_signed(Duration::hours(shift))?;
        match zone.from_local_datetime(&shifted) {
            LocalResult::Single(dt) => return Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => return Some(earliest.with_timezone(&Utc)),
            LocalResult::None => continue,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use proptest::prelude::*;

    fn cfg(start: u8, end: u8) -> QuietHoursConfig {
        QuietHoursConfig {
            enabled: true,
            start_hour: start,
            end_hour: end,
        }
    }

    fn local(zone: &FixedOffset, d: u32, h: u32, m: u32) -> DateTime<Utc> {
        zone.with_ymd_and_hms(2024, 5, d, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn overnight_window_evening_moves_to_next_morning() {
        let zone = FixedOffset::east_opt(2 * 3600).unwrap();
        let candidate = local(&zone, 10, 23, 0);
        let adjusted = QuietHoursPolicy::adjust(candidate, &cfg(22, 7), &zone);
        assert_eq!(adjusted, local(&zone, 11, 7, 0));
    }

    #[test]
    fn overnight_window_early_morning_moves_to_same_morning() {
        let zone = FixedOffset::east_opt(0).unwrap();
        let candidate = local(&zone, 10, 3, 30);
        let adjusted = QuietHoursPolicy::adjust(candidate, &cfg(22, 7), &zone);
        assert_eq!(adjusted, local(&zone, 10, 7, 0));
    }

    #[test]
    fn daytime_window_moves_to_same_day_end() {
        let zone = FixedOffset::west_opt(5 * 3600).unwrap();
        let candidate = local(&zone, 10, 10, 0);
        let adjusted = QuietHoursPolicy::adjust(candidate, &cfg(9, 17), &zone);
        assert_eq!(adjusted, local(&zone, 10, 17, 0));
    }

    #[test]
    fn outside_window_is_unchanged() {
        let zone = FixedOffset::east_opt(0).unwrap();
        let candidate = local(&zone, 10, 20, 0);
        assert_eq!(QuietHoursPolicy::adjust(candidate, &cfg(9, 17), &zone), candidate);
        assert_eq!(QuietHoursPolicy::adjust(candidate, &cfg(22, 7), &zone), candidate);
    }

    #[test]
    fn window_end_hour_is_not_quiet() {
        let zone = FixedOffset::east_opt(0).unwrap();
        let candidate = local(&zone, 10, 7, 0);
        assert_eq!(QuietHoursPolicy::adjust(candidate, &cfg(22, 7), &zone), candidate);
    }

    #[test]
    fn disabled_window_is_unchanged() {
        let zone = FixedOffset::east_opt(0).unwrap();
        let candidate = local(&zone, 10, 23, 0);
        let mut config = cfg(22, 7);
        config.enabled = false;
        assert_eq!(QuietHoursPolicy::adjust(candidate, &config, &zone), candidate);
    }

    #[test]
    fn degenerate_window_pushes_one_day() {
        let zone = FixedOffset::east_opt(0).unwrap();
        let candidate = local(&zone, 10, 12, 15);
        let adjusted = QuietHoursPolicy::adjust(candidate, &cfg(8, 8), &zone);
        assert_eq!(adjusted, candidate + Duration::hours(24));
    }

    #[test]
    fn degenerate_window_saturates_at_the_end_of_time() {
        let max = DateTime::<Utc>::MAX_UTC;
        assert_eq!(QuietHoursPolicy::adjust(max, &cfg(8, 8), &Utc), max);
    }

    /// Central European rules for 2024: UTC+1, UTC+2 between
    /// 2024-03-31 01:00 UTC and 2024-10-27 01:00 UTC.
    #[derive(Debug, Clone, Copy)]
    struct CentralEurope2024;

    impl CentralEurope2024 {
        fn winter() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }

        fn summer() -> FixedOffset {
            FixedOffset::east_opt(2 * 3600).unwrap()
        }

        fn at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, month, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap()
        }
    }

    impl TimeZone for CentralEurope2024 {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            CentralEurope2024
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(12, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let local = *local;
            if local < Self::at(3, 31, 2) {
                LocalResult::Single(Self::winter())
            } else if local < Self::at(3, 31, 3) {
                LocalResult::None
            } else if local < Self::at(10, 27, 2) {
                LocalResult::Single(Self::summer())
            } else if local < Self::at(10, 27, 3) {
                LocalResult::Ambiguous(Self::summer(), Self::winter())
            } else {
                LocalResult::Single(Self::winter())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc >= Self::at(3, 31, 1) && *utc < Self::at(10, 27, 1) {
                Self::summer()
            } else {
                Self::winter()
            }
        }
    }

    #[test]
    fn window_end_in_spring_gap_moves_past_the_gap() {
        // 02:00 local does not exist on 2024-03-31; 03:00 CEST is 01:00 UTC.
        let candidate = Utc.with_ymd_and_hms(2024, 3, 30, 22, 0, 0).unwrap();
        let adjusted = QuietHoursPolicy::adjust(candidate, &cfg(22, 2), &CentralEurope2024);
        assert_eq!(adjusted, Utc.with_ymd_and_hms(2024, 3, 31, 1, 0, 0).unwrap());
        assert!(!QuietHoursPolicy::is_quiet(adjusted, &cfg(22, 2), &CentralEurope2024));
    }

    #[test]
    fn ambiguous_window_end_takes_the_earlier_instant() {
        // 02:00 local happens twice on 2024-10-27; the CEST one is 00:00 UTC.
        let candidate = Utc.with_ymd_and_hms(2024, 10, 26, 21, 0, 0).unwrap();
        let adjusted = QuietHoursPolicy::adjust(candidate, &cfg(22, 2), &CentralEurope2024);
        assert_eq!(adjusted, Utc.with_ymd_and_hms(2024, 10, 27, 0, 0, 0).unwrap());
        assert!(!QuietHoursPolicy::is_quiet(adjusted, &cfg(22, 2), &CentralEurope2024));
    }

    #[test]
    fn hour_zone_conversion_uses_local_time() {
        // 21:00 UTC is 23:00 at UTC+2, inside a 22-07 window there.
        let utc = Utc.with_ymd_and_hms(2024, 5, 10, 21, 0, 0).unwrap();
        let zone = FixedOffset::east_opt(2 * 3600).unwrap();
        assert!(QuietHoursPolicy::is_quiet(utc, &cfg(22, 7), &zone));
        assert!(!QuietHoursPolicy::is_quiet(utc, &cfg(22, 7), &Utc));
    }

    #[test]
    fn validate_rejects_out_of_range_hours() {
        assert!(cfg(22, 7).validate().is_ok());
        assert!(cfg(24, 7).validate().is_err());
        assert!(cfg(0, 30).validate().is_err());
    }

    proptest! {
        #[test]
        fn adjusted_is_outside_window_and_within_a_day(
            start in 0u8..24,
            end in 0u8..24,
            minutes in 0i64..(7 * 24 * 60),
            offset_h in -11i32..12,
        ) {
            prop_assume!(start != end);
            let zone = FixedOffset::east_opt(offset_h * 3600).unwrap();
            let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let candidate = base + Duration::minutes(minutes);
            let config = cfg(start, end);

            let adjusted = QuietHoursPolicy::adjust(candidate, &config, &zone);

            prop_assert!(adjusted >= candidate);
            prop_assert!(adjusted - candidate <= Duration::hours(24));
            prop_assert!(!QuietHoursPolicy::is_quiet(adjusted, &config, &zone));
        }
    }
}
