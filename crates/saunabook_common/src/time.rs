//! Calendar helpers.
//!
//! Instants are stored in UTC, but "the hour", "the day" and the job firing
//! times are local notions, so every helper takes the configured zone.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveTime, SubsecRound, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use std::str::FromStr;
use std::sync::Mutex;

use crate::error::{config_error, SaunaError};
use crate::models::TimeRange;

/// Parses an IANA zone name such as `Europe/Helsinki`.
pub fn parse_time_zone(name: &str) -> Result<Tz, SaunaError> {
    Tz::from_str(name).map_err(|_| config_error(format!("unknown time zone: {}", name)))
}

/// Parses a local wall clock time in `HH:MM` form.
pub fn parse_hh_mm(value: &str) -> Result<NaiveTime, SaunaError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| config_error(format!("invalid time of day (HH:MM): {}", value)))
}

/// Start of the local hour containing `instant`.
pub fn truncate_to_hour(instant: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = instant.with_timezone(&tz);
    instant
        - Duration::seconds(i64::from(local.minute()) * 60 + i64::from(local.second()))
        - Duration::nanoseconds(i64::from(local.nanosecond()))
}

pub fn is_hour_aligned(instant: DateTime<Utc>, tz: Tz) -> bool {
    truncate_to_hour(instant, tz) == instant
}

/// Local calendar date of `instant`.
pub fn local_day(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// The UTC instant of a local wall clock time.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant;
/// nonexistent times (DST spring-forward) roll forward by one hour.
pub fn local_instant(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => t.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            match tz.from_local_datetime(&shifted).earliest() {
                Some(t) => t.with_timezone(&Utc),
                None => Utc.from_utc_datetime(&naive),
            }
        }
    }
}

/// `[local 00:00 of date, local 00:00 of the next day)`.
pub fn day_range(date: NaiveDate, tz: Tz) -> TimeRange {
    let next = date.succ_opt().unwrap_or(date);
    TimeRange::new(
        local_instant(date, NaiveTime::MIN, tz),
        local_instant(next, NaiveTime::MIN, tz),
    )
}

/// Source of "now". Injected everywhere a decision depends on the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock, truncated to whole seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}

/// A settable clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helsinki() -> Tz {
        parse_time_zone("Europe/Helsinki").unwrap()
    }

    #[test]
    fn truncates_to_local_hour() {
        let tz = helsinki();
        // 10:05:30 local (UTC+3 in summer)
        let instant = Utc.with_ymd_and_hms(2025, 7, 4, 7, 5, 30).unwrap();
        let truncated = truncate_to_hour(instant, tz);
        assert_eq!(truncated, Utc.with_ymd_and_hms(2025, 7, 4, 7, 0, 0).unwrap());
        assert!(is_hour_aligned(truncated, tz));
        assert!(!is_hour_aligned(instant, tz));
    }

    #[test]
    fn half_hour_zones_align_on_local_hours() {
        let tz = parse_time_zone("Asia/Kolkata").unwrap();
        // 12:00 UTC is 17:30 in Kolkata, so not a local full hour
        let instant = Utc.with_ymd_and_hms(2025, 7, 4, 12, 0, 0).unwrap();
        assert!(!is_hour_aligned(instant, tz));
        assert_eq!(
            truncate_to_hour(instant, tz),
            Utc.with_ymd_and_hms(2025, 7, 4, 11, 30, 0).unwrap()
        );
    }

    #[test]
    fn day_range_follows_local_midnight() {
        let tz = helsinki();
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        let range = day_range(date, tz);
        assert_eq!(range.start, Utc.with_ymd_and_hms(2025, 7, 3, 21, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2025, 7, 4, 21, 0, 0).unwrap());
        assert_eq!(local_day(range.start, tz), date);
        assert_eq!(local_day(range.end, tz), date.succ_opt().unwrap());
    }

    #[test]
    fn nonexistent_local_time_rolls_forward() {
        let tz = helsinki();
        // Helsinki skips 03:00-04:00 on the last Sunday of March
        let date = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap();
        let time = NaiveTime::from_hms_opt(3, 30, 0).unwrap();
        let instant = local_instant(date, time, tz);
        assert_eq!(instant.with_timezone(&tz).time(), NaiveTime::from_hms_opt(4, 30, 0).unwrap());
    }

    #[test]
    fn fixed_clock_can_be_moved() {
        let start = Utc.with_ymd_and_hms(2025, 7, 4, 7, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        clock.advance(Duration::minutes(45));
        assert_eq!(clock.now(), start + Duration::minutes(45));
        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn rejects_bad_config_values() {
        assert!(parse_time_zone("Mars/Olympus").is_err());
        assert!(parse_hh_mm("25:00").is_err());
        assert_eq!(parse_hh_mm("20:00").unwrap(), NaiveTime::from_hms_opt(20, 0, 0).unwrap());
    }
}
