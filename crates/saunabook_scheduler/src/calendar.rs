// --- File: crates/saunabook_scheduler/src/calendar.rs ---
//! Peak season calendar for club sauna generation.

use chrono::{Datelike, NaiveDate, Weekday};

/// Whether a club sauna is generated on `date`.
///
/// June through August every day; May and September on Fridays and
/// Saturdays only.
pub fn is_peak_day(date: NaiveDate) -> bool {
    match date.month() {
        6..=8 => true,
        5 | 9 => matches!(date.weekday(), Weekday::Fri | Weekday::Sat),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn summer_is_peak_every_day() {
        assert!(is_peak_day(day(2025, 6, 1)));
        assert!(is_peak_day(day(2025, 7, 15)));
        assert!(is_peak_day(day(2025, 8, 31)));
    }

    #[test]
    fn shoulder_months_only_on_friday_and_saturday() {
        // 2025-05-09 is a Friday
        assert!(is_peak_day(day(2025, 5, 9)));
        assert!(is_peak_day(day(2025, 5, 10)));
        assert!(!is_peak_day(day(2025, 5, 11)));
        assert!(!is_peak_day(day(2025, 5, 8)));
        // 2025-09-05 is a Friday
        assert!(is_peak_day(day(2025, 9, 5)));
        assert!(is_peak_day(day(2025, 9, 6)));
        assert!(!is_peak_day(day(2025, 9, 7)));
    }

    #[test]
    fn off_season() {
        assert!(!is_peak_day(day(2025, 4, 30)));
        assert!(!is_peak_day(day(2025, 10, 3)));
        assert!(!is_peak_day(day(2025, 12, 24)));
    }

    proptest! {
        #[test]
        fn winter_months_are_never_peak(month in prop_oneof![1..=4u32, 10..=12u32], d in 1..=28u32) {
            prop_assert!(!is_peak_day(day(2026, month, d)));
        }
    }
}
