//! Calendar-day helpers.
//!
//! Every comparison in the engine happens at local-calendar-day granularity:
//! a timestamp is truncated to the date it falls on in its own offset before
//! anything else looks at it.

use chrono::{DateTime, Local, NaiveDate, TimeZone};

/// Truncate a timestamp to the calendar day it falls on in its own time zone.
pub fn calendar_day<Tz: TimeZone>(ts: &DateTime<Tz>) -> NaiveDate {
    ts.date_naive()
}

/// Today's date on the local clock.
pub fn local_today() -> NaiveDate {
    calendar_day(&Local::now())
}

/// Signed whole-day difference `to - from`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn calendar_day_ignores_time_of_day() {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let morning = tz.with_ymd_and_hms(2024, 3, 10, 0, 5, 0).unwrap();
        let night = tz.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap();
        assert_eq!(calendar_day(&morning), calendar_day(&night));
        assert_eq!(
            calendar_day(&morning),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }

    #[test]
    fn calendar_day_uses_the_local_offset_not_utc() {
        // 23:30 on the 10th in UTC-5 is already the 11th in UTC.
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let late = tz.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();
        assert_eq!(calendar_day(&late), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn days_between_is_signed() {
        let a = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(days_between(a, b), 4); // leap year
        assert_eq!(days_between(b, a), -4);
        assert_eq!(days_between(a, a), 0);
    }
}
