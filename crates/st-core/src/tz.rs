//! Timezone-aware clock-time conversion.
//!
//! All window construction in the day-schedule calculator happens in
//! the caregiver's named zone; these helpers turn schedule clock times
//! into absolute instants and back, DST transitions included.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::types::ClockTime;

/// Converts a clock time on a local calendar day to an absolute instant.
///
/// DST handling follows the usual convention: an ambiguous local time
/// (fall-back) resolves to the earlier instant, and a non-existent one
/// (spring-forward gap) slides forward an hour.
#[must_use]
pub fn instant_on_day(date: NaiveDate, time: ClockTime, tz: Tz) -> DateTime<Utc> {
    let naive = date
        .and_hms_opt(time.hour(), time.minute(), 0)
        .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).expect("midnight always exists"));
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map_or_else(|| Utc.from_utc_datetime(&shifted), |dt| dt.with_timezone(&Utc))
        }
    }
}

/// The local calendar date an instant falls on in a zone.
#[must_use]
pub fn local_date_of(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// The local wall-clock time of an instant in a zone.
#[must_use]
pub fn clock_time_of(instant: DateTime<Utc>, tz: Tz) -> ClockTime {
    let local = instant.with_timezone(&tz);
    ClockTime::from_minutes_saturating(i64::from(local.hour()) * 60 + i64::from(local.minute()))
}

/// Formats an instant as `HH:mm` local time.
#[must_use]
pub fn format_clock(instant: DateTime<Utc>, tz: Tz) -> String {
    clock_time_of(instant, tz).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use chrono_tz::America::New_York;
    use chrono_tz::UTC;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    #[test]
    fn utc_roundtrip() {
        let instant = instant_on_day(date(2025, 3, 10), clock("13:30"), UTC);
        assert_eq!(clock_time_of(instant, UTC), clock("13:30"));
        assert_eq!(local_date_of(instant, UTC), date(2025, 3, 10));
    }

    #[test]
    fn new_york_offset_applied() {
        // EST is UTC-5 in January.
        let instant = instant_on_day(date(2025, 1, 15), clock("09:00"), New_York);
        assert_eq!(clock_time_of(instant, UTC), clock("14:00"));
        assert_eq!(format_clock(instant, New_York), "09:00");
    }

    #[test]
    fn spring_forward_gap_slides_an_hour() {
        // 2025-03-09 02:30 does not exist in New York.
        let instant = instant_on_day(date(2025, 3, 9), clock("02:30"), New_York);
        assert_eq!(clock_time_of(instant, New_York), clock("03:30"));
    }

    #[test]
    fn fall_back_ambiguity_picks_earlier_instant() {
        // 2025-11-02 01:30 occurs twice in New York; the earlier one is
        // still EDT (UTC-4).
        let instant = instant_on_day(date(2025, 11, 2), clock("01:30"), New_York);
        assert_eq!(clock_time_of(instant, UTC), clock("05:30"));
    }

    #[test]
    fn local_date_differs_across_midnight() {
        // 01:00 UTC on the 11th is still the evening of the 10th in
        // New York.
        let instant = instant_on_day(date(2025, 3, 11), clock("01:00"), UTC);
        assert_eq!(local_date_of(instant, New_York), date(2025, 3, 10));
    }
}
