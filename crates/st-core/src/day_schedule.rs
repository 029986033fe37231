//! Day schedule calculation: nap and bedtime recommendation windows.
//!
//! Given the morning wake instant and a schedule configuration, chains
//! each nap window off the previous one (actual nap history wins over
//! theory when supplied) and derives the bedtime window from the last
//! nap's end. Every bound is a clamp: out-of-range inputs produce a
//! best-effort, internally consistent window, never an error.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::schedule::SleepSchedule;
use crate::transition::{ScheduleTransition, TransitionRules};
use crate::types::ScheduleType;
use crate::tz::{format_clock, instant_on_day, local_date_of};

/// How many minutes under expectation counts as sleep debt.
const SLEEP_DEBT_THRESHOLD_MINUTES: i64 = 30;
/// Cap on how far sleep debt moves bedtime earlier.
const SLEEP_DEBT_MAX_SHIFT_MINUTES: i64 = 45;

/// A put-down window: hard bounds plus the recommended point inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
    pub recommended: DateTime<Utc>,
}

impl TimeWindow {
    /// Builds a window from clamped bounds. The latest bound is pulled
    /// up to the earliest when clamping crossed them; the recommended
    /// point is the midpoint.
    fn from_bounds(earliest: DateTime<Utc>, latest: DateTime<Utc>) -> Self {
        let latest = latest.max(earliest);
        let recommended = earliest + (latest - earliest) / 2;
        Self {
            earliest,
            latest,
            recommended,
        }
    }

    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.earliest && instant <= self.latest
    }

    fn shift_earlier(&mut self, minutes: i64, floor: DateTime<Utc>) {
        let shift = Duration::minutes(minutes);
        self.earliest = (self.earliest - shift).max(floor);
        self.latest = (self.latest - shift).max(self.earliest);
        self.recommended = (self.recommended - shift).clamp(self.earliest, self.latest);
    }
}

/// Recommendation for one nap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NapRecommendation {
    pub nap_number: u32,
    pub window: TimeWindow,
    pub max_duration_minutes: i64,
    pub notes: Vec<String>,
}

/// Recommendation for bedtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedtimeRecommendation {
    pub window: TimeWindow,
    pub notes: Vec<String>,
}

/// Computed schedule for one calendar day. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    /// Local calendar date the recommendations apply to.
    pub date: NaiveDate,
    pub naps: Vec<NapRecommendation>,
    pub bedtime: BedtimeRecommendation,
    pub warnings: Vec<String>,
}

/// Calculates the day's nap and bedtime windows.
///
/// `actual_nap_durations` and `actual_nap_end_times` carry the day's
/// completed naps in order; when present they anchor later windows in
/// place of the theoretical chain. The transition, when active on a
/// [`ScheduleType::Transition`] schedule, replaces the nap list with a
/// single nap held at its current time.
#[must_use]
pub fn calculate_day_schedule(
    wake_time: DateTime<Utc>,
    schedule: &SleepSchedule,
    tz: Tz,
    transition: Option<&ScheduleTransition>,
    actual_nap_durations: Option<&[i64]>,
    actual_nap_end_times: Option<&[DateTime<Utc>]>,
) -> DaySchedule {
    let date = local_date_of(wake_time, tz);
    let on_day = |t| instant_on_day(date, t, tz);

    let naps = if schedule.schedule_type == ScheduleType::Transition {
        transition.map_or_else(
            || plan_naps(wake_time, schedule, date, tz, actual_nap_durations, actual_nap_end_times),
            |t| vec![transition_nap(t, wake_time, date, tz)],
        )
    } else {
        plan_naps(wake_time, schedule, date, tz, actual_nap_durations, actual_nap_end_times)
    };

    let mut warnings = Vec::new();
    let planned_sleep: i64 = naps
        .iter()
        .enumerate()
        .map(|(i, nap)| {
            actual_nap_durations
                .and_then(|d| d.get(i).copied())
                .unwrap_or(nap.max_duration_minutes)
        })
        .sum();
    if planned_sleep > schedule.day_sleep_cap_minutes {
        warnings.push(format!(
            "planned day sleep of {planned_sleep} min exceeds the {} min cap",
            schedule.day_sleep_cap_minutes
        ));
    }

    // Bedtime chains off the last nap's end, actual when known.
    let last_nap_end = naps.last().map_or(wake_time, |last| {
        let index = naps.len() - 1;
        actual_nap_end_times
            .and_then(|ends| ends.get(index).copied())
            .unwrap_or_else(|| {
                let duration = actual_nap_durations
                    .and_then(|d| d.get(index).copied())
                    .unwrap_or(last.max_duration_minutes);
                last.window.recommended + Duration::minutes(duration)
            })
    });

    let bt = &schedule.bedtime;
    let conf_earliest = on_day(bt.earliest);
    let mut conf_latest = on_day(bt.latest);
    if conf_latest < conf_earliest {
        // Latest bedtime past midnight local time.
        conf_latest += Duration::days(1);
    }

    let floor = last_nap_end + Duration::minutes(bt.wake_window_min);
    let ceiling = last_nap_end + Duration::minutes(bt.wake_window_max);
    let earliest = conf_earliest.max(floor).min(conf_latest);
    let latest = conf_latest.min(ceiling).max(earliest);

    let mut window = TimeWindow::from_bounds(earliest, latest);
    // Prefer the goal window for the recommended point when it
    // intersects the computed bounds.
    let goal_start = on_day(bt.goal_start);
    window.recommended = goal_start.clamp(window.earliest, window.latest);

    let mut notes = Vec::new();
    if let Some(actuals) = actual_nap_durations {
        let expected: i64 = schedule
            .naps
            .iter()
            .take(actuals.len())
            .map(|n| n.max_duration_minutes)
            .sum();
        let actual: i64 = actuals.iter().sum();
        let debt = expected - actual;
        if debt >= SLEEP_DEBT_THRESHOLD_MINUTES {
            let shift = (debt / 2).min(SLEEP_DEBT_MAX_SHIFT_MINUTES);
            window.shift_earlier(shift, conf_earliest);
            notes.push(format!(
                "sleep debt of {debt} min today; bedtime moved {shift} min earlier"
            ));
        }
    }

    DaySchedule {
        date,
        naps,
        bedtime: BedtimeRecommendation { window, notes },
        warnings,
    }
}

/// Recomputes the bedtime window from the day's actual naps as
/// (asleep, woke) pairs. Used for post-hoc recalculation after the
/// last nap ends.
#[must_use]
pub fn calculate_adjusted_bedtime(
    wake_time: DateTime<Utc>,
    schedule: &SleepSchedule,
    tz: Tz,
    actual_naps: &[(DateTime<Utc>, DateTime<Utc>)],
) -> BedtimeRecommendation {
    let durations: Vec<i64> = actual_naps
        .iter()
        .map(|(asleep, woke)| (*woke - *asleep).num_minutes().max(0))
        .collect();
    let end_times: Vec<DateTime<Utc>> = actual_naps.iter().map(|(_, woke)| *woke).collect();
    calculate_day_schedule(
        wake_time,
        schedule,
        tz,
        None,
        Some(&durations),
        Some(&end_times),
    )
    .bedtime
}

/// Builds each nap window, chaining anchors through the day.
fn plan_naps(
    wake_time: DateTime<Utc>,
    schedule: &SleepSchedule,
    date: NaiveDate,
    tz: Tz,
    actual_nap_durations: Option<&[i64]>,
    actual_nap_end_times: Option<&[DateTime<Utc>]>,
) -> Vec<NapRecommendation> {
    let on_day = |t| instant_on_day(date, t, tz);
    let mut naps: Vec<NapRecommendation> = Vec::with_capacity(schedule.naps.len());
    let mut anchor = wake_time;

    for (index, config) in schedule.naps.iter().enumerate() {
        if let Some(previous) = naps.last() {
            // Anchor to the previous nap's end: actual when supplied,
            // theoretical (recommended start + duration) otherwise.
            anchor = actual_nap_end_times
                .and_then(|ends| ends.get(index - 1).copied())
                .unwrap_or_else(|| {
                    let duration = actual_nap_durations
                        .and_then(|d| d.get(index - 1).copied())
                        .unwrap_or(previous.max_duration_minutes);
                    previous.window.recommended + Duration::minutes(duration)
                });
        }

        let mut notes = Vec::new();

        let conf_earliest = on_day(config.earliest_start);
        let conf_latest = on_day(config.latest_start);
        let floor = anchor + Duration::minutes(config.wake_window_min);
        let ceiling = anchor + Duration::minutes(config.wake_window_max);

        let earliest = if conf_earliest > floor {
            notes.push(format!(
                "nap {} held to its earliest start time {}",
                config.nap_number, config.earliest_start
            ));
            conf_earliest
        } else {
            floor
        };
        let latest = conf_latest.min(ceiling);

        let mut max_duration = config.max_duration_minutes;
        if index > 0 {
            // Short prior nap: give this nap room to make up the sleep.
            let previous_config = &schedule.naps[index - 1];
            let prior_actual = actual_nap_durations.and_then(|d| d.get(index - 1).copied());
            if let (Some(actual), Some(exception)) =
                (prior_actual, schedule.short_nap_exception_minutes)
            {
                if actual < previous_config.max_duration_minutes {
                    max_duration = exception;
                    notes.push(format!(
                        "nap {} ran short ({actual} min); max duration extended to {exception} min",
                        previous_config.nap_number
                    ));
                }
            }
        }

        naps.push(NapRecommendation {
            nap_number: config.nap_number,
            window: TimeWindow::from_bounds(earliest, latest),
            max_duration_minutes: max_duration,
            notes,
        });
    }

    naps
}

/// The single held nap of an active nap-count transition.
fn transition_nap(
    transition: &ScheduleTransition,
    wake_time: DateTime<Utc>,
    date: NaiveDate,
    tz: Tz,
) -> NapRecommendation {
    let start = instant_on_day(date, transition.current_nap_time, tz);
    let latest = instant_on_day(date, TransitionRules::GOAL_END_BY, tz)
        - Duration::minutes(TransitionRules::GOAL_MAX_DURATION_MINUTES);
    let window = TimeWindow {
        earliest: start,
        latest: latest.max(start),
        recommended: start,
    };
    let week = transition.week_at(wake_time);
    NapRecommendation {
        nap_number: 1,
        window,
        max_duration_minutes: TransitionRules::GOAL_MAX_DURATION_MINUTES,
        notes: vec![format!(
            "nap transition week {week}: holding nap at {}, target {}",
            transition.current_nap_time,
            TransitionRules::GOAL_NAP_START
        )],
    }
}

/// Formats a window as local `HH:mm-HH:mm` for human output.
#[must_use]
pub fn format_window(window: &TimeWindow, tz: Tz) -> String {
    format!(
        "{}-{} (aim {})",
        format_clock(window.earliest, tz),
        format_clock(window.latest, tz),
        format_clock(window.recommended, tz)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChildId, ClockTime};
    use chrono::TimeZone;
    use chrono_tz::America::New_York;
    use chrono_tz::UTC;

    fn clock(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    fn local(schedule_clock: &str) -> DateTime<Utc> {
        instant_on_day(
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            clock(schedule_clock),
            UTC,
        )
    }

    #[test]
    fn two_nap_day_produces_two_naps_and_bedtime() {
        let schedule = SleepSchedule::two_nap();
        let day = calculate_day_schedule(local("06:30"), &schedule, UTC, None, None, None);

        assert_eq!(day.naps.len(), 2);
        assert_eq!(day.naps[0].nap_number, 1);
        assert_eq!(day.naps[1].nap_number, 2);
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());

        for nap in &day.naps {
            assert!(nap.window.earliest <= nap.window.recommended);
            assert!(nap.window.recommended <= nap.window.latest);
        }
        let bt = &day.bedtime.window;
        assert!(bt.earliest <= bt.recommended && bt.recommended <= bt.latest);
    }

    #[test]
    fn nap1_window_respects_wake_window_floor() {
        // Wake 06:30 + 150 min wake window = 09:00 floor; configured
        // earliest is also 09:00, ceiling 06:30 + 210 = 10:00.
        let schedule = SleepSchedule::two_nap();
        let day = calculate_day_schedule(local("06:30"), &schedule, UTC, None, None, None);

        assert_eq!(day.naps[0].window.earliest, local("09:00"));
        assert_eq!(day.naps[0].window.latest, local("10:00"));
    }

    #[test]
    fn early_wake_holds_nap_to_configured_earliest() {
        // Wake 05:00: floor would be 07:30, but nap 1 is configured no
        // earlier than 09:00.
        let schedule = SleepSchedule::two_nap();
        let day = calculate_day_schedule(local("05:00"), &schedule, UTC, None, None, None);

        assert_eq!(day.naps[0].window.earliest, local("09:00"));
        assert!(
            day.naps[0].notes.iter().any(|n| n.contains("held")),
            "expected a held note, got {:?}",
            day.naps[0].notes
        );
    }

    #[test]
    fn late_wake_clamps_instead_of_erroring() {
        // Wake at 11:00: nap 1's window collapses onto its floor past
        // the configured latest; bounds stay ordered.
        let schedule = SleepSchedule::two_nap();
        let day = calculate_day_schedule(local("11:00"), &schedule, UTC, None, None, None);

        let nap1 = &day.naps[0].window;
        assert!(nap1.earliest <= nap1.latest);
        assert!(nap1.contains(nap1.recommended));
        let bt = &day.bedtime.window;
        assert!(bt.earliest <= bt.latest);
    }

    #[test]
    fn nap2_earliest_never_precedes_nap1_latest_plus_wake_window() {
        let schedule = SleepSchedule::two_nap();
        for wake in ["05:30", "06:30", "07:15", "08:00"] {
            let day = calculate_day_schedule(local(wake), &schedule, UTC, None, None, None);
            let nap2_floor =
                day.naps[0].window.latest + Duration::minutes(schedule.naps[1].wake_window_min);
            assert!(
                day.naps[1].window.earliest >= nap2_floor,
                "wake {wake}: nap 2 earliest {} before {}",
                day.naps[1].window.earliest,
                nap2_floor
            );
        }
    }

    #[test]
    fn actual_nap_end_anchors_nap2() {
        let schedule = SleepSchedule::two_nap();
        let nap1_end = local("10:15");
        let day = calculate_day_schedule(
            local("06:30"),
            &schedule,
            UTC,
            None,
            Some(&[100]),
            Some(&[nap1_end]),
        );

        // Nap 2 floor: 10:15 + 180 min = 13:15, above its configured
        // 13:00 earliest.
        assert_eq!(day.naps[1].window.earliest, local("13:15"));
    }

    #[test]
    fn short_prior_nap_extends_nap2_max_duration() {
        // Nap 1 actual 45 min, below its 120 max; exception is 150.
        let schedule = SleepSchedule::two_nap();
        let day = calculate_day_schedule(
            local("06:30"),
            &schedule,
            UTC,
            None,
            Some(&[45]),
            Some(&[local("09:45")]),
        );

        assert_eq!(day.naps[1].max_duration_minutes, 150);
        assert!(
            day.naps[1].notes.iter().any(|n| n.contains("short")),
            "expected a short-nap note, got {:?}",
            day.naps[1].notes
        );
    }

    #[test]
    fn full_length_prior_nap_keeps_configured_max() {
        let schedule = SleepSchedule::two_nap();
        let day = calculate_day_schedule(
            local("06:30"),
            &schedule,
            UTC,
            None,
            Some(&[120]),
            Some(&[local("11:00")]),
        );
        assert_eq!(day.naps[1].max_duration_minutes, 120);
    }

    #[test]
    fn bedtime_prefers_goal_start_within_bounds() {
        // Full-length naps ending 10:30 and 15:00: bedtime bounds run
        // 18:30-19:00 and the 19:00 goal start sits inside them.
        let schedule = SleepSchedule::two_nap();
        let day = calculate_day_schedule(
            local("06:30"),
            &schedule,
            UTC,
            None,
            Some(&[120, 120]),
            Some(&[local("10:30"), local("15:00")]),
        );
        assert_eq!(day.bedtime.window.recommended, local("19:00"));
    }

    #[test]
    fn sleep_debt_moves_bedtime_earlier_with_note() {
        let schedule = SleepSchedule::two_nap();
        let baseline = calculate_day_schedule(
            local("06:30"),
            &schedule,
            UTC,
            None,
            Some(&[120, 120]),
            Some(&[local("11:00"), local("15:30")]),
        );
        let short_day = calculate_day_schedule(
            local("06:30"),
            &schedule,
            UTC,
            None,
            Some(&[45, 45]),
            Some(&[local("11:00"), local("15:30")]),
        );

        assert!(short_day.bedtime.window.recommended < baseline.bedtime.window.recommended);
        assert!(
            short_day
                .bedtime
                .notes
                .iter()
                .any(|n| n.contains("sleep debt")),
            "expected a sleep-debt note, got {:?}",
            short_day.bedtime.notes
        );
        assert!(baseline.bedtime.notes.is_empty());
    }

    #[test]
    fn day_sleep_cap_warning() {
        // Three-nap preset plans 90+120+45 = 255 min against a 240 cap.
        let schedule = SleepSchedule::three_nap();
        let day = calculate_day_schedule(local("06:30"), &schedule, UTC, None, None, None);
        assert!(
            day.warnings.iter().any(|w| w.contains("cap")),
            "expected a cap warning, got {:?}",
            day.warnings
        );
    }

    #[test]
    fn no_cap_warning_when_under_cap() {
        let schedule = SleepSchedule::two_nap();
        let day = calculate_day_schedule(local("06:30"), &schedule, UTC, None, None, None);
        assert!(day.warnings.is_empty());
    }

    #[test]
    fn transition_schedule_yields_single_held_nap() {
        let mut schedule = SleepSchedule::two_nap();
        schedule.schedule_type = ScheduleType::Transition;
        let transition = ScheduleTransition::start(
            ChildId::new("child-1").unwrap(),
            ScheduleType::TwoNap,
            ScheduleType::OneNap,
            6,
            local("06:30") - Duration::days(10),
        );

        let day = calculate_day_schedule(
            local("06:30"),
            &schedule,
            UTC,
            Some(&transition),
            None,
            None,
        );

        assert_eq!(day.naps.len(), 1);
        assert_eq!(day.naps[0].window.recommended, local("11:30"));
        assert_eq!(day.naps[0].max_duration_minutes, 150);
        let note = &day.naps[0].notes[0];
        assert!(note.contains("week 2"), "note was {note}");
        assert!(note.contains("12:30"), "note was {note}");
    }

    #[test]
    fn windows_are_timezone_correct() {
        // 06:30 local New York wake; nap 1 earliest 09:00 local is
        // 13:00 UTC (EDT, UTC-4 on 2025-03-10).
        let wake = instant_on_day(
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            clock("06:30"),
            New_York,
        );
        let schedule = SleepSchedule::two_nap();
        let day = calculate_day_schedule(wake, &schedule, New_York, None, None, None);

        assert_eq!(
            day.naps[0].window.earliest,
            Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap()
        );
        assert_eq!(format_clock(day.naps[0].window.earliest, New_York), "09:00");
    }

    #[test]
    fn adjusted_bedtime_from_sleep_pairs() {
        let schedule = SleepSchedule::two_nap();
        let naps = [
            (local("09:10"), local("09:55")),
            (local("13:30"), local("14:15")),
        ];
        let bedtime = calculate_adjusted_bedtime(local("06:30"), &schedule, UTC, &naps);

        // 90 actual vs 240 expected: heavy debt, shift capped at 45.
        assert!(bedtime.notes.iter().any(|n| n.contains("sleep debt")));
        let full_day = calculate_day_schedule(
            local("06:30"),
            &schedule,
            UTC,
            None,
            Some(&[120, 120]),
            Some(&[local("11:00"), local("15:30")]),
        );
        assert!(bedtime.window.recommended < full_day.bedtime.window.recommended);
    }
}
