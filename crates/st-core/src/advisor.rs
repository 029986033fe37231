//! Next-action advisor: turns a day schedule plus the current moment
//! into a single "what should happen next" recommendation.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::day_schedule::{DaySchedule, TimeWindow};
use crate::tz::{format_clock, instant_on_day};
use crate::types::ClockTime;

/// The kind of event the advisor is pointing at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextActionKind {
    /// Put down for a nap; `nap_number` says which one.
    Nap,
    /// Put down for night sleep.
    Bedtime,
    /// Nothing due yet; `minutes_until_earliest` counts down.
    Wait,
    /// Sleep has run past its deadline and should be ended.
    Wake,
}

/// A single recommendation for the caller to act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextAction {
    pub kind: NextActionKind,
    pub description: String,
    pub window: Option<TimeWindow>,
    pub nap_number: Option<u32>,
    /// Minutes until the next window opens. Only set on [`NextActionKind::Wait`].
    pub minutes_until_earliest: Option<i64>,
    pub notes: Vec<String>,
}

/// Picks the next action for an awake child.
///
/// Walks the remaining naps in order, skipping the ones already taken
/// and the ones whose window has fully passed, then falls through to
/// bedtime. `is_asleep` short-circuits to a wait: the advisor never
/// recommends a put-down while a session is open.
#[must_use]
pub fn calculate_next_action(
    now: DateTime<Utc>,
    day: &DaySchedule,
    completed_nap_count: usize,
    is_asleep: bool,
    tz: Tz,
) -> NextAction {
    if is_asleep {
        return NextAction {
            kind: NextActionKind::Wait,
            description: "Child is currently sleeping".to_string(),
            window: None,
            nap_number: None,
            minutes_until_earliest: None,
            notes: Vec::new(),
        };
    }

    for nap in day.naps.iter().skip(completed_nap_count) {
        if now > nap.window.latest {
            // Window missed; the next nap (or bedtime) absorbs it.
            continue;
        }
        if now < nap.window.earliest {
            let minutes = (nap.window.earliest - now).num_minutes();
            return NextAction {
                kind: NextActionKind::Wait,
                description: format!(
                    "nap {} window opens at {}",
                    nap.nap_number,
                    format_clock(nap.window.earliest, tz)
                ),
                window: Some(nap.window),
                nap_number: Some(nap.nap_number),
                minutes_until_earliest: Some(minutes),
                notes: nap.notes.clone(),
            };
        }
        return NextAction {
            kind: NextActionKind::Nap,
            description: format!(
                "put down for nap {} (aim {})",
                nap.nap_number,
                format_clock(nap.window.recommended, tz)
            ),
            window: Some(nap.window),
            nap_number: Some(nap.nap_number),
            minutes_until_earliest: None,
            notes: nap.notes.clone(),
        };
    }

    let bt = &day.bedtime.window;
    if now < bt.earliest {
        let minutes = (bt.earliest - now).num_minutes();
        return NextAction {
            kind: NextActionKind::Wait,
            description: format!(
                "bedtime window opens at {}",
                format_clock(bt.earliest, tz)
            ),
            window: Some(*bt),
            nap_number: None,
            minutes_until_earliest: Some(minutes),
            notes: day.bedtime.notes.clone(),
        };
    }
    NextAction {
        kind: NextActionKind::Bedtime,
        description: format!(
            "put down for bedtime (aim {})",
            format_clock(bt.recommended, tz)
        ),
        window: Some(*bt),
        nap_number: None,
        minutes_until_earliest: None,
        notes: day.bedtime.notes.clone(),
    }
}

/// Flags overnight sleep that has run past the morning deadline.
///
/// Returns a [`NextActionKind::Wake`] action when the child is still
/// asleep at or past `must_wake_by` local time, `None` otherwise.
#[must_use]
pub fn check_wake_deadline(
    now: DateTime<Utc>,
    must_wake_by: ClockTime,
    is_asleep: bool,
    tz: Tz,
) -> Option<NextAction> {
    if !is_asleep {
        return None;
    }
    let deadline = instant_on_day(crate::tz::local_date_of(now, tz), must_wake_by, tz);
    if now < deadline {
        return None;
    }
    Some(NextAction {
        kind: NextActionKind::Wake,
        description: format!("wake by {} has passed", must_wake_by),
        window: None,
        nap_number: None,
        minutes_until_earliest: None,
        notes: vec![format!(
            "asleep past the {} deadline as of {}",
            must_wake_by,
            format_clock(now, tz)
        )],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::day_schedule::calculate_day_schedule;
    use crate::schedule::SleepSchedule;
    use chrono::NaiveDate;
    use chrono_tz::UTC;

    fn local(s: &str) -> DateTime<Utc> {
        instant_on_day(
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            s.parse().unwrap(),
            UTC,
        )
    }

    fn two_nap_day() -> DaySchedule {
        calculate_day_schedule(
            local("06:30"),
            &SleepSchedule::two_nap(),
            UTC,
            None,
            None,
            None,
        )
    }

    #[test]
    fn before_first_window_waits_with_countdown() {
        let day = two_nap_day();
        // Nap 1 window is 09:00-10:00.
        let action = calculate_next_action(local("08:15"), &day, 0, false, UTC);

        assert_eq!(action.kind, NextActionKind::Wait);
        assert_eq!(action.nap_number, Some(1));
        assert_eq!(action.minutes_until_earliest, Some(45));
    }

    #[test]
    fn inside_first_window_recommends_nap() {
        let day = two_nap_day();
        let action = calculate_next_action(local("09:20"), &day, 0, false, UTC);

        assert_eq!(action.kind, NextActionKind::Nap);
        assert_eq!(action.nap_number, Some(1));
        assert!(action.minutes_until_earliest.is_none());
    }

    #[test]
    fn completed_naps_advance_to_the_next() {
        let day = two_nap_day();
        let action = calculate_next_action(local("13:00"), &day, 1, false, UTC);

        assert_eq!(action.nap_number, Some(2));
    }

    #[test]
    fn missed_window_falls_through_to_next_nap() {
        // Past nap 1's latest with zero naps taken: the advisor skips
        // to nap 2 rather than recommending an impossible nap 1.
        let day = two_nap_day();
        let action = calculate_next_action(local("11:00"), &day, 0, false, UTC);

        assert_eq!(action.nap_number, Some(2));
        assert_eq!(action.kind, NextActionKind::Wait);
    }

    #[test]
    fn all_naps_done_points_at_bedtime() {
        let day = two_nap_day();
        let before = calculate_next_action(local("17:00"), &day, 2, false, UTC);
        assert_eq!(before.kind, NextActionKind::Wait);
        assert!(before.nap_number.is_none());
        assert!(before.minutes_until_earliest.is_some());

        let inside =
            calculate_next_action(day.bedtime.window.recommended, &day, 2, false, UTC);
        assert_eq!(inside.kind, NextActionKind::Bedtime);
    }

    #[test]
    fn past_every_window_still_recommends_bedtime() {
        let day = two_nap_day();
        let action = calculate_next_action(local("22:00"), &day, 0, false, UTC);
        assert_eq!(action.kind, NextActionKind::Bedtime);
    }

    #[test]
    fn asleep_child_gets_a_wait() {
        let day = two_nap_day();
        let action = calculate_next_action(local("09:30"), &day, 0, true, UTC);
        assert_eq!(action.kind, NextActionKind::Wait);
        assert_eq!(action.description, "Child is currently sleeping");
        assert!(action.window.is_none());
    }

    #[test]
    fn wake_deadline_fires_only_while_asleep_and_past() {
        let deadline: ClockTime = "08:00".parse().unwrap();

        assert!(check_wake_deadline(local("07:30"), deadline, true, UTC).is_none());
        assert!(check_wake_deadline(local("08:30"), deadline, false, UTC).is_none());

        let action = check_wake_deadline(local("08:30"), deadline, true, UTC)
            .expect("deadline passed while asleep");
        assert_eq!(action.kind, NextActionKind::Wake);
    }
}
