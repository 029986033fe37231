//! Shared helpers for subcommand implementations.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use st_core::tz::{instant_on_day, local_date_of};
use st_core::{
    ChildId, ClockTime, DaySchedule, ScheduleTransition, ScheduleType, SessionId, SleepSchedule,
    calculate_day_schedule,
};
use st_db::{Database, DbError};
use uuid::Uuid;

/// Converts a local clock time into a UTC instant on `now`'s local day.
pub fn instant_today(clock: ClockTime, now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    instant_on_day(local_date_of(now, tz), clock, tz)
}

/// Resolves an optional `--at HH:mm` argument to a UTC instant.
pub fn resolve_at(at: Option<ClockTime>, now: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
    at.map(|clock| instant_today(clock, now, tz))
}

/// Start of `now`'s local calendar day, as a UTC instant.
pub fn start_of_local_day(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    instant_on_day(local_date_of(now, tz), ClockTime::hm(0, 0), tz)
}

/// Parses a user-facing schedule preset name (`two-nap` or `two_nap`).
pub fn parse_schedule_name(name: &str) -> Result<ScheduleType> {
    name.replace('-', "_")
        .parse()
        .with_context(|| format!("unknown schedule {name:?}"))
}

/// Looks up the preset for a named schedule type.
pub fn preset_for(schedule_type: ScheduleType) -> Result<SleepSchedule> {
    match SleepSchedule::preset(schedule_type) {
        Some(schedule) => Ok(schedule),
        None => bail!("{schedule_type} has no preset; it is tracked via `st transition`"),
    }
}

/// A fresh random session ID.
pub fn new_session_id() -> SessionId {
    SessionId::new(Uuid::new_v4().to_string()).expect("UUID strings are non-empty")
}

/// Everything the day-level commands need to recommend from.
pub struct DayContext {
    pub day: DaySchedule,
    pub completed_naps: usize,
    /// The morning wake time was taken from the schedule, not observed.
    pub assumed_wake: bool,
}

/// Builds the day schedule for `now`'s local day from stored state.
///
/// The wake time comes from `--wake` when given, otherwise the
/// schedule's latest usual wake time stands in. Today's completed naps
/// anchor the remaining windows.
pub fn build_day(
    db: &Database,
    child_id: &ChildId,
    wake: Option<ClockTime>,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<DayContext> {
    let schedule = db
        .active_schedule(child_id)
        .context("no active schedule; set one with `st schedule use <preset>`")?;

    let (wake_time, assumed_wake) = match wake {
        Some(clock) => (instant_today(clock, now, tz), false),
        None => (instant_today(schedule.wake_latest, now, tz), true),
    };

    let naps = db.completed_naps_since(child_id, start_of_local_day(now, tz))?;
    let durations: Vec<i64> = naps
        .iter()
        .map(|nap| nap.durations.sleep_minutes.unwrap_or(0))
        .collect();
    let end_times: Vec<DateTime<Utc>> = naps.iter().filter_map(|nap| nap.woke_up_at).collect();

    let transition = open_transition(db, child_id)?;

    let day = calculate_day_schedule(
        wake_time,
        &schedule,
        tz,
        transition.as_ref(),
        Some(&durations),
        Some(&end_times),
    );
    Ok(DayContext {
        day,
        completed_naps: naps.len(),
        assumed_wake,
    })
}

/// The child's open transition, or `None` when there is none.
pub fn open_transition(
    db: &Database,
    child_id: &ChildId,
) -> Result<Option<ScheduleTransition>> {
    match db.open_transition(child_id) {
        Ok(transition) => Ok(Some(transition)),
        Err(DbError::NoOpenTransition { .. }) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Formats an optional minute count for table output.
pub fn minutes(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v}m"))
}
