//! Show or switch the active schedule.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use st_core::ChildId;
use st_db::Database;

use super::util::{parse_schedule_name, preset_for};

/// Prints the active schedule's configuration.
pub fn show(db: &Database, child_id: &ChildId) -> Result<()> {
    let schedule = db
        .active_schedule(child_id)
        .context("no active schedule; set one with `st schedule use <preset>`")?;

    println!("Active schedule: {}", schedule.schedule_type);
    for nap in &schedule.naps {
        println!(
            "Nap {}: wake window {}-{}m, start {}-{}, up to {}m, end by {}",
            nap.nap_number,
            nap.wake_window_min,
            nap.wake_window_max,
            nap.earliest_start,
            nap.latest_start,
            nap.max_duration_minutes,
            nap.end_by
        );
    }
    println!(
        "Bedtime: {}-{}, goal {}-{}, wake window {}-{}m",
        schedule.bedtime.earliest,
        schedule.bedtime.latest,
        schedule.bedtime.goal_start,
        schedule.bedtime.goal_end,
        schedule.bedtime.wake_window_min,
        schedule.bedtime.wake_window_max
    );
    println!(
        "Wake {}-{}, must wake by {}, day sleep cap {}m",
        schedule.wake_earliest,
        schedule.wake_latest,
        schedule.must_wake_by,
        schedule.day_sleep_cap_minutes
    );
    Ok(())
}

/// Activates a schedule preset.
pub fn activate(
    db: &mut Database,
    child_id: &ChildId,
    preset: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let schedule_type = parse_schedule_name(preset)?;
    let schedule = preset_for(schedule_type)?;
    db.set_active_schedule(child_id, &schedule, now)
        .context("failed to activate schedule")?;

    println!("Active schedule is now {schedule_type}.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use st_core::ScheduleType;

    fn child() -> ChildId {
        ChildId::new("child-1").unwrap()
    }

    #[test]
    fn activate_then_show() {
        let mut db = Database::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        activate(&mut db, &child(), "three-nap", now).unwrap();
        show(&db, &child()).unwrap();

        let active = db.active_schedule(&child()).unwrap();
        assert_eq!(active.schedule_type, ScheduleType::ThreeNap);
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        assert!(activate(&mut db, &child(), "five-nap", now).is_err());
        assert!(activate(&mut db, &child(), "transition", now).is_err());
    }
}
