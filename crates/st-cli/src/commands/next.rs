//! Show the single next recommended action.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use st_core::{
    ChildId, SleepSession, SleepType, calculate_next_action, check_wake_deadline, format_window,
};
use st_db::Database;

use super::util::build_day;

pub fn run(
    db: &Database,
    child_id: &ChildId,
    json: bool,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<()> {
    let current = db.current_session(child_id)?;
    let is_asleep = current.as_ref().is_some_and(SleepSession::is_asleep);
    // The deadline is a morning rule; naps are bounded by their own caps.
    let overnight_asleep = is_asleep
        && current
            .as_ref()
            .is_some_and(|session| session.sleep_type == SleepType::NightSleep);
    let context = build_day(db, child_id, None, now, tz)?;

    // The must-wake-by deadline outranks everything else.
    let schedule = db.active_schedule(child_id)?;
    let action = check_wake_deadline(now, schedule.must_wake_by, overnight_asleep, tz)
        .unwrap_or_else(|| {
            calculate_next_action(now, &context.day, context.completed_naps, is_asleep, tz)
        });

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&action).context("failed to encode action")?
        );
        return Ok(());
    }

    println!("Next: {}", action.description);
    if let Some(window) = &action.window {
        println!("Window: {}", format_window(window, tz));
    }
    if let Some(minutes) = action.minutes_until_earliest {
        println!("Opens in {minutes}m");
    }
    for note in &action.notes {
        println!("  note: {note}");
    }
    Ok(())
}
