//! Show the day's nap and bedtime windows.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use st_core::{ChildId, ClockTime, format_window};
use st_db::Database;

use super::util::build_day;

pub fn run(
    db: &Database,
    child_id: &ChildId,
    wake: Option<ClockTime>,
    json: bool,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<()> {
    let context = build_day(db, child_id, wake, now, tz)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&context.day).context("failed to encode schedule")?
        );
        return Ok(());
    }

    println!("Schedule for {}", context.day.date);
    if context.assumed_wake {
        println!("(wake time assumed from the schedule; pass --wake HH:mm to correct)");
    }
    for nap in &context.day.naps {
        let taken = if (nap.nap_number as usize) <= context.completed_naps {
            " [done]"
        } else {
            ""
        };
        println!(
            "Nap {}: {} (up to {}m){taken}",
            nap.nap_number,
            format_window(&nap.window, tz),
            nap.max_duration_minutes
        );
        for note in &nap.notes {
            println!("  note: {note}");
        }
    }
    println!("Bedtime: {}", format_window(&context.day.bedtime.window, tz));
    for note in &context.day.bedtime.notes {
        println!("  note: {note}");
    }
    for warning in &context.day.warnings {
        println!("Warning: {warning}");
    }
    Ok(())
}
