//! Status command for showing the current session and derived durations.

use std::io::Write;

use anyhow::Result;
use chrono_tz::Tz;
use st_core::tz::format_clock;
use st_core::{ChildId, SleepSession};
use st_db::Database;

use super::util::minutes;

pub fn run<W: Write>(writer: &mut W, db: &Database, child_id: &ChildId, tz: Tz) -> Result<()> {
    writeln!(writer, "Sleep tracker status for {child_id}")?;

    let session = match db.current_session(child_id)? {
        Some(session) => session,
        None => match db.latest_session(child_id)? {
            Some(session) => {
                writeln!(writer, "No open session; showing the most recent.")?;
                session
            }
            None => {
                writeln!(writer, "No sessions recorded.")?;
                return Ok(());
            }
        },
    };

    writeln!(writer, "Session {} ({})", session.id, session.sleep_type)?;
    writeln!(writer, "State: {}", session.display_state())?;
    if session.is_ad_hoc {
        writeln!(writer, "Location: {}", session.location)?;
    }
    for (label, timestamp) in [
        ("Put down", session.put_down_at),
        ("Fell asleep", session.asleep_at),
        ("Woke up", session.woke_up_at),
        ("Out of crib", session.out_of_crib_at),
    ] {
        if let Some(timestamp) = timestamp {
            writeln!(writer, "{label}: {}", format_clock(timestamp, tz))?;
        }
    }
    write_durations(writer, &session)?;
    if !session.cycles.is_empty() {
        writeln!(writer, "Wake cycles: {}", session.cycles.len())?;
    }
    Ok(())
}

fn write_durations<W: Write>(writer: &mut W, session: &SleepSession) -> Result<()> {
    let d = &session.durations;
    writeln!(writer, "Total: {}", minutes(d.total_minutes))?;
    writeln!(writer, "Sleep: {}", minutes(d.sleep_minutes))?;
    writeln!(writer, "Settling: {}", minutes(d.settling_minutes))?;
    writeln!(writer, "Post-wake: {}", minutes(d.post_wake_minutes))?;
    writeln!(writer, "Qualified rest: {}", minutes(d.qualified_rest_minutes))?;
    Ok(())
}
