//! Log sleep events against the current session.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use st_core::tz::format_clock;
use st_core::{ChildId, ClockTime, NapLocation, SleepEvent, SleepSession, SleepType};
use st_db::Database;

use super::util::{instant_today, new_session_id, resolve_at};

/// Starts a new session from a put-down event.
pub fn put_down(
    db: &mut Database,
    child_id: &ChildId,
    at: Option<ClockTime>,
    nap_number: Option<u32>,
    night: bool,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<()> {
    if let Some(open) = db.current_session(child_id)? {
        bail!(
            "session {} is still open ({}); finish it before starting another",
            open.id,
            open.display_state()
        );
    }

    let sleep_type = if night {
        SleepType::NightSleep
    } else {
        SleepType::Nap
    };
    let put_down_at = resolve_at(at, now, tz).unwrap_or(now);
    let session = SleepSession::put_down(
        new_session_id(),
        child_id.clone(),
        sleep_type,
        nap_number,
        put_down_at,
    );
    db.insert_session(&session)
        .context("failed to store session")?;

    println!(
        "Put down at {} ({sleep_type}). State: {}",
        format_clock(put_down_at, tz),
        session.display_state()
    );
    Ok(())
}

/// Applies a state-machine event to the current session.
pub fn event(
    db: &mut Database,
    child_id: &ChildId,
    event: SleepEvent,
    at: Option<ClockTime>,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<()> {
    let at = resolve_at(at, now, tz);
    let session = db
        .apply_event(child_id, event, at, now)
        .with_context(|| format!("failed to log {event}"))?;

    println!("Logged {event}. State: {}", session.display_state());
    if let Some(sleep) = session.durations.sleep_minutes {
        println!("Sleep so far: {sleep}m");
    }
    Ok(())
}

/// Logs an out-of-crib nap directly, bypassing the crib state machine.
pub fn adhoc(
    db: &mut Database,
    child_id: &ChildId,
    location: NapLocation,
    asleep: ClockTime,
    woke: Option<ClockTime>,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<()> {
    let asleep_at = instant_today(asleep, now, tz);
    let session = match woke {
        Some(woke) => SleepSession::ad_hoc_completed(
            new_session_id(),
            child_id.clone(),
            location,
            asleep_at,
            instant_today(woke, now, tz),
        )
        .context("invalid ad-hoc nap times")?,
        None => SleepSession::ad_hoc_asleep(new_session_id(), child_id.clone(), location, asleep_at),
    };
    db.insert_session(&session)
        .context("failed to store session")?;

    println!(
        "Ad-hoc nap in {} logged. State: {}",
        location,
        session.display_state()
    );
    if let Some(sleep) = session.durations.sleep_minutes {
        println!("Sleep: {sleep}m");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::UTC;
    use st_core::SessionState;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn child() -> ChildId {
        ChildId::new("child-1").unwrap()
    }

    #[test]
    fn put_down_then_events_complete_a_session() {
        let mut db = Database::open_in_memory().unwrap();
        put_down(&mut db, &child(), Some(ClockTime::hm(9, 0)), Some(1), false, at(9, 0), UTC)
            .unwrap();
        event(&mut db, &child(), SleepEvent::FellAsleep, None, at(9, 15), UTC).unwrap();
        event(&mut db, &child(), SleepEvent::WokeUp, None, at(10, 30), UTC).unwrap();
        event(&mut db, &child(), SleepEvent::OutOfCrib, None, at(10, 40), UTC).unwrap();

        let latest = db.latest_session(&child()).unwrap().unwrap();
        assert_eq!(latest.state, SessionState::Completed);
        assert_eq!(latest.durations.sleep_minutes, Some(75));
    }

    #[test]
    fn put_down_refuses_while_a_session_is_open() {
        let mut db = Database::open_in_memory().unwrap();
        put_down(&mut db, &child(), None, Some(1), false, at(9, 0), UTC).unwrap();
        let err = put_down(&mut db, &child(), None, Some(2), false, at(9, 5), UTC).unwrap_err();
        assert!(err.to_string().contains("still open"));
    }

    #[test]
    fn adhoc_with_both_endpoints_is_completed() {
        let mut db = Database::open_in_memory().unwrap();
        adhoc(
            &mut db,
            &child(),
            NapLocation::Car,
            ClockTime::hm(13, 0),
            Some(ClockTime::hm(13, 45)),
            at(14, 0),
            UTC,
        )
        .unwrap();

        let latest = db.latest_session(&child()).unwrap().unwrap();
        assert_eq!(latest.state, SessionState::Completed);
        assert!(latest.is_ad_hoc);
        assert_eq!(latest.durations.sleep_minutes, Some(45));
    }
}
