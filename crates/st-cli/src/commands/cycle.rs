//! Edit mid-sleep wake cycles on the current or latest session.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use st_core::{ChildId, ClockTime, SleepCycle, SleepSession, WakeType};
use st_db::Database;

use super::util::instant_today;

/// The session cycle edits apply to: the open session if there is one,
/// otherwise the most recent.
fn target_session(db: &Database, child_id: &ChildId) -> Result<SleepSession> {
    if let Some(session) = db.current_session(child_id)? {
        return Ok(session);
    }
    match db.latest_session(child_id)? {
        Some(session) => Ok(session),
        None => bail!("no sessions recorded for child {child_id}"),
    }
}

/// Records a wake cycle.
pub fn add(
    db: &mut Database,
    child_id: &ChildId,
    woke: ClockTime,
    back: Option<ClockTime>,
    wake_type: WakeType,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<()> {
    let session = target_session(db, child_id)?;
    let cycle = SleepCycle {
        woke_up_at: instant_today(woke, now, tz),
        fell_back_asleep_at: back.map(|clock| instant_today(clock, now, tz)),
        wake_type,
    };
    let updated = db
        .add_cycle(&session.id, cycle)
        .context("failed to add cycle")?;

    println!(
        "Cycle added ({wake_type}). Cycles: {}. Sleep: {}",
        updated.cycles.len(),
        super::util::minutes(updated.durations.sleep_minutes)
    );
    Ok(())
}

/// Removes a wake cycle by index.
pub fn remove(db: &mut Database, child_id: &ChildId, index: usize) -> Result<()> {
    let session = target_session(db, child_id)?;
    if index >= session.cycles.len() {
        bail!(
            "cycle index {index} out of range; session has {}",
            session.cycles.len()
        );
    }
    let updated = db
        .remove_cycle(&session.id, index)
        .context("failed to remove cycle")?;

    println!("Cycle removed. Cycles: {}.", updated.cycles.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::UTC;
    use st_core::{SessionId, SleepEvent, SleepType};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn child() -> ChildId {
        ChildId::new("child-1").unwrap()
    }

    fn open_session(db: &mut Database) {
        let mut session = SleepSession::put_down(
            SessionId::new("session-1").unwrap(),
            child(),
            SleepType::Nap,
            Some(1),
            at(9, 0),
        );
        session.apply_event(SleepEvent::FellAsleep, Some(at(9, 10)), at(9, 10)).unwrap();
        session.apply_event(SleepEvent::WokeUp, Some(at(10, 30)), at(10, 30)).unwrap();
        db.insert_session(&session).unwrap();
    }

    #[test]
    fn add_cycle_updates_stored_sleep() {
        let mut db = Database::open_in_memory().unwrap();
        open_session(&mut db);

        add(
            &mut db,
            &child(),
            ClockTime::hm(9, 40),
            Some(ClockTime::hm(9, 50)),
            WakeType::Crying,
            at(11, 0),
            UTC,
        )
        .unwrap();

        let session = db
            .get_session(&SessionId::new("session-1").unwrap())
            .unwrap();
        assert_eq!(session.cycles.len(), 1);
        assert_eq!(session.durations.sleep_minutes, Some(70));
    }

    #[test]
    fn remove_rejects_out_of_range_index() {
        let mut db = Database::open_in_memory().unwrap();
        open_session(&mut db);
        let err = remove(&mut db, &child(), 0).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn cycle_edits_need_a_session() {
        let mut db = Database::open_in_memory().unwrap();
        let err = add(
            &mut db,
            &child(),
            ClockTime::hm(9, 40),
            None,
            WakeType::Quiet,
            at(11, 0),
            UTC,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no sessions"));
    }
}
