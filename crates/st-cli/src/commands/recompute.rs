//! Re-derive duration fields for every stored session.

use anyhow::{Context, Result};
use st_db::Database;

pub fn run(db: &mut Database) -> Result<()> {
    let updated = db
        .recompute_all_durations()
        .context("failed to recompute durations")?;

    if updated == 0 {
        println!("No sessions to recompute.");
    } else {
        println!("Recomputed durations for {updated} session(s).");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use st_core::{ChildId, NapLocation, SessionId, SleepSession};

    #[test]
    fn recompute_runs_on_empty_and_populated_databases() {
        let mut db = Database::open_in_memory().unwrap();
        run(&mut db).unwrap();

        let session = SleepSession::ad_hoc_completed(
            SessionId::new("session-1").unwrap(),
            ChildId::new("child-1").unwrap(),
            NapLocation::Crib,
            Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap(),
        )
        .unwrap();
        db.insert_session(&session).unwrap();
        run(&mut db).unwrap();
    }
}
