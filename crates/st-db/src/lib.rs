//! Storage layer for the sleep tracker.
//!
//! Provides persistence for sleep sessions, wake cycles, schedules,
//! and nap-count transitions using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in ISO 8601 format (e.g., `2024-01-15T10:30:00Z`).
//! This format is used by `chrono::DateTime<Utc>` serialization and ensures:
//! - Lexicographic ordering matches chronological ordering
//! - Human-readable values in the database
//! - Timezone-aware (always UTC)
//!
//! ## Derived Columns
//!
//! The duration columns on `sessions` are a pure function of the
//! session's timestamps and cycles. They are rewritten on every
//! persist and can be rebuilt wholesale with
//! [`Database::recompute_all_durations`]; never edit them directly.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;
use uuid::Uuid;

use st_core::{
    ChildId, ClockTime, NapLocation, ScheduleTransition, ScheduleType, SessionId, SessionState,
    SleepCycle, SleepEvent, SleepSchedule, SleepSession, SleepType, StateError, WakeType,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A session mutation was rejected by the state machine.
    #[error(transparent)]
    State(#[from] StateError),
    /// No session with the given ID exists.
    #[error("session not found: {id}")]
    SessionNotFound { id: String },
    /// No open (non-completed) session for the child.
    #[error("no current session for child {child_id}")]
    NoCurrentSession { child_id: String },
    /// No schedule is marked active for the child.
    #[error("no active schedule for child {child_id}")]
    NoActiveSchedule { child_id: String },
    /// No open transition exists for the child.
    #[error("no open transition for child {child_id}")]
    NoOpenTransition { child_id: String },
    /// An open transition already exists; complete it first.
    #[error("an open transition already exists for child {child_id}")]
    OpenTransitionExists { child_id: String },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for row {row_id}: {timestamp}")]
    TimestampParse {
        row_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored value failed validation on the way back out.
    #[error("invalid stored value for row {row_id}: {message}")]
    InvalidValue { row_id: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            -- Sessions table: one row per sleep attempt
            -- timestamps: ISO 8601 format (e.g., '2024-01-15T10:30:00Z')
            -- duration columns: derived, rewritten on every persist
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                child_id TEXT NOT NULL,
                sleep_type TEXT NOT NULL,
                state TEXT NOT NULL,
                nap_number INTEGER,
                is_ad_hoc INTEGER NOT NULL DEFAULT 0,
                location TEXT NOT NULL DEFAULT 'crib',
                put_down_at TEXT,
                asleep_at TEXT,
                woke_up_at TEXT,
                out_of_crib_at TEXT,
                crying_minutes INTEGER,
                notes TEXT,
                total_minutes INTEGER,
                sleep_minutes INTEGER,
                settling_minutes INTEGER,
                post_wake_minutes INTEGER,
                awake_crib_minutes INTEGER,
                qualified_rest_minutes INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_child ON sessions(child_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_state ON sessions(state);
            CREATE INDEX IF NOT EXISTS idx_sessions_woke ON sessions(woke_up_at);

            CREATE TABLE IF NOT EXISTS cycles (
                session_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                woke_up_at TEXT NOT NULL,
                fell_back_asleep_at TEXT,
                wake_type TEXT NOT NULL,
                PRIMARY KEY (session_id, position),
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );

            -- Schedules: config stored as a JSON payload, one active
            -- row per child enforced by set_active_schedule
            CREATE TABLE IF NOT EXISTS schedules (
                id TEXT PRIMARY KEY,
                child_id TEXT NOT NULL,
                schedule_type TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 0,
                config TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_schedules_child ON schedules(child_id, active);

            CREATE TABLE IF NOT EXISTS transitions (
                id TEXT PRIMARY KEY,
                child_id TEXT NOT NULL,
                from_type TEXT NOT NULL,
                to_type TEXT NOT NULL,
                started_at TEXT NOT NULL,
                target_weeks INTEGER NOT NULL,
                current_nap_time TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                completed_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_transitions_child ON transitions(child_id, completed_at);
            ",
        )?;
        Ok(())
    }

    /// Inserts a session and its cycles.
    pub fn insert_session(&mut self, session: &SleepSession) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        write_session(&tx, session)?;
        tx.commit()?;
        tracing::debug!(session = %session.id, "session inserted");
        Ok(())
    }

    /// Rewrites a session row and its cycles.
    pub fn update_session(&mut self, session: &SleepSession) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        let existing: Option<String> = tx
            .query_row(
                "SELECT id FROM sessions WHERE id = ?",
                [session.id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_none() {
            return Err(DbError::SessionNotFound {
                id: session.id.to_string(),
            });
        }
        write_session(&tx, session)?;
        tx.commit()?;
        Ok(())
    }

    /// Loads a session by ID, cycles included.
    pub fn get_session(&self, id: &SessionId) -> Result<SleepSession, DbError> {
        let session = self
            .conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?"),
                [id.as_str()],
                row_to_session,
            )
            .optional()?
            .ok_or_else(|| DbError::SessionNotFound { id: id.to_string() })?;
        self.hydrate(session?)
    }

    /// Deletes a session; cycles go with it via the foreign key.
    pub fn delete_session(&mut self, id: &SessionId) -> Result<(), DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?", [id.as_str()])?;
        if deleted == 0 {
            return Err(DbError::SessionNotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// The child's latest non-completed session, if any.
    pub fn current_session(&self, child_id: &ChildId) -> Result<Option<SleepSession>, DbError> {
        let session = self
            .conn
            .query_row(
                &format!(
                    "
                    SELECT {SESSION_COLUMNS} FROM sessions
                    WHERE child_id = ? AND state != 'completed'
                    ORDER BY COALESCE(put_down_at, asleep_at) DESC, id DESC
                    LIMIT 1
                    "
                ),
                [child_id.as_str()],
                row_to_session,
            )
            .optional()?;
        match session {
            Some(session) => Ok(Some(self.hydrate(session?)?)),
            None => Ok(None),
        }
    }

    /// The child's most recent session of any state, if any.
    pub fn latest_session(&self, child_id: &ChildId) -> Result<Option<SleepSession>, DbError> {
        let session = self
            .conn
            .query_row(
                &format!(
                    "
                    SELECT {SESSION_COLUMNS} FROM sessions
                    WHERE child_id = ?
                    ORDER BY COALESCE(put_down_at, asleep_at) DESC, id DESC
                    LIMIT 1
                    "
                ),
                [child_id.as_str()],
                row_to_session,
            )
            .optional()?;
        match session {
            Some(session) => Ok(Some(self.hydrate(session?)?)),
            None => Ok(None),
        }
    }

    /// Applies a state-machine event to the child's current session
    /// and persists the result, one transaction per event.
    pub fn apply_event(
        &mut self,
        child_id: &ChildId,
        event: SleepEvent,
        at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<SleepSession, DbError> {
        let mut session =
            self.current_session(child_id)?
                .ok_or_else(|| DbError::NoCurrentSession {
                    child_id: child_id.to_string(),
                })?;
        session.apply_event(event, at, now)?;
        let tx = self.conn.transaction()?;
        write_session(&tx, &session)?;
        tx.commit()?;
        Ok(session)
    }

    /// Adds a wake cycle to a session, re-deriving its durations.
    pub fn add_cycle(&mut self, id: &SessionId, cycle: SleepCycle) -> Result<SleepSession, DbError> {
        let mut session = self.get_session(id)?;
        session.add_cycle(cycle)?;
        let tx = self.conn.transaction()?;
        write_session(&tx, &session)?;
        tx.commit()?;
        Ok(session)
    }

    /// Removes a wake cycle by index, re-deriving durations.
    pub fn remove_cycle(&mut self, id: &SessionId, index: usize) -> Result<SleepSession, DbError> {
        let mut session = self.get_session(id)?;
        session.remove_cycle(index);
        let tx = self.conn.transaction()?;
        write_session(&tx, &session)?;
        tx.commit()?;
        Ok(session)
    }

    /// Makes `schedule` the child's active schedule, deactivating any
    /// previous one in the same transaction.
    pub fn set_active_schedule(
        &mut self,
        child_id: &ChildId,
        schedule: &SleepSchedule,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let config = serde_json::to_string(schedule).map_err(|err| DbError::InvalidValue {
            row_id: child_id.to_string(),
            message: err.to_string(),
        })?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE schedules SET active = 0 WHERE child_id = ?",
            [child_id.as_str()],
        )?;
        tx.execute(
            "
            INSERT INTO schedules (id, child_id, schedule_type, active, config, created_at)
            VALUES (?, ?, ?, 1, ?, ?)
            ",
            params![
                new_row_id(),
                child_id.as_str(),
                schedule.schedule_type.as_str(),
                config,
                format_timestamp(now),
            ],
        )?;
        tx.commit()?;
        tracing::debug!(child = %child_id, schedule = %schedule.schedule_type, "active schedule set");
        Ok(())
    }

    /// The child's active schedule.
    pub fn active_schedule(&self, child_id: &ChildId) -> Result<SleepSchedule, DbError> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT id, config FROM schedules WHERE child_id = ? AND active = 1",
                [child_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (row_id, config) = row.ok_or_else(|| DbError::NoActiveSchedule {
            child_id: child_id.to_string(),
        })?;
        serde_json::from_str(&config).map_err(|err| DbError::InvalidValue {
            row_id,
            message: err.to_string(),
        })
    }

    /// Starts a nap-count transition. At most one may be open per child.
    pub fn start_transition(&mut self, transition: &ScheduleTransition) -> Result<(), DbError> {
        let open: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM transitions WHERE child_id = ? AND completed_at IS NULL",
                [transition.child_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if open.is_some() {
            return Err(DbError::OpenTransitionExists {
                child_id: transition.child_id.to_string(),
            });
        }
        self.conn.execute(
            "
            INSERT INTO transitions
            (id, child_id, from_type, to_type, started_at, target_weeks, current_nap_time, updated_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL)
            ",
            params![
                new_row_id(),
                transition.child_id.as_str(),
                transition.from_type.as_str(),
                transition.to_type.as_str(),
                format_timestamp(transition.started_at),
                transition.target_weeks,
                transition.current_nap_time.to_string(),
                format_timestamp(transition.updated_at),
            ],
        )?;
        Ok(())
    }

    /// The child's open transition.
    pub fn open_transition(&self, child_id: &ChildId) -> Result<ScheduleTransition, DbError> {
        self.conn
            .query_row(
                "
                SELECT id, child_id, from_type, to_type, started_at, target_weeks,
                       current_nap_time, updated_at, completed_at
                FROM transitions
                WHERE child_id = ? AND completed_at IS NULL
                ",
                [child_id.as_str()],
                row_to_transition,
            )
            .optional()?
            .ok_or_else(|| DbError::NoOpenTransition {
                child_id: child_id.to_string(),
            })?
    }

    /// Rewrites the child's open transition row.
    pub fn update_transition(&mut self, transition: &ScheduleTransition) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "
            UPDATE transitions
            SET current_nap_time = ?, updated_at = ?, completed_at = ?
            WHERE child_id = ? AND completed_at IS NULL
            ",
            params![
                transition.current_nap_time.to_string(),
                format_timestamp(transition.updated_at),
                transition.completed_at.map(format_timestamp),
                transition.child_id.as_str(),
            ],
        )?;
        if updated == 0 {
            return Err(DbError::NoOpenTransition {
                child_id: transition.child_id.to_string(),
            });
        }
        Ok(())
    }

    /// Marks the child's open transition completed.
    pub fn complete_transition(
        &mut self,
        child_id: &ChildId,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "
            UPDATE transitions
            SET completed_at = ?, updated_at = ?
            WHERE child_id = ? AND completed_at IS NULL
            ",
            params![
                format_timestamp(now),
                format_timestamp(now),
                child_id.as_str(),
            ],
        )?;
        if updated == 0 {
            return Err(DbError::NoOpenTransition {
                child_id: child_id.to_string(),
            });
        }
        Ok(())
    }

    /// Completed naps for the child that ended at or after `cutoff`,
    /// oldest first. Feeds the nap-push readiness check.
    pub fn completed_naps_since(
        &self,
        child_id: &ChildId,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<SleepSession>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {SESSION_COLUMNS} FROM sessions
            WHERE child_id = ? AND state = 'completed' AND sleep_type = 'nap'
              AND woke_up_at IS NOT NULL AND woke_up_at >= ?
            ORDER BY woke_up_at ASC
            "
        ))?;
        let rows = stmt.query_map(
            params![child_id.as_str(), format_timestamp(cutoff)],
            row_to_session,
        )?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(self.hydrate(row??)?);
        }
        Ok(sessions)
    }

    /// Re-derives the duration columns for every session from its
    /// stored timestamps and cycles. Returns the number updated.
    pub fn recompute_all_durations(&mut self) -> Result<usize, DbError> {
        let ids: Vec<String> = {
            let mut stmt = self.conn.prepare("SELECT id FROM sessions ORDER BY id ASC")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(row?);
            }
            ids
        };

        let mut updated = 0;
        for raw_id in ids {
            let id = SessionId::new(raw_id.clone()).map_err(|err| DbError::InvalidValue {
                row_id: raw_id,
                message: err.to_string(),
            })?;
            let mut session = self.get_session(&id)?;
            session.refresh_durations();
            let tx = self.conn.transaction()?;
            write_session(&tx, &session)?;
            tx.commit()?;
            updated += 1;
        }
        tracing::debug!(updated, "durations recomputed");
        Ok(updated)
    }

    /// Attaches cycles and re-derives durations on a freshly loaded row.
    fn hydrate(&self, mut session: SleepSession) -> Result<SleepSession, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT woke_up_at, fell_back_asleep_at, wake_type
            FROM cycles
            WHERE session_id = ?
            ORDER BY position ASC
            ",
        )?;
        let rows = stmt.query_map([session.id.as_str()], |row| {
            let woke: String = row.get(0)?;
            let back: Option<String> = row.get(1)?;
            let wake_type: String = row.get(2)?;
            Ok((woke, back, wake_type))
        })?;
        let mut cycles = Vec::new();
        for row in rows {
            let (woke, back, wake_type) = row?;
            cycles.push(SleepCycle {
                woke_up_at: parse_timestamp(&woke, session.id.as_str())?,
                fell_back_asleep_at: back
                    .map(|value| parse_timestamp(&value, session.id.as_str()))
                    .transpose()?,
                wake_type: parse_enum::<WakeType>(&wake_type, session.id.as_str())?,
            });
        }
        session.cycles = cycles;
        session.refresh_durations();
        Ok(session)
    }
}

const SESSION_COLUMNS: &str = "id, child_id, sleep_type, state, nap_number, is_ad_hoc, location, \
     put_down_at, asleep_at, woke_up_at, out_of_crib_at, crying_minutes, notes";

/// Upserts a session row and rewrites its cycle list.
fn write_session(conn: &Connection, session: &SleepSession) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO sessions
        (id, child_id, sleep_type, state, nap_number, is_ad_hoc, location,
         put_down_at, asleep_at, woke_up_at, out_of_crib_at, crying_minutes, notes,
         total_minutes, sleep_minutes, settling_minutes, post_wake_minutes,
         awake_crib_minutes, qualified_rest_minutes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            child_id = excluded.child_id,
            sleep_type = excluded.sleep_type,
            state = excluded.state,
            nap_number = excluded.nap_number,
            is_ad_hoc = excluded.is_ad_hoc,
            location = excluded.location,
            put_down_at = excluded.put_down_at,
            asleep_at = excluded.asleep_at,
            woke_up_at = excluded.woke_up_at,
            out_of_crib_at = excluded.out_of_crib_at,
            crying_minutes = excluded.crying_minutes,
            notes = excluded.notes,
            total_minutes = excluded.total_minutes,
            sleep_minutes = excluded.sleep_minutes,
            settling_minutes = excluded.settling_minutes,
            post_wake_minutes = excluded.post_wake_minutes,
            awake_crib_minutes = excluded.awake_crib_minutes,
            qualified_rest_minutes = excluded.qualified_rest_minutes
        ",
        params![
            session.id.as_str(),
            session.child_id.as_str(),
            session.sleep_type.as_str(),
            session.state.as_str(),
            session.nap_number,
            session.is_ad_hoc,
            session.location.as_str(),
            session.put_down_at.map(format_timestamp),
            session.asleep_at.map(format_timestamp),
            session.woke_up_at.map(format_timestamp),
            session.out_of_crib_at.map(format_timestamp),
            session.crying_minutes,
            session.notes,
            session.durations.total_minutes,
            session.durations.sleep_minutes,
            session.durations.settling_minutes,
            session.durations.post_wake_minutes,
            session.durations.awake_crib_minutes,
            session.durations.qualified_rest_minutes,
        ],
    )?;

    conn.execute(
        "DELETE FROM cycles WHERE session_id = ?",
        [session.id.as_str()],
    )?;
    let mut stmt = conn.prepare(
        "
        INSERT INTO cycles (session_id, position, woke_up_at, fell_back_asleep_at, wake_type)
        VALUES (?, ?, ?, ?, ?)
        ",
    )?;
    for (position, cycle) in session.cycles.iter().enumerate() {
        stmt.execute(params![
            session.id.as_str(),
            position as i64,
            format_timestamp(cycle.woke_up_at),
            cycle.fell_back_asleep_at.map(format_timestamp),
            cycle.wake_type.as_str(),
        ])?;
    }
    Ok(())
}

/// Maps a session row to a cycle-less session. The caller attaches
/// cycles and re-derives durations via [`Database::hydrate`].
fn row_to_session(row: &Row<'_>) -> rusqlite::Result<Result<SleepSession, DbError>> {
    let id: String = row.get(0)?;
    let child_id: String = row.get(1)?;
    let sleep_type: String = row.get(2)?;
    let state: String = row.get(3)?;
    let nap_number: Option<u32> = row.get(4)?;
    let is_ad_hoc: bool = row.get(5)?;
    let location: String = row.get(6)?;
    let put_down_at: Option<String> = row.get(7)?;
    let asleep_at: Option<String> = row.get(8)?;
    let woke_up_at: Option<String> = row.get(9)?;
    let out_of_crib_at: Option<String> = row.get(10)?;
    let crying_minutes: Option<i64> = row.get(11)?;
    let notes: Option<String> = row.get(12)?;

    Ok(build_session(
        id,
        child_id,
        sleep_type,
        state,
        nap_number,
        is_ad_hoc,
        location,
        put_down_at,
        asleep_at,
        woke_up_at,
        out_of_crib_at,
        crying_minutes,
        notes,
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_session(
    id: String,
    child_id: String,
    sleep_type: String,
    state: String,
    nap_number: Option<u32>,
    is_ad_hoc: bool,
    location: String,
    put_down_at: Option<String>,
    asleep_at: Option<String>,
    woke_up_at: Option<String>,
    out_of_crib_at: Option<String>,
    crying_minutes: Option<i64>,
    notes: Option<String>,
) -> Result<SleepSession, DbError> {
    let row_id = id.clone();
    let parse = |value: Option<String>| {
        value
            .map(|timestamp| parse_timestamp(&timestamp, &row_id))
            .transpose()
    };
    Ok(SleepSession {
        id: SessionId::new(id.clone()).map_err(|err| DbError::InvalidValue {
            row_id: id.clone(),
            message: err.to_string(),
        })?,
        child_id: ChildId::new(child_id).map_err(|err| DbError::InvalidValue {
            row_id: id.clone(),
            message: err.to_string(),
        })?,
        sleep_type: parse_enum::<SleepType>(&sleep_type, &id)?,
        state: parse_enum::<SessionState>(&state, &id)?,
        nap_number,
        is_ad_hoc,
        location: parse_enum::<NapLocation>(&location, &id)?,
        put_down_at: parse(put_down_at)?,
        asleep_at: parse(asleep_at)?,
        woke_up_at: parse(woke_up_at)?,
        out_of_crib_at: parse(out_of_crib_at)?,
        crying_minutes,
        notes,
        cycles: Vec::new(),
        durations: st_core::Durations::default(),
    })
}

fn row_to_transition(row: &Row<'_>) -> rusqlite::Result<Result<ScheduleTransition, DbError>> {
    let id: String = row.get(0)?;
    let child_id: String = row.get(1)?;
    let from_type: String = row.get(2)?;
    let to_type: String = row.get(3)?;
    let started_at: String = row.get(4)?;
    let target_weeks: u32 = row.get(5)?;
    let current_nap_time: String = row.get(6)?;
    let updated_at: String = row.get(7)?;
    let completed_at: Option<String> = row.get(8)?;

    Ok(build_transition(
        id,
        child_id,
        from_type,
        to_type,
        started_at,
        target_weeks,
        current_nap_time,
        updated_at,
        completed_at,
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_transition(
    id: String,
    child_id: String,
    from_type: String,
    to_type: String,
    started_at: String,
    target_weeks: u32,
    current_nap_time: String,
    updated_at: String,
    completed_at: Option<String>,
) -> Result<ScheduleTransition, DbError> {
    Ok(ScheduleTransition {
        child_id: ChildId::new(child_id).map_err(|err| DbError::InvalidValue {
            row_id: id.clone(),
            message: err.to_string(),
        })?,
        from_type: parse_enum::<ScheduleType>(&from_type, &id)?,
        to_type: parse_enum::<ScheduleType>(&to_type, &id)?,
        started_at: parse_timestamp(&started_at, &id)?,
        target_weeks,
        current_nap_time: current_nap_time
            .parse::<ClockTime>()
            .map_err(|err| DbError::InvalidValue {
                row_id: id.clone(),
                message: err.to_string(),
            })?,
        updated_at: parse_timestamp(&updated_at, &id)?,
        completed_at: completed_at
            .map(|value| parse_timestamp(&value, &id))
            .transpose()?,
    })
}

fn parse_enum<T: std::str::FromStr>(value: &str, row_id: &str) -> Result<T, DbError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|err: T::Err| DbError::InvalidValue {
        row_id: row_id.to_string(),
        message: err.to_string(),
    })
}

fn parse_timestamp(timestamp: &str, row_id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            row_id: row_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn new_row_id() -> String {
    Uuid::new_v4().to_string()
}
