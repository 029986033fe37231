//! Sleep session record and the event state machine that mutates it.
//!
//! A session moves strictly forward: pending -> asleep -> awake ->
//! completed, one event per edge. Anything else is rejected without
//! touching the session. Every mutation that supplies timing data ends
//! by re-deriving the duration fields from the full timestamp set, so
//! the derived values are always a pure function of the inputs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::durations::{Durations, SleepCycle, compute_durations, validate_cycles};
use crate::types::{
    ChildId, NapLocation, SessionId, SessionState, SleepType, ValidationError,
};

/// An event that advances the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepEvent {
    FellAsleep,
    WokeUp,
    OutOfCrib,
}

impl SleepEvent {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FellAsleep => "fell_asleep",
            Self::WokeUp => "woke_up",
            Self::OutOfCrib => "out_of_crib",
        }
    }
}

impl fmt::Display for SleepEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SleepEvent {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fell_asleep" => Ok(Self::FellAsleep),
            "woke_up" => Ok(Self::WokeUp),
            "out_of_crib" => Ok(Self::OutOfCrib),
            _ => Err(ValidationError::InvalidEnumValue {
                kind: "sleep event",
                value: s.to_string(),
            }),
        }
    }
}

/// A timestamp field that can be edited directly as a correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    PutDown,
    Asleep,
    WokeUp,
    OutOfCrib,
}

/// Errors from session mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The requested event is not legal from the current state.
    #[error("cannot apply {event} while {from}")]
    InvalidStateTransition {
        from: SessionState,
        event: SleepEvent,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// One sleep attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSession {
    pub id: SessionId,
    pub child_id: ChildId,
    pub sleep_type: SleepType,
    pub state: SessionState,
    /// Position in the day's nap sequence, 1-based.
    pub nap_number: Option<u32>,
    /// Out-of-crib nap logged with a location tag.
    pub is_ad_hoc: bool,
    pub location: NapLocation,
    pub put_down_at: Option<DateTime<Utc>>,
    pub asleep_at: Option<DateTime<Utc>>,
    pub woke_up_at: Option<DateTime<Utc>>,
    pub out_of_crib_at: Option<DateTime<Utc>>,
    pub crying_minutes: Option<i64>,
    pub notes: Option<String>,
    pub cycles: Vec<SleepCycle>,
    /// Derived; only ever written by [`compute_durations`].
    pub durations: Durations,
}

impl SleepSession {
    /// Creates a new session from a put-down event.
    #[must_use]
    pub fn put_down(
        id: SessionId,
        child_id: ChildId,
        sleep_type: SleepType,
        nap_number: Option<u32>,
        put_down_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            child_id,
            sleep_type,
            state: SessionState::Pending,
            nap_number,
            is_ad_hoc: false,
            location: NapLocation::Crib,
            put_down_at: Some(put_down_at),
            asleep_at: None,
            woke_up_at: None,
            out_of_crib_at: None,
            crying_minutes: None,
            notes: None,
            cycles: Vec::new(),
            durations: Durations::default(),
        }
    }

    /// Creates an ad-hoc session that starts directly in the asleep
    /// state, with only the asleep time known.
    #[must_use]
    pub fn ad_hoc_asleep(
        id: SessionId,
        child_id: ChildId,
        location: NapLocation,
        asleep_at: DateTime<Utc>,
    ) -> Self {
        let mut session = Self {
            id,
            child_id,
            sleep_type: SleepType::Nap,
            state: SessionState::Asleep,
            nap_number: None,
            is_ad_hoc: true,
            location,
            put_down_at: None,
            asleep_at: Some(asleep_at),
            woke_up_at: None,
            out_of_crib_at: None,
            crying_minutes: None,
            notes: None,
            cycles: Vec::new(),
            durations: Durations::default(),
        };
        session.refresh_durations();
        session
    }

    /// Creates an ad-hoc session logged after the fact, already
    /// completed with both endpoints known.
    pub fn ad_hoc_completed(
        id: SessionId,
        child_id: ChildId,
        location: NapLocation,
        asleep_at: DateTime<Utc>,
        woke_up_at: DateTime<Utc>,
    ) -> Result<Self, StateError> {
        if woke_up_at < asleep_at {
            return Err(ValidationError::TimestampOrder {
                earlier: "asleep_at",
                later: "woke_up_at",
            }
            .into());
        }
        let mut session = Self::ad_hoc_asleep(id, child_id, location, asleep_at);
        session.woke_up_at = Some(woke_up_at);
        session.state = SessionState::Completed;
        session.refresh_durations();
        Ok(session)
    }

    /// Applies a state-machine event.
    ///
    /// The event timestamp may be supplied explicitly; otherwise `now`
    /// is used. Rejected events leave the session unchanged.
    pub fn apply_event(
        &mut self,
        event: SleepEvent,
        at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), StateError> {
        let next = match (self.state, event) {
            (SessionState::Pending, SleepEvent::FellAsleep) => SessionState::Asleep,
            (SessionState::Asleep, SleepEvent::WokeUp) => SessionState::Awake,
            (SessionState::Awake, SleepEvent::OutOfCrib) => SessionState::Completed,
            (from, event) => {
                return Err(StateError::InvalidStateTransition { from, event });
            }
        };

        let timestamp = at.unwrap_or(now);
        let field = match event {
            SleepEvent::FellAsleep => TimestampField::Asleep,
            SleepEvent::WokeUp => TimestampField::WokeUp,
            SleepEvent::OutOfCrib => TimestampField::OutOfCrib,
        };
        self.check_ordering_with(field, Some(timestamp))?;

        self.write_timestamp(field, Some(timestamp));
        self.state = next;
        self.refresh_durations();
        tracing::debug!(session = %self.id, %event, state = %self.state, "session advanced");
        Ok(())
    }

    /// Edits a timestamp directly, without a state change.
    ///
    /// Permitted regardless of state; used for after-the-fact
    /// corrections. Re-derives all duration fields.
    pub fn correct_timestamp(
        &mut self,
        field: TimestampField,
        value: Option<DateTime<Utc>>,
    ) -> Result<(), StateError> {
        self.check_ordering_with(field, value)?;
        self.write_timestamp(field, value);
        self.refresh_durations();
        Ok(())
    }

    /// Records observed crying minutes. Rejects negative values.
    pub fn set_crying_minutes(&mut self, minutes: Option<i64>) -> Result<(), ValidationError> {
        if let Some(value) = minutes {
            if value < 0 {
                return Err(ValidationError::NegativeDuration {
                    field: "crying minutes",
                    value,
                });
            }
        }
        self.crying_minutes = minutes;
        Ok(())
    }

    /// Attaches a wake cycle, keeping the cycle list non-overlapping.
    pub fn add_cycle(&mut self, cycle: SleepCycle) -> Result<(), StateError> {
        let mut cycles = self.cycles.clone();
        cycles.push(cycle);
        validate_cycles(&cycles)?;
        self.cycles = cycles;
        self.refresh_durations();
        Ok(())
    }

    /// Replaces the whole cycle list.
    pub fn set_cycles(&mut self, cycles: Vec<SleepCycle>) -> Result<(), StateError> {
        validate_cycles(&cycles)?;
        self.cycles = cycles;
        self.refresh_durations();
        Ok(())
    }

    /// Removes a cycle by index. Out-of-range indices are a no-op.
    pub fn remove_cycle(&mut self, index: usize) {
        if index < self.cycles.len() {
            self.cycles.remove(index);
            self.refresh_durations();
        }
    }

    /// Re-derives all duration fields from the current timestamps and
    /// cycles. Used by mutations here and by bulk recomputation.
    pub fn refresh_durations(&mut self) {
        self.durations = compute_durations(
            self.put_down_at,
            self.asleep_at,
            self.woke_up_at,
            self.out_of_crib_at,
            &self.cycles,
        );
    }

    /// Coarse display label for the state-mirroring integration.
    #[must_use]
    pub const fn display_state(&self) -> &'static str {
        self.state.display_label()
    }

    #[must_use]
    pub const fn is_asleep(&self) -> bool {
        matches!(self.state, SessionState::Asleep)
    }

    fn write_timestamp(&mut self, field: TimestampField, value: Option<DateTime<Utc>>) {
        match field {
            TimestampField::PutDown => self.put_down_at = value,
            TimestampField::Asleep => self.asleep_at = value,
            TimestampField::WokeUp => self.woke_up_at = value,
            TimestampField::OutOfCrib => self.out_of_crib_at = value,
        }
    }

    /// Validates the put-down <= asleep <= woke-up <= out-of-crib chain
    /// as it would look with `field` set to `value`.
    fn check_ordering_with(
        &self,
        field: TimestampField,
        value: Option<DateTime<Utc>>,
    ) -> Result<(), ValidationError> {
        let pick = |candidate: TimestampField, current: Option<DateTime<Utc>>| {
            if candidate == field { value } else { current }
        };
        let chain = [
            ("put_down_at", pick(TimestampField::PutDown, self.put_down_at)),
            ("asleep_at", pick(TimestampField::Asleep, self.asleep_at)),
            ("woke_up_at", pick(TimestampField::WokeUp, self.woke_up_at)),
            (
                "out_of_crib_at",
                pick(TimestampField::OutOfCrib, self.out_of_crib_at),
            ),
        ];

        let mut last: Option<(&'static str, DateTime<Utc>)> = None;
        for (name, timestamp) in chain {
            let Some(timestamp) = timestamp else { continue };
            if let Some((earlier_name, earlier)) = last {
                if timestamp < earlier {
                    return Err(ValidationError::TimestampOrder {
                        earlier: earlier_name,
                        later: name,
                    });
                }
            }
            last = Some((name, timestamp));
        }
        Ok(())
    }
}
