//! Nap-count transition tracking.
//!
//! A transition migrates a child from one nap count to another over
//! several weeks by holding the remaining nap at a fixed clock time and
//! pushing it later in small steps once the child tolerates it. The
//! rules are a fixed program, not per-schedule configuration.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SleepSession;
use crate::types::{ChildId, ClockTime, ScheduleType, SessionState, SleepType};

/// Fixed rules governing every nap-count transition.
pub struct TransitionRules;

impl TransitionRules {
    /// Weeks 1-2: hold the nap no earlier than this.
    pub const WEEK12_EARLIEST_NAP: ClockTime = ClockTime::hm(11, 30);
    /// Weeks 1-2: minimum crib time per attempt.
    pub const MIN_CRIB_MINUTES: i64 = 90;
    /// Weeks 1-2: longest tolerable wake window before the nap.
    pub const WEEK12_MAX_WAKE_WINDOW: i64 = 330;

    /// Week 2+: hold the nap no earlier than this.
    pub const WEEK2_PLUS_EARLIEST_NAP: ClockTime = ClockTime::hm(12, 0);
    /// Week 2+: wait at least this many days between pushes.
    pub const PUSH_INTERVAL_MIN_DAYS: i64 = 3;
    /// Week 2+: push at least every this many days when tolerated.
    pub const PUSH_INTERVAL_MAX_DAYS: i64 = 7;
    /// Week 2+: each push moves the nap this much later.
    pub const PUSH_AMOUNT_MINUTES: i64 = 15;

    /// Goal: target nap start once the transition completes.
    pub const GOAL_NAP_START: ClockTime = ClockTime::hm(12, 30);
    /// Goal: maximum nap duration.
    pub const GOAL_MAX_DURATION_MINUTES: i64 = 150;
    /// Goal: the nap should end by this time.
    pub const GOAL_END_BY: ClockTime = ClockTime::hm(15, 0);
    /// Goal: wake window to bedtime after the nap.
    pub const GOAL_BEDTIME_WAKE_WINDOW_MIN: i64 = 240;
    /// Goal: wake window to bedtime upper bound.
    pub const GOAL_BEDTIME_WAKE_WINDOW_MAX: i64 = 300;

    /// Temporary allowance while transitioning: let the child sleep in
    /// until this time to compensate for the longer morning.
    pub const TEMP_MAX_WAKE_TIME: ClockTime = ClockTime::hm(8, 0);

    /// Readiness: a nap counts as solid at this many sleep minutes.
    pub const SOLID_NAP_SLEEP_MINUTES: i64 = 90;
    /// Readiness: how many recent naps are examined.
    pub const READINESS_SAMPLE: usize = 5;
    /// Readiness: how many of the sample must be solid.
    pub const READINESS_REQUIRED_SOLID: usize = 3;
}

/// Errors from transition bookkeeping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("transition already completed at {completed_at}")]
    AlreadyCompleted { completed_at: DateTime<Utc> },
}

/// Progress phase of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPhase {
    /// Weeks 1-2: hold at 11:30, enforce minimum crib time.
    #[serde(rename = "week1_2")]
    Week12,
    /// Week 2+: push the nap later every few days.
    Week2Plus,
    /// Nap time has reached the goal.
    Final,
}

impl TransitionPhase {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Week12 => "week1_2",
            Self::Week2Plus => "week2_plus",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for TransitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks progress migrating from one nap count to another.
///
/// At most one open (uncompleted) transition exists per child; the
/// persistence layer enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTransition {
    pub child_id: ChildId,
    pub from_type: ScheduleType,
    pub to_type: ScheduleType,
    pub started_at: DateTime<Utc>,
    pub target_weeks: u32,
    /// Where the held nap currently starts.
    pub current_nap_time: ClockTime,
    /// Last time the nap time was pushed (or the start, before any push).
    pub updated_at: DateTime<Utc>,
    /// None while the transition is active.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScheduleTransition {
    /// Opens a new transition holding the nap at the week-1-2 floor.
    #[must_use]
    pub fn start(
        child_id: ChildId,
        from_type: ScheduleType,
        to_type: ScheduleType,
        target_weeks: u32,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            child_id,
            from_type,
            to_type,
            started_at,
            target_weeks,
            current_nap_time: TransitionRules::WEEK12_EARLIEST_NAP,
            updated_at: started_at,
            completed_at: None,
        }
    }

    /// Moves the held nap to a new time, typically one push later.
    pub fn push_nap_time(
        &mut self,
        new_time: ClockTime,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if let Some(completed_at) = self.completed_at {
            return Err(TransitionError::AlreadyCompleted { completed_at });
        }
        self.current_nap_time = new_time.min(TransitionRules::GOAL_NAP_START);
        self.updated_at = now;
        Ok(())
    }

    /// Calendar week of the transition, 1-based.
    #[must_use]
    pub fn week_at(&self, now: DateTime<Utc>) -> u32 {
        let days = (now - self.started_at).num_days().max(0);
        u32::try_from((days + 6) / 7).unwrap_or(u32::MAX).max(1)
    }
}

/// Snapshot of how far along a transition is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionProgress {
    pub current_week: u32,
    pub phase: TransitionPhase,
    /// 0-100, nap-time distance covered from 11:30 toward the goal.
    pub percent_complete: i64,
}

/// Computes the current phase and completion percentage.
#[must_use]
pub fn transition_progress(
    transition: &ScheduleTransition,
    now: DateTime<Utc>,
) -> TransitionProgress {
    let current_week = transition.week_at(now);
    let phase = if current_week <= 2 {
        TransitionPhase::Week12
    } else if transition.current_nap_time >= TransitionRules::GOAL_NAP_START {
        TransitionPhase::Final
    } else {
        TransitionPhase::Week2Plus
    };

    let floor = TransitionRules::WEEK12_EARLIEST_NAP.minutes_from_midnight();
    let goal = TransitionRules::GOAL_NAP_START.minutes_from_midnight();
    let current = transition.current_nap_time.minutes_from_midnight();
    let percent = (current - floor) * 100 / (goal - floor);

    TransitionProgress {
        current_week,
        phase,
        percent_complete: percent.clamp(0, 100),
    }
}

/// Outcome of the push-readiness analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReadiness {
    pub ready: bool,
    /// Why the nap is or is not ready to move, one entry per gate.
    pub reasons: Vec<String>,
    /// Where the nap should move when ready.
    pub suggested_nap_time: Option<ClockTime>,
}

/// Decides whether the held nap is ready to be pushed later.
///
/// `recent_naps` should be the child's completed nap sessions from the
/// last seven days, oldest first. Readiness requires being past week
/// two, not yet at the goal, a solid-enough recent sample, and enough
/// days since the last push.
#[must_use]
pub fn analyze_nap_push_readiness(
    transition: &ScheduleTransition,
    recent_naps: &[SleepSession],
    now: DateTime<Utc>,
) -> PushReadiness {
    let mut reasons = Vec::new();
    let mut ready = true;

    let current_week = transition.week_at(now);
    if current_week <= 2 {
        ready = false;
        reasons.push(format!(
            "week {current_week}: nap holds at {} until week 3",
            TransitionRules::WEEK12_EARLIEST_NAP
        ));
    }

    if transition.current_nap_time >= TransitionRules::GOAL_NAP_START {
        ready = false;
        reasons.push(format!(
            "nap already at goal time {}",
            TransitionRules::GOAL_NAP_START
        ));
    }

    let sample: Vec<&SleepSession> = recent_naps
        .iter()
        .filter(|s| {
            s.sleep_type == SleepType::Nap
                && s.state == SessionState::Completed
                && s.durations.sleep_minutes.is_some()
        })
        .rev()
        .take(TransitionRules::READINESS_SAMPLE)
        .collect();

    let solid = sample
        .iter()
        .filter(|s| {
            s.durations.sleep_minutes.unwrap_or(0) >= TransitionRules::SOLID_NAP_SLEEP_MINUTES
        })
        .count();

    if sample.len() < TransitionRules::READINESS_REQUIRED_SOLID {
        ready = false;
        reasons.push(format!(
            "only {} completed naps in the last week; need at least {}",
            sample.len(),
            TransitionRules::READINESS_REQUIRED_SOLID
        ));
    } else if solid < TransitionRules::READINESS_REQUIRED_SOLID {
        ready = false;
        reasons.push(format!(
            "only {solid} of the last {} naps reached {} sleep minutes",
            sample.len(),
            TransitionRules::SOLID_NAP_SLEEP_MINUTES
        ));
    } else {
        reasons.push(format!(
            "{solid} of the last {} naps were solid",
            sample.len()
        ));
    }

    let days_since_update = (now - transition.updated_at).num_days();
    if days_since_update < TransitionRules::PUSH_INTERVAL_MIN_DAYS {
        ready = false;
        reasons.push(format!(
            "last change {days_since_update} day(s) ago; wait at least {}",
            TransitionRules::PUSH_INTERVAL_MIN_DAYS
        ));
    }

    let suggested_nap_time = ready.then(|| {
        transition
            .current_nap_time
            .plus_minutes(TransitionRules::PUSH_AMOUNT_MINUTES)
            .min(TransitionRules::GOAL_NAP_START)
    });

    PushReadiness {
        ready,
        reasons,
        suggested_nap_time,
    }
}

/// Crib-90 rule evaluation for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CribCompliance {
    pub minutes_in_crib: i64,
    pub compliant: bool,
    /// Minutes still needed to satisfy the rule. Zero when compliant.
    pub remaining_minutes: i64,
}

/// Checks a session against the 90-minute minimum-crib-time rule.
///
/// Completed sessions are measured put-down to out-of-crib; in-progress
/// sessions are measured put-down to `now`. Sessions without a put-down
/// time (ad-hoc naps) report zero crib minutes.
#[must_use]
pub fn check_crib_compliance(session: &SleepSession, now: DateTime<Utc>) -> CribCompliance {
    let minutes_in_crib = match (session.put_down_at, session.out_of_crib_at) {
        (Some(put_down), Some(out)) => (out - put_down).num_minutes().max(0),
        (Some(put_down), None) => (now - put_down).num_minutes().max(0),
        (None, _) => 0,
    };
    let remaining_minutes = (TransitionRules::MIN_CRIB_MINUTES - minutes_in_crib).max(0);
    CribCompliance {
        minutes_in_crib,
        compliant: remaining_minutes == 0,
        remaining_minutes,
    }
}
