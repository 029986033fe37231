//! Core domain logic for the sleep tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Durations: deriving sleep, settling, and qualified-rest minutes
//!   from a session's timestamps and mid-sleep cycles
//! - Sessions: the put-down to out-of-crib state machine
//! - Day schedules: nap and bedtime window calculation
//! - Advisor: the single next-action recommendation
//! - Transitions: moving a child between nap-count schedules

pub mod advisor;
pub mod day_schedule;
mod durations;
pub mod schedule;
pub mod session;
pub mod transition;
pub mod types;
pub mod tz;

pub use advisor::{NextAction, NextActionKind, calculate_next_action, check_wake_deadline};
pub use day_schedule::{
    BedtimeRecommendation, DaySchedule, NapRecommendation, TimeWindow, calculate_adjusted_bedtime,
    calculate_day_schedule, format_window,
};
pub use durations::{Durations, SleepCycle, compute_durations, validate_cycles};
pub use schedule::{BedtimeConfig, NapConfig, SleepSchedule};
pub use session::{SleepEvent, SleepSession, StateError, TimestampField};
pub use transition::{
    CribCompliance, PushReadiness, ScheduleTransition, TransitionError, TransitionPhase,
    TransitionProgress, TransitionRules, analyze_nap_push_readiness, check_crib_compliance,
    transition_progress,
};
pub use types::{
    ChildId, ClockTime, NapLocation, ScheduleType, SessionId, SessionState, SleepType,
    ValidationError, WakeType,
};
