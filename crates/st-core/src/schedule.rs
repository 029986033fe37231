//! Declarative sleep schedule configuration.
//!
//! A schedule describes the target shape of a day: per-nap wake-window
//! bounds and clock limits, bedtime bounds, wake-time limits, and the
//! day-level caps. The presets here encode common age-band defaults;
//! persisted schedules are free to override any field.

use serde::{Deserialize, Serialize};

use crate::types::{ClockTime, ScheduleType};

/// Per-nap configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NapConfig {
    /// 1-based position in the day.
    pub nap_number: u32,
    /// Minimum awake minutes since the previous sleep before this nap.
    pub wake_window_min: i64,
    /// Maximum awake minutes since the previous sleep.
    pub wake_window_max: i64,
    pub earliest_start: ClockTime,
    pub latest_start: ClockTime,
    pub max_duration_minutes: i64,
    /// The nap should be over by this time.
    pub end_by: ClockTime,
}

/// Bedtime window configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedtimeConfig {
    pub earliest: ClockTime,
    pub latest: ClockTime,
    /// Preferred window for the recommended point.
    pub goal_start: ClockTime,
    pub goal_end: ClockTime,
    /// Awake minutes between the last nap's end and bedtime.
    pub wake_window_min: i64,
    pub wake_window_max: i64,
}

/// A full schedule configuration. At most one is active per child;
/// that invariant lives in the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepSchedule {
    pub schedule_type: ScheduleType,
    /// Ordered by nap number.
    pub naps: Vec<NapConfig>,
    pub bedtime: BedtimeConfig,
    pub wake_earliest: ClockTime,
    pub wake_latest: ClockTime,
    /// Hard deadline for waking the child in the morning or from a nap.
    pub must_wake_by: ClockTime,
    /// Cap on total daytime sleep minutes.
    pub day_sleep_cap_minutes: i64,
    /// Cap on any single nap.
    pub nap_cap_minutes: i64,
    /// Minimum crib time per attempt during training.
    pub minimum_crib_minutes: i64,
    /// Extended max duration for nap 2 after a short nap 1.
    pub short_nap_exception_minutes: Option<i64>,
    /// How far ahead of a window the reminder subsystem alerts.
    /// Carried as data only; the notification layer owns the policy.
    pub reminder_lead_minutes: i64,
}

impl SleepSchedule {
    /// Config for a given nap number, if the schedule plans it.
    #[must_use]
    pub fn nap(&self, nap_number: u32) -> Option<&NapConfig> {
        self.naps.iter().find(|n| n.nap_number == nap_number)
    }

    /// Number of naps this schedule plans.
    #[must_use]
    pub fn nap_count(&self) -> usize {
        if self.schedule_type == ScheduleType::Transition {
            1
        } else {
            self.naps.len()
        }
    }

    /// Three-nap preset (roughly 5-8 months).
    #[must_use]
    pub fn three_nap() -> Self {
        Self {
            schedule_type: ScheduleType::ThreeNap,
            naps: vec![
                nap(1, 120, 150, "08:30", "09:30", 90, "11:00"),
                nap(2, 150, 180, "12:00", "13:30", 120, "15:30"),
                nap(3, 150, 210, "15:30", "16:45", 45, "17:30"),
            ],
            bedtime: bedtime("18:30", "20:00", "19:00", "19:30", 150, 210),
            wake_earliest: clock("06:00"),
            wake_latest: clock("07:30"),
            must_wake_by: clock("08:00"),
            day_sleep_cap_minutes: 240,
            nap_cap_minutes: 120,
            minimum_crib_minutes: 60,
            short_nap_exception_minutes: None,
            reminder_lead_minutes: 15,
        }
    }

    /// Two-nap preset (roughly 8-15 months).
    #[must_use]
    pub fn two_nap() -> Self {
        Self {
            schedule_type: ScheduleType::TwoNap,
            naps: vec![
                nap(1, 150, 210, "09:00", "10:00", 120, "11:30"),
                nap(2, 180, 240, "13:00", "15:00", 120, "16:30"),
            ],
            bedtime: bedtime("18:30", "20:30", "19:00", "19:45", 180, 240),
            wake_earliest: clock("06:00"),
            wake_latest: clock("07:30"),
            must_wake_by: clock("08:00"),
            day_sleep_cap_minutes: 240,
            nap_cap_minutes: 120,
            minimum_crib_minutes: 60,
            short_nap_exception_minutes: Some(150),
            reminder_lead_minutes: 15,
        }
    }

    /// One-nap preset (roughly 15+ months).
    #[must_use]
    pub fn one_nap() -> Self {
        Self {
            schedule_type: ScheduleType::OneNap,
            naps: vec![nap(1, 300, 360, "12:00", "13:30", 150, "15:30")],
            bedtime: bedtime("18:30", "20:30", "19:15", "20:00", 240, 300),
            wake_earliest: clock("06:00"),
            wake_latest: clock("07:30"),
            must_wake_by: clock("08:00"),
            day_sleep_cap_minutes: 180,
            nap_cap_minutes: 150,
            minimum_crib_minutes: 90,
            short_nap_exception_minutes: None,
            reminder_lead_minutes: 15,
        }
    }

    /// Preset for a schedule type, where one exists.
    #[must_use]
    pub fn preset(schedule_type: ScheduleType) -> Option<Self> {
        match schedule_type {
            ScheduleType::ThreeNap => Some(Self::three_nap()),
            ScheduleType::TwoNap => Some(Self::two_nap()),
            ScheduleType::OneNap => Some(Self::one_nap()),
            ScheduleType::Transition => None,
        }
    }
}

fn clock(s: &str) -> ClockTime {
    s.parse().expect("preset clock times are well-formed")
}

fn nap(
    nap_number: u32,
    wake_window_min: i64,
    wake_window_max: i64,
    earliest: &str,
    latest: &str,
    max_duration_minutes: i64,
    end_by: &str,
) -> NapConfig {
    NapConfig {
        nap_number,
        wake_window_min,
        wake_window_max,
        earliest_start: clock(earliest),
        latest_start: clock(latest),
        max_duration_minutes,
        end_by: clock(end_by),
    }
}

fn bedtime(
    earliest: &str,
    latest: &str,
    goal_start: &str,
    goal_end: &str,
    wake_window_min: i64,
    wake_window_max: i64,
) -> BedtimeConfig {
    BedtimeConfig {
        earliest: clock(earliest),
        latest: clock(latest),
        goal_start: clock(goal_start),
        goal_end: clock(goal_end),
        wake_window_min,
        wake_window_max,
    }
}
