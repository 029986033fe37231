//! Core type definitions with validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A clock time string could not be parsed.
    #[error("invalid clock time (expected HH:mm): {value}")]
    InvalidClockTime { value: String },

    /// A duration value was negative.
    #[error("{field} cannot be negative, got {value}")]
    NegativeDuration { field: &'static str, value: i64 },

    /// Session timestamps are out of order.
    #[error("{later} cannot precede {earlier}")]
    TimestampOrder {
        earlier: &'static str,
        later: &'static str,
    },

    /// A wake cycle overlaps another cycle on the same session.
    #[error("wake cycles overlap at index {index}")]
    OverlappingCycles { index: usize },

    /// Invalid enum string value.
    #[error("invalid {kind}: {value}")]
    InvalidEnumValue { kind: &'static str, value: String },
}

/// State of a sleep session.
///
/// The only legal path is Pending -> Asleep -> Awake -> Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Put down in the crib, not yet asleep.
    #[default]
    Pending,
    Asleep,
    /// Woke up, still in the crib.
    Awake,
    /// Out of the crib. Terminal.
    Completed,
}

impl SessionState {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Asleep => "asleep",
            Self::Awake => "awake",
            Self::Completed => "completed",
        }
    }

    /// Coarse display label for the state-mirroring integration.
    ///
    /// One-way, best-effort projection; consumers poll it and failures
    /// to deliver it never feed back into the session.
    #[must_use]
    pub const fn display_label(&self) -> &'static str {
        match self {
            Self::Pending => "In Crib",
            Self::Asleep => "Asleep",
            Self::Awake => "Awake in Crib",
            Self::Completed => "Awake",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "asleep" => Ok(Self::Asleep),
            "awake" => Ok(Self::Awake),
            "completed" => Ok(Self::Completed),
            _ => Err(ValidationError::InvalidEnumValue {
                kind: "session state",
                value: s.to_string(),
            }),
        }
    }
}

/// Kind of sleep session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SleepType {
    #[default]
    Nap,
    NightSleep,
}

impl SleepType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Nap => "nap",
            Self::NightSleep => "night_sleep",
        }
    }
}

impl fmt::Display for SleepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SleepType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nap" => Ok(Self::Nap),
            "night_sleep" => Ok(Self::NightSleep),
            _ => Err(ValidationError::InvalidEnumValue {
                kind: "sleep type",
                value: s.to_string(),
            }),
        }
    }
}

/// How the child behaved during a mid-session wake interval.
///
/// The variant determines how much qualified-rest credit the interval
/// earns: quiet wake time counts half, restless and crying count none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeType {
    Quiet,
    Restless,
    Crying,
}

impl WakeType {
    /// Qualified-rest credit weight for awake minutes of this type.
    #[must_use]
    pub const fn credit_weight(&self) -> f64 {
        match self {
            Self::Quiet => 0.5,
            Self::Restless | Self::Crying => 0.0,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Quiet => "quiet",
            Self::Restless => "restless",
            Self::Crying => "crying",
        }
    }
}

impl fmt::Display for WakeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WakeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quiet" => Ok(Self::Quiet),
            "restless" => Ok(Self::Restless),
            "crying" => Ok(Self::Crying),
            _ => Err(ValidationError::InvalidEnumValue {
                kind: "wake type",
                value: s.to_string(),
            }),
        }
    }
}

/// Nap-count configuration of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    ThreeNap,
    TwoNap,
    OneNap,
    /// Mid-transition between nap counts; day schedules anchor to the
    /// transition's current nap time instead of the nap-1 config.
    Transition,
}

impl ScheduleType {
    /// Number of naps this schedule type plans per day.
    #[must_use]
    pub const fn nap_count(&self) -> usize {
        match self {
            Self::ThreeNap => 3,
            Self::TwoNap => 2,
            Self::OneNap | Self::Transition => 1,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ThreeNap => "three_nap",
            Self::TwoNap => "two_nap",
            Self::OneNap => "one_nap",
            Self::Transition => "transition",
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "three_nap" => Ok(Self::ThreeNap),
            "two_nap" => Ok(Self::TwoNap),
            "one_nap" => Ok(Self::OneNap),
            "transition" => Ok(Self::Transition),
            _ => Err(ValidationError::InvalidEnumValue {
                kind: "schedule type",
                value: s.to_string(),
            }),
        }
    }
}

/// Where an ad-hoc (out-of-crib) nap happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NapLocation {
    #[default]
    Crib,
    Car,
    Stroller,
    Carrier,
    Other,
}

impl NapLocation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Crib => "crib",
            Self::Car => "car",
            Self::Stroller => "stroller",
            Self::Carrier => "carrier",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for NapLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NapLocation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crib" => Ok(Self::Crib),
            "car" => Ok(Self::Car),
            "stroller" => Ok(Self::Stroller),
            "carrier" => Ok(Self::Carrier),
            "other" => Ok(Self::Other),
            _ => Err(ValidationError::InvalidEnumValue {
                kind: "nap location",
                value: s.to_string(),
            }),
        }
    }
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated sleep session identifier.
    SessionId, "session ID"
);

define_string_id!(
    /// A validated child identifier.
    ChildId, "child ID"
);

/// A wall-clock time of day, minutes since midnight.
///
/// Parses and formats as `HH:mm`. Ordering is the natural same-day
/// ordering; overnight wrap is handled by the window calculators, not
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    /// Creates a clock time from hours and minutes.
    ///
    /// Returns an error if the components are out of range.
    pub fn new(hours: u16, minutes: u16) -> Result<Self, ValidationError> {
        if hours > 23 || minutes > 59 {
            return Err(ValidationError::InvalidClockTime {
                value: format!("{hours:02}:{minutes:02}"),
            });
        }
        Ok(Self(hours * 60 + minutes))
    }

    /// Const constructor for compile-time clock constants. Saturates
    /// out-of-range components instead of erroring.
    #[must_use]
    pub const fn hm(hours: u16, minutes: u16) -> Self {
        Self::from_minutes_saturating(hours as i64 * 60 + minutes as i64)
    }

    /// Creates a clock time from minutes since midnight, saturating at 23:59.
    #[must_use]
    pub const fn from_minutes_saturating(minutes: i64) -> Self {
        if minutes <= 0 {
            Self(0)
        } else if minutes >= 24 * 60 {
            Self(24 * 60 - 1)
        } else {
            #[expect(clippy::cast_possible_truncation, reason = "bounded above by 1439")]
            let minutes = minutes as u16;
            Self(minutes)
        }
    }

    /// Minutes since midnight.
    #[must_use]
    pub const fn minutes_from_midnight(self) -> i64 {
        self.0 as i64
    }

    #[must_use]
    pub const fn hour(self) -> u32 {
        (self.0 / 60) as u32
    }

    #[must_use]
    pub const fn minute(self) -> u32 {
        (self.0 % 60) as u32
    }

    /// Adds minutes, saturating within the same day.
    #[must_use]
    pub const fn plus_minutes(self, minutes: i64) -> Self {
        Self::from_minutes_saturating(self.minutes_from_midnight() + minutes)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidClockTime {
            value: s.to_string(),
        };
        let (hours, minutes) = s.split_once(':').ok_or_else(invalid)?;
        let hours: u16 = hours.parse().map_err(|_| invalid())?;
        let minutes: u16 = minutes.parse().map_err(|_| invalid())?;
        Self::new(hours, minutes).map_err(|_| invalid())
    }
}

impl Serialize for ClockTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
