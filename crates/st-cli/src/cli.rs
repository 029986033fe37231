//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use st_core::{ClockTime, NapLocation, WakeType};

/// Infant sleep tracker.
///
/// Logs sleep sessions as timestamped events, derives rest metrics,
/// and recommends nap and bedtime windows for the day.
#[derive(Debug, Parser)]
#[command(name = "st", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log a sleep event against the current session.
    Log {
        #[command(subcommand)]
        event: LogEvent,
    },

    /// Edit mid-sleep wake cycles on the current session.
    Cycle {
        #[command(subcommand)]
        action: CycleAction,
    },

    /// Show the day's nap and bedtime windows.
    Today {
        /// Morning wake time (HH:mm); assumed from the schedule if omitted.
        #[arg(long)]
        wake: Option<ClockTime>,

        /// Emit JSON instead of human output.
        #[arg(long)]
        json: bool,
    },

    /// Show the single next recommended action.
    Next {
        /// Emit JSON instead of human output.
        #[arg(long)]
        json: bool,
    },

    /// Track a nap-count schedule transition.
    Transition {
        #[command(subcommand)]
        action: TransitionAction,
    },

    /// Show or switch the active schedule.
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },

    /// Re-derive duration fields for every stored session.
    Recompute,

    /// Show the current session and its derived durations.
    Status,
}

/// Sleep events and session creation.
#[derive(Debug, Subcommand)]
pub enum LogEvent {
    /// Start a session: child placed in the crib.
    PutDown {
        /// Event time (HH:mm, local); defaults to now.
        #[arg(long)]
        at: Option<ClockTime>,

        /// Position in the day's nap sequence, 1-based.
        #[arg(long)]
        nap: Option<u32>,

        /// Log night sleep instead of a nap.
        #[arg(long)]
        night: bool,
    },

    /// The child fell asleep.
    FellAsleep {
        /// Event time (HH:mm, local); defaults to now.
        #[arg(long)]
        at: Option<ClockTime>,
    },

    /// The child woke up.
    WokeUp {
        /// Event time (HH:mm, local); defaults to now.
        #[arg(long)]
        at: Option<ClockTime>,
    },

    /// The child was taken out of the crib; completes the session.
    OutOfCrib {
        /// Event time (HH:mm, local); defaults to now.
        #[arg(long)]
        at: Option<ClockTime>,
    },

    /// Log an out-of-crib nap (car, stroller, ...) directly.
    Adhoc {
        /// Where the nap happened.
        #[arg(long)]
        location: NapLocation,

        /// When the child fell asleep (HH:mm, local).
        #[arg(long)]
        asleep: ClockTime,

        /// When the child woke (HH:mm, local); omit if still asleep.
        #[arg(long)]
        woke: Option<ClockTime>,
    },
}

/// Wake-cycle edits.
#[derive(Debug, Subcommand)]
pub enum CycleAction {
    /// Record a mid-sleep wake cycle.
    Add {
        /// When the child woke (HH:mm, local).
        #[arg(long)]
        woke: ClockTime,

        /// When the child fell back asleep (HH:mm, local); omit if ongoing.
        #[arg(long)]
        back: Option<ClockTime>,

        /// How the child behaved while awake.
        #[arg(long = "type")]
        wake_type: WakeType,
    },

    /// Remove a wake cycle by its position.
    Remove {
        /// Zero-based cycle index.
        index: usize,
    },
}

/// Nap-count transition tracking.
#[derive(Debug, Subcommand)]
pub enum TransitionAction {
    /// Begin transitioning toward a target schedule.
    Start {
        /// Target schedule preset (three-nap, two-nap, one-nap).
        #[arg(long)]
        to: String,

        /// Expected transition length in weeks.
        #[arg(long, default_value_t = 6)]
        weeks: u32,
    },

    /// Show transition week, phase, and progress.
    Status,

    /// Check whether the held nap time is ready to move later.
    PushCheck {
        /// Apply the suggested push when ready.
        #[arg(long)]
        apply: bool,
    },

    /// Check crib-time compliance for the current session.
    CribCheck,

    /// Mark the transition complete.
    Complete,
}

/// Active-schedule management.
#[derive(Debug, Subcommand)]
pub enum ScheduleAction {
    /// Show the active schedule.
    Show,

    /// Activate a schedule preset (three-nap, two-nap, one-nap).
    Use {
        /// Preset name.
        preset: String,
    },
}
