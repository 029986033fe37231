//! CLI subcommand implementations.

pub mod cycle;
pub mod log;
pub mod next;
pub mod recompute;
pub mod schedule;
pub mod status;
pub mod today;
pub mod transition;
pub mod util;
