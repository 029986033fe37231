use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use st_cli::commands::{cycle, log, next, recompute, schedule, status, today, transition};
use st_cli::{Cli, Commands, Config, CycleAction, LogEvent, ScheduleAction, TransitionAction};
use st_core::SleepEvent;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(st_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = st_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

#[allow(clippy::too_many_lines)]
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let now = Utc::now();

    match &cli.command {
        Some(Commands::Log { event }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let child = config.child_id()?;
            let tz = config.tz()?;
            match event {
                LogEvent::PutDown { at, nap, night } => {
                    log::put_down(&mut db, &child, *at, *nap, *night, now, tz)?;
                }
                LogEvent::FellAsleep { at } => {
                    log::event(&mut db, &child, SleepEvent::FellAsleep, *at, now, tz)?;
                }
                LogEvent::WokeUp { at } => {
                    log::event(&mut db, &child, SleepEvent::WokeUp, *at, now, tz)?;
                }
                LogEvent::OutOfCrib { at } => {
                    log::event(&mut db, &child, SleepEvent::OutOfCrib, *at, now, tz)?;
                }
                LogEvent::Adhoc {
                    location,
                    asleep,
                    woke,
                } => {
                    log::adhoc(&mut db, &child, *location, *asleep, *woke, now, tz)?;
                }
            }
        }
        Some(Commands::Cycle { action }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let child = config.child_id()?;
            match action {
                CycleAction::Add {
                    woke,
                    back,
                    wake_type,
                } => {
                    cycle::add(&mut db, &child, *woke, *back, *wake_type, now, config.tz()?)?;
                }
                CycleAction::Remove { index } => {
                    cycle::remove(&mut db, &child, *index)?;
                }
            }
        }
        Some(Commands::Today { wake, json }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            today::run(&db, &config.child_id()?, *wake, *json, now, config.tz()?)?;
        }
        Some(Commands::Next { json }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            next::run(&db, &config.child_id()?, *json, now, config.tz()?)?;
        }
        Some(Commands::Transition { action }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let child = config.child_id()?;
            match action {
                TransitionAction::Start { to, weeks } => {
                    transition::start(&mut db, &child, to, *weeks, now)?;
                }
                TransitionAction::Status => transition::status(&db, &child, now)?,
                TransitionAction::PushCheck { apply } => {
                    transition::push_check(&mut db, &child, *apply, now)?;
                }
                TransitionAction::CribCheck => transition::crib_check(&db, &child, now)?,
                TransitionAction::Complete => transition::complete(&mut db, &child, now)?,
            }
        }
        Some(Commands::Schedule { action }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let child = config.child_id()?;
            match action {
                ScheduleAction::Show => schedule::show(&db, &child)?,
                ScheduleAction::Use { preset } => {
                    schedule::activate(&mut db, &child, preset, now)?;
                }
            }
        }
        Some(Commands::Recompute) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            recompute::run(&mut db)?;
        }
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let mut stdout = std::io::stdout();
            status::run(&mut stdout, &db, &config.child_id()?, config.tz()?)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
