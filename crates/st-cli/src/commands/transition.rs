//! Track a nap-count schedule transition.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use st_core::{
    ChildId, ScheduleTransition, ScheduleType, TransitionRules, analyze_nap_push_readiness,
    check_crib_compliance, transition_progress,
};
use st_db::Database;

use super::util::{open_transition, parse_schedule_name, preset_for};

/// History window fed to the push-readiness analysis.
const READINESS_LOOKBACK_DAYS: i64 = 14;

/// Begins a transition toward the target schedule.
pub fn start(
    db: &mut Database,
    child_id: &ChildId,
    to: &str,
    weeks: u32,
    now: DateTime<Utc>,
) -> Result<()> {
    let to_type = parse_schedule_name(to)?;
    if to_type == ScheduleType::Transition {
        bail!("the transition target must be a concrete schedule");
    }
    let from_type = db
        .active_schedule(child_id)
        .context("no active schedule to transition from")?
        .schedule_type;

    let transition = ScheduleTransition::start(child_id.clone(), from_type, to_type, weeks, now);
    db.start_transition(&transition)
        .context("failed to start transition")?;

    println!(
        "Transition {from_type} -> {to_type} started, target {weeks} weeks. \
         Nap held at {} for now.",
        transition.current_nap_time
    );
    Ok(())
}

/// Shows week, phase, and progress of the open transition.
pub fn status(db: &Database, child_id: &ChildId, now: DateTime<Utc>) -> Result<()> {
    let transition = require_open(db, child_id)?;
    let progress = transition_progress(&transition, now);

    println!(
        "Transition {} -> {}: week {} of {}, phase {}, {}% to the {} goal",
        transition.from_type,
        transition.to_type,
        progress.current_week,
        transition.target_weeks,
        progress.phase,
        progress.percent_complete,
        TransitionRules::GOAL_NAP_START
    );
    println!("Nap currently held at {}", transition.current_nap_time);
    Ok(())
}

/// Checks whether the held nap time is ready to move later.
pub fn push_check(
    db: &mut Database,
    child_id: &ChildId,
    apply: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut transition = require_open(db, child_id)?;
    let recent = db.completed_naps_since(child_id, now - Duration::days(READINESS_LOOKBACK_DAYS))?;
    let readiness = analyze_nap_push_readiness(&transition, &recent, now);

    if readiness.ready {
        let suggested = readiness
            .suggested_nap_time
            .unwrap_or(TransitionRules::GOAL_NAP_START);
        println!("Ready to push the nap to {suggested}.");
        if apply {
            transition
                .push_nap_time(suggested, now)
                .context("failed to push nap time")?;
            db.update_transition(&transition)?;
            println!("Nap now held at {}.", transition.current_nap_time);
        } else {
            println!("Re-run with --apply to move it.");
        }
    } else {
        println!("Not ready to push the nap yet:");
        for reason in &readiness.reasons {
            println!("- {reason}");
        }
    }
    Ok(())
}

/// Checks minimum crib time for the current session.
pub fn crib_check(db: &Database, child_id: &ChildId, now: DateTime<Utc>) -> Result<()> {
    let Some(session) = db.current_session(child_id)? else {
        bail!("no open session to check");
    };
    let compliance = check_crib_compliance(&session, now);

    if compliance.compliant {
        println!(
            "In the crib {}m; the {}m minimum is met.",
            compliance.minutes_in_crib,
            TransitionRules::MIN_CRIB_MINUTES
        );
    } else {
        println!(
            "In the crib {}m; {}m to go before the {}m minimum.",
            compliance.minutes_in_crib,
            compliance.remaining_minutes,
            TransitionRules::MIN_CRIB_MINUTES
        );
    }
    Ok(())
}

/// Completes the open transition and activates the target schedule.
pub fn complete(db: &mut Database, child_id: &ChildId, now: DateTime<Utc>) -> Result<()> {
    let transition = require_open(db, child_id)?;
    db.complete_transition(child_id, now)?;

    let schedule = preset_for(transition.to_type)?;
    db.set_active_schedule(child_id, &schedule, now)?;
    println!(
        "Transition complete. Active schedule is now {}.",
        transition.to_type
    );
    Ok(())
}

fn require_open(db: &Database, child_id: &ChildId) -> Result<ScheduleTransition> {
    match open_transition(db, child_id)? {
        Some(transition) => Ok(transition),
        None => bail!("no open transition; start one with `st transition start`"),
    }
}
