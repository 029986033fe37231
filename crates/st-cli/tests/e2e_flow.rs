//! End-to-end integration tests for the sleep tracking flow.
//!
//! Tests the full pipeline: activate schedule → log events → query
//! status and schedules through the real binary.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn st_binary() -> String {
    env!("CARGO_BIN_EXE_st").to_string()
}

/// Run `st` with the given args against an isolated home and database.
fn st(temp: &Path, args: &[&str]) -> Output {
    Command::new(st_binary())
        .env("HOME", temp)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env("ST_DATABASE_PATH", temp.join("st.db"))
        .env("ST_TIMEZONE", "UTC")
        .args(args)
        .output()
        .expect("failed to run st")
}

fn assert_success(output: &Output, context: &str) {
    assert!(
        output.status.success(),
        "{context} should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_full_nap_lifecycle() {
    let temp = TempDir::new().unwrap();

    let output = st(temp.path(), &["schedule", "use", "two-nap"]);
    assert_success(&output, "schedule use");
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("two_nap"),
        "activation should name the schedule"
    );

    assert_success(
        &st(
            temp.path(),
            &["log", "put-down", "--at", "09:00", "--nap", "1"],
        ),
        "put-down",
    );
    assert_success(
        &st(temp.path(), &["log", "fell-asleep", "--at", "09:15"]),
        "fell-asleep",
    );
    assert_success(
        &st(temp.path(), &["log", "woke-up", "--at", "10:20"]),
        "woke-up",
    );
    assert_success(
        &st(temp.path(), &["log", "out-of-crib", "--at", "10:30"]),
        "out-of-crib",
    );

    let output = st(temp.path(), &["status"]);
    assert_success(&output, "status");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("State: Awake"), "session should be complete: {stdout}");
    assert!(stdout.contains("Sleep: 65m"), "sleep should be derived: {stdout}");
    assert!(stdout.contains("Total: 90m"), "total should be derived: {stdout}");
}

#[test]
fn test_put_down_rejected_while_session_open() {
    let temp = TempDir::new().unwrap();

    assert_success(
        &st(temp.path(), &["log", "put-down", "--at", "09:00"]),
        "first put-down",
    );

    let output = st(temp.path(), &["log", "put-down", "--at", "09:05"]);
    assert!(
        !output.status.success(),
        "second put-down should be rejected"
    );
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("still open"),
        "error should name the open session"
    );
}

#[test]
fn test_today_requires_active_schedule() {
    let temp = TempDir::new().unwrap();

    let output = st(temp.path(), &["today"]);
    assert!(!output.status.success(), "today without a schedule should fail");
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("no active schedule"),
        "error should point at schedule setup"
    );
}

#[test]
fn test_today_json_output() {
    let temp = TempDir::new().unwrap();

    assert_success(
        &st(temp.path(), &["schedule", "use", "two-nap"]),
        "schedule use",
    );

    let output = st(temp.path(), &["today", "--wake", "06:30", "--json"]);
    assert_success(&output, "today --json");

    let day: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("today --json should emit valid JSON");
    assert_eq!(
        day["naps"].as_array().map(Vec::len),
        Some(2),
        "two-nap schedule should plan two naps"
    );
    assert!(day["bedtime"]["window"]["recommended"].is_string());
}

#[test]
fn test_next_reports_an_action() {
    let temp = TempDir::new().unwrap();

    assert_success(
        &st(temp.path(), &["schedule", "use", "three-nap"]),
        "schedule use",
    );

    let output = st(temp.path(), &["next"]);
    assert_success(&output, "next");
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("Next: "),
        "next should always produce an action"
    );
}

#[test]
fn test_recompute_reports_count() {
    let temp = TempDir::new().unwrap();

    let output = st(temp.path(), &["recompute"]);
    assert_success(&output, "recompute on empty db");
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("No sessions"),
        "empty database has nothing to recompute"
    );

    assert_success(
        &st(
            temp.path(),
            &[
                "log", "adhoc", "--location", "stroller", "--asleep", "09:00", "--woke", "09:45",
            ],
        ),
        "adhoc nap",
    );

    let output = st(temp.path(), &["recompute"]);
    assert_success(&output, "recompute");
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("1 session(s)"),
        "one stored session should be recomputed"
    );
}
