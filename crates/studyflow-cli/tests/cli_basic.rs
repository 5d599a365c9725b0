//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory
//! with "now" pinned to Monday 2026-03-02 07:00.

use std::path::Path;
use std::process::Command;

const NOW: &str = "2026-03-02 07:00";

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    run_cli_at(home, NOW, args)
}

fn run_cli_at(home: &Path, now: &str, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_studyflow"))
        .args(args)
        .env("STUDYFLOW_HOME", home)
        .env("STUDYFLOW_NOW", now)
        .env_remove("STUDYFLOW_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

/// `task add` prints a header line followed by the task as JSON.
fn add_task(home: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["task", "add"];
    full.extend_from_slice(args);
    let stdout = run_ok(home, &full);
    let (header, json) = stdout.split_once('\n').expect("header line");
    assert!(header.starts_with("Task created:"));
    serde_json::from_str(json).expect("task JSON")
}

#[test]
fn test_task_add_and_list() {
    let home = tempfile::tempdir().unwrap();
    let task = add_task(home.path(), &["Read chapter 3", "--duration", "50", "--due", "2026-03-03"]);
    assert_eq!(task["urgency"], "high");
    assert_eq!(task["task_type"], "one-time");

    let listed: serde_json::Value =
        serde_json::from_str(&run_ok(home.path(), &["task", "list", "--json"])).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["name"], "Read chapter 3");
}

#[test]
fn test_multi_day_task_gets_sessions() {
    let home = tempfile::tempdir().unwrap();
    let task = add_task(
        home.path(),
        &["Exam prep", "--difficulty", "hard", "--duration", "120", "--due", "2026-03-06 17:00", "--multi-day"],
    );
    assert_eq!(task["start_date"], "2026-03-05");
    let sessions = task["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 5);
    assert_eq!(sessions[0]["start_time"], "2026-03-05T08:00:00");
}

#[test]
fn test_pack_keeps_completed_sessions() {
    let home = tempfile::tempdir().unwrap();
    let task = add_task(
        home.path(),
        &["Exam prep", "--difficulty", "hard", "--duration", "120", "--due", "2026-03-06 17:00", "--multi-day"],
    );
    let id = task["id"].as_str().unwrap().to_string();
    let first = task["sessions"][0]["id"].as_str().unwrap().to_string();
    run_ok(home.path(), &["task", "complete", &id, "--session", &first]);

    let stdout = run_ok(home.path(), &["schedule", "pack", &id]);
    assert!(stdout.contains("5 session(s), 1 completed"), "{stdout}");

    let shown: serde_json::Value = serde_json::from_str(&run_ok(home.path(), &["task", "show", &id])).unwrap();
    let sessions = shown["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 5);
    assert_eq!(sessions[0]["id"], first.as_str());
    assert_eq!(sessions[0]["completed"], true);
    let open: Vec<&str> = sessions[1..]
        .iter()
        .map(|s| s["start_time"].as_str().unwrap())
        .collect();
    assert_eq!(
        open,
        ["2026-03-05T08:30:00", "2026-03-05T09:00:00", "2026-03-05T09:30:00", "2026-03-05T10:00:00"]
    );

    // Past the start date, open work moves to today.
    let (stdout, stderr, code) = run_cli_at(home.path(), "2026-03-06 07:00", &["schedule", "pack", &id]);
    assert_eq!(code, 0, "{stderr}");
    assert!(stdout.contains("5 session(s), 1 completed"), "{stdout}");
    let shown: serde_json::Value = serde_json::from_str(&run_ok(home.path(), &["task", "show", &id])).unwrap();
    let sessions = shown["sessions"].as_array().unwrap();
    assert_eq!(sessions[0]["id"], first.as_str());
    assert!(sessions[1..]
        .iter()
        .all(|s| s["start_time"].as_str().unwrap().starts_with("2026-03-06")));
}

#[test]
fn test_multi_day_without_due_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["task", "add", "Vague", "--duration", "60", "--multi-day"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("no due date"));
}

#[test]
fn test_overlapping_block_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["block", "add", "mon", "09:00", "12:00", "--label", "Lectures"]);

    let (_, stderr, code) = run_cli(home.path(), &["block", "add", "1", "11:00", "13:00"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("overlaps"));

    let (_, stderr, code) = run_cli(home.path(), &["block", "add", "tue", "12:00", "09:00"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid time range"));

    let blocks: serde_json::Value =
        serde_json::from_str(&run_ok(home.path(), &["block", "list", "--json"])).unwrap();
    assert_eq!(blocks.as_array().unwrap().len(), 1);
}

#[test]
fn test_packing_avoids_blocks() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["block", "add", "wed", "08:00", "08:30"]);
    let task = add_task(
        home.path(),
        &["Lab report", "--duration", "50", "--due", "2026-03-05 12:00", "--multi-day"],
    );
    let sessions = task["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["start_time"], "2026-03-04T08:30:00");
    assert_eq!(sessions[1]["start_time"], "2026-03-04T09:00:00");
}

#[test]
fn test_today_respects_budget() {
    let home = tempfile::tempdir().unwrap();
    add_task(home.path(), &["Quiz prep", "--duration", "45", "--due", "2026-03-02 18:00"]);
    add_task(home.path(), &["Reading", "--duration", "30", "--due", "2026-03-12"]);

    let selection: serde_json::Value =
        serde_json::from_str(&run_ok(home.path(), &["today", "--budget", "60", "--json"])).unwrap();
    let tasks = selection["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["task"]["name"], "Quiz prep");
    assert_eq!(selection["total_minutes"], 45);
}

#[test]
fn test_schedule_auto_and_apply() {
    let home = tempfile::tempdir().unwrap();
    let task = add_task(home.path(), &["Essay", "--duration", "75", "--due", "2026-03-04"]);
    let id = task["id"].as_str().unwrap().to_string();

    let result: serde_json::Value = serde_json::from_str(&run_ok(
        home.path(),
        &["schedule", "auto", "--start", "2026-03-02 08:00", "--apply", "--json"],
    ))
    .unwrap();
    assert_eq!(result["total_work_sessions"], 3);

    let shown: serde_json::Value = serde_json::from_str(&run_ok(home.path(), &["task", "show", &id])).unwrap();
    let work = shown["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["kind"] == "work")
        .count();
    assert_eq!(work, 3);
}

#[test]
fn test_schedule_auto_without_tasks_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["schedule", "auto"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("No incomplete tasks"));
}

#[test]
fn test_complete_and_remove() {
    let home = tempfile::tempdir().unwrap();
    let task = add_task(home.path(), &["Flashcards"]);
    let id = task["id"].as_str().unwrap().to_string();

    let stdout = run_ok(home.path(), &["task", "complete", &id]);
    assert!(stdout.contains("Task completed"));
    let open: serde_json::Value =
        serde_json::from_str(&run_ok(home.path(), &["task", "list", "--json"])).unwrap();
    assert!(open.as_array().unwrap().is_empty());

    run_ok(home.path(), &["task", "remove", &id]);
    let (_, _, code) = run_cli(home.path(), &["task", "show", &id]);
    assert_eq!(code, 1);
}

#[test]
fn test_tick_runs_once_per_day() {
    let home = tempfile::tempdir().unwrap();
    add_task(home.path(), &["Essay", "--due", "2026-03-10"]);
    assert!(run_ok(home.path(), &["tick"]).contains("urgency refreshed for 1 task(s)"));
    let again = run_ok(home.path(), &["tick"]);
    assert!(again.contains("already refreshed today"));
    assert!(again.contains("next refresh: 2026-03-03 00:00:00"));
}

#[test]
fn test_config_get_set() {
    let home = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(home.path(), &["config", "get", "packer.max_chain"]).trim(), "3");
    run_ok(home.path(), &["config", "set", "packer.max_chain", "2"]);
    assert_eq!(run_ok(home.path(), &["config", "get", "packer.max_chain"]).trim(), "2");

    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "packer.nope", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown configuration key"));

    run_ok(home.path(), &["config", "reset"]);
    assert_eq!(run_ok(home.path(), &["config", "get", "packer.max_chain"]).trim(), "3");
}
