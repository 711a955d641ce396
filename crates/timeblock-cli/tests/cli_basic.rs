//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with an isolated data directory and verify
//! outputs.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use serde::Deserialize;

/// Run a CLI command in `dir` and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_timeblock-cli"))
        .args(args)
        .env("TIMEBLOCK_DATA_DIR", dir)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "CLI command {args:?} failed: {stderr}");
    stdout
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Row {
    index: usize,
    id: String,
    name: String,
    kind: String,
    duration_minutes: u32,
    remaining_seconds: u64,
    #[serde(default)]
    reminders: Vec<serde_json::Value>,
}

fn list(dir: &Path) -> Vec<Row> {
    serde_json::from_str(&run_ok(dir, &["block", "list"])).expect("block list prints JSON")
}

#[test]
fn test_block_list_starter_set() {
    let dir = tempfile::tempdir().unwrap();
    let rows = list(dir.path());
    let kinds: Vec<&str> = rows.iter().map(|r| r.kind.as_str()).collect();
    assert_eq!(kinds, ["work", "shortBreak", "longBreak"]);
    assert_eq!(rows[0].duration_minutes, 25);
    assert_eq!(rows[0].remaining_seconds, 1500);
    assert_eq!(rows[2].index, 2);
    assert!(dir.path().join("blocks.json").exists());
}

#[test]
fn test_block_add_update_delete() {
    let dir = tempfile::tempdir().unwrap();
    let id = run_ok(dir.path(), &["block", "add", "Reading", "--duration", "40", "--color", "purple"]);
    let id = id.trim();

    let rows = list(dir.path());
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3].id, id);
    assert_eq!(rows[3].name, "Reading");

    run_ok(dir.path(), &["block", "update", id, "--name", "Deep Reading", "--duration", "50"]);
    let rows = list(dir.path());
    assert_eq!(rows[3].name, "Deep Reading");
    assert_eq!(rows[3].remaining_seconds, 3000);

    run_ok(dir.path(), &["block", "delete", id]);
    assert_eq!(list(dir.path()).len(), 3);

    let (_, stderr, code) = run_cli(dir.path(), &["block", "delete", id]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown block"));
}

#[test]
fn test_block_move() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["block", "move", "0", "2"]);
    let kinds: Vec<String> = list(dir.path()).into_iter().map(|r| r.kind).collect();
    assert_eq!(kinds, ["shortBreak", "longBreak", "work"]);

    let (_, _, code) = run_cli(dir.path(), &["block", "move", "9", "0"]);
    assert_ne!(code, 0);
}

#[test]
fn test_reminder_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let block = list(dir.path()).remove(0).id;

    let reminder = run_ok(dir.path(), &["reminder", "add", &block, "600", "Stand up"]);
    let reminder = reminder.trim();
    assert_eq!(list(dir.path())[0].reminders.len(), 1);

    run_ok(dir.path(), &["reminder", "update", &block, reminder, "--enabled", "false"]);
    let listed: Vec<serde_json::Value> =
        serde_json::from_str(&run_ok(dir.path(), &["reminder", "list", &block])).unwrap();
    assert_eq!(listed[0]["enabled"], false);
    assert_eq!(listed[0]["triggerTimeSeconds"], 600);

    let (_, _, code) = run_cli(dir.path(), &["reminder", "add", &block, "1501", "Too late"]);
    assert_ne!(code, 0);

    run_ok(dir.path(), &["reminder", "delete", &block, reminder]);
    assert!(list(dir.path())[0].reminders.is_empty());
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(dir.path(), &["config", "get", "schedule.work_duration"]).trim(), "25");

    run_ok(dir.path(), &["config", "set", "schedule.work_duration", "50"]);
    assert_eq!(run_ok(dir.path(), &["config", "get", "schedule.work_duration"]).trim(), "50");
    assert!(dir.path().join("config.toml").exists());
    assert_eq!(list(dir.path())[0].duration_minutes, 50);

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "sounds.ding_volume", "5"]);
    assert_ne!(code, 0);
    let (_, _, code) = run_cli(dir.path(), &["config", "get", "ui.theme"]);
    assert_ne!(code, 0);
}

#[test]
fn test_new_block_uses_configured_default() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["config", "set", "schedule.long_break", "20"]);
    run_ok(dir.path(), &["block", "add", "Walk", "--kind", "long-break"]);
    assert_eq!(list(dir.path())[3].duration_minutes, 20);
}

#[test]
fn test_stats_and_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let today: serde_json::Value = serde_json::from_str(&run_ok(dir.path(), &["stats", "today"])).unwrap();
    assert_eq!(today["workTimeSeconds"], 0);
    assert_eq!(today["workTargetMinutes"], 25);
    assert_eq!(today["workTarget"], "0:25");

    let all: Vec<serde_json::Value> = serde_json::from_str(&run_ok(dir.path(), &["stats", "all"])).unwrap();
    assert!(all.is_empty());

    let events: Vec<serde_json::Value> = serde_json::from_str(&run_ok(dir.path(), &["refresh"])).unwrap();
    assert_eq!(events[0]["type"], "BlocksRefreshed");
}

#[test]
fn test_status_is_idle_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let status: serde_json::Value = serde_json::from_str(&run_ok(dir.path(), &["status"])).unwrap();
    assert_eq!(status["type"], "StateSnapshot");
    assert_eq!(status["state"], "idle");
}

#[test]
fn test_sqlite_backend() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["config", "set", "persistence.backend", "sqlite"]);
    run_ok(dir.path(), &["block", "add", "Stored"]);
    assert!(dir.path().join("timeblock.db").exists());
    assert!(!dir.path().join("blocks.json").exists());
    assert_eq!(list(dir.path())[3].name, "Stored");
}

#[test]
fn test_run_reads_commands_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_timeblock-cli"))
        .args(["run"])
        .env("TIMEBLOCK_DATA_DIR", dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"pause\ntimeblock://resume\ntimeblock://snooze\nstatus\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let types: Vec<String> = stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .filter_map(|v| v["type"].as_str().map(str::to_string))
        .collect();
    assert!(types.contains(&"BlockStarted".to_string()), "{stdout}");
    assert!(types.contains(&"BlockPaused".to_string()), "{stdout}");
    assert!(types.contains(&"BlockResumed".to_string()), "{stdout}");
    assert!(types.contains(&"StateSnapshot".to_string()), "{stdout}");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown control command: snooze"));

    let status: serde_json::Value = serde_json::from_str(&run_ok(dir.path(), &["status"])).unwrap();
    assert_eq!(status["state"], "idle");
}
