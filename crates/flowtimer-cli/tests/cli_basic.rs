//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary home
//! directory, so state never leaks between tests or into the real one.

use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_flowtimer"))
        .args(args)
        .env("HOME", home)
        .env_remove("FLOWTIMER_ENV")
        .env_remove("FLOWTIMER_DEBUG_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(home: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn run_text(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout.trim().to_string()
}

#[test]
fn test_timer_status_fresh() {
    let home = TempDir::new().unwrap();
    let out = run_json(home.path(), &["timer", "status"]);
    assert_eq!(out["applied"], true);
    assert_eq!(out["state"]["type"], "state_snapshot");
    assert_eq!(out["state"]["mode"], "focus");
    assert_eq!(out["state"]["run_status"], "idle");
    assert_eq!(out["state"]["countdown"], "25:00");
    assert_eq!(out["state"]["undo_available"], false);
}

#[test]
fn test_timer_start_pause_resume() {
    let home = TempDir::new().unwrap();
    let out = run_json(home.path(), &["timer", "start"]);
    assert_eq!(out["applied"], true);
    assert_eq!(out["events"][0]["type"], "timer_started");
    assert_eq!(out["state"]["run_status"], "running");

    let out = run_json(home.path(), &["timer", "start"]);
    assert_eq!(out["applied"], false);

    let out = run_json(home.path(), &["timer", "pause"]);
    assert_eq!(out["applied"], true);
    assert_eq!(out["state"]["run_status"], "paused");

    let out = run_json(home.path(), &["timer", "pause"]);
    assert_eq!(out["applied"], false);

    let out = run_json(home.path(), &["timer", "resume"]);
    assert_eq!(out["applied"], true);
    assert_eq!(out["state"]["run_status"], "running");
}

#[test]
fn test_invalid_actions_are_noops() {
    let home = TempDir::new().unwrap();
    for action in ["pause", "resume", "skip", "reset", "undo"] {
        let out = run_json(home.path(), &["timer", action]);
        assert_eq!(out["applied"], false, "{action} applied while idle");
        assert_eq!(out["state"]["run_status"], "idle");
    }
}

#[test]
fn test_skip_logs_focus_and_undo_reverses() {
    let home = TempDir::new().unwrap();
    run_json(home.path(), &["timer", "start"]);

    let out = run_json(home.path(), &["timer", "skip"]);
    assert_eq!(out["applied"], true);
    assert_eq!(out["state"]["mode"], "break");
    assert_eq!(out["state"]["completed_focus_count"], 1);
    assert_eq!(out["state"]["undo_available"], true);

    let export = run_json(home.path(), &["export"]);
    assert_eq!(export["sessions"].as_array().unwrap().len(), 1);
    assert_eq!(export["sessions"][0]["type"], "focus");

    let out = run_json(home.path(), &["timer", "undo"]);
    assert_eq!(out["applied"], true);
    assert_eq!(out["state"]["mode"], "focus");
    assert_eq!(out["state"]["run_status"], "running");
    assert_eq!(out["state"]["completed_focus_count"], 0);

    let export = run_json(home.path(), &["export"]);
    assert!(export["sessions"].as_array().unwrap().is_empty());
    assert_eq!(export["currentSession"]["type"], "focus");
}

#[test]
fn test_full_reset() {
    let home = TempDir::new().unwrap();
    run_text(home.path(), &["settings", "set", "focusTime", "600"]);
    run_json(home.path(), &["timer", "start"]);
    run_json(home.path(), &["timer", "skip"]);

    let out = run_json(home.path(), &["timer", "full-reset"]);
    assert_eq!(out["state"]["completed_focus_count"], 0);
    assert_eq!(out["state"]["countdown"], "10:00");
    assert_eq!(run_text(home.path(), &["settings", "get", "focusTime"]), "600");

    let out = run_json(home.path(), &["timer", "full-reset", "--settings"]);
    assert_eq!(out["state"]["countdown"], "25:00");
}

#[test]
fn test_settings_get_set() {
    let home = TempDir::new().unwrap();
    assert_eq!(run_text(home.path(), &["settings", "get", "focusTime"]), "1500");
    assert_eq!(run_text(home.path(), &["settings", "set", "focusTime", "900"]), "ok");
    assert_eq!(run_text(home.path(), &["settings", "get", "focusTime"]), "900");

    let out = run_json(home.path(), &["timer", "status"]);
    assert_eq!(out["state"]["countdown"], "15:00");

    let list = run_json(home.path(), &["settings", "list"]);
    assert_eq!(list["focusTime"], 900);
    assert_eq!(list["sessionsBeforeLongBreak"], 4);
}

#[test]
fn test_settings_rejects_bad_values() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["settings", "set", "visualCueIntensity", "11"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));

    let (_, _, code) = run_cli(home.path(), &["settings", "get", "noSuchSetting"]);
    assert_ne!(code, 0);

    assert_eq!(run_text(home.path(), &["settings", "get", "visualCueIntensity"]), "5");
}

#[test]
fn test_toggle_theme() {
    let home = TempDir::new().unwrap();
    assert_eq!(run_text(home.path(), &["settings", "toggle-theme"]), "light");
    assert_eq!(run_text(home.path(), &["settings", "toggle-theme"]), "dark");
}

#[test]
fn test_config_get_set() {
    let home = TempDir::new().unwrap();
    assert_eq!(
        run_text(home.path(), &["config", "get", "runtime.tick_interval_ms"]),
        "1000"
    );
    run_text(home.path(), &["config", "set", "runtime.tick_interval_ms", "250"]);
    assert_eq!(
        run_text(home.path(), &["config", "get", "runtime.tick_interval_ms"]),
        "250"
    );

    let (_, _, code) = run_cli(home.path(), &["config", "get", "nope.nothing"]);
    assert_ne!(code, 0);
}

#[test]
fn test_stats_empty() {
    let home = TempDir::new().unwrap();
    let report = run_json(home.path(), &["stats", "week", "--json"]);
    assert_eq!(report["timeframe"], "week");
    assert_eq!(report["has_data"], false);
    assert_eq!(report["summary"]["total_focus_minutes"], 0);

    let text = run_text(home.path(), &["stats"]);
    assert!(text.contains("No data available for the selected time period."));
}

#[test]
fn test_stats_after_session() {
    let home = TempDir::new().unwrap();
    run_json(home.path(), &["timer", "start"]);
    run_json(home.path(), &["timer", "skip"]);

    let report = run_json(home.path(), &["stats", "day", "--json"]);
    assert_eq!(report["has_data"], true);
    assert_eq!(report["summary"]["completed_sessions"], 1);
    assert_eq!(report["chart"].as_array().unwrap().len(), 1);
}

#[test]
fn test_export_to_directory() {
    let home = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    let printed = run_text(
        home.path(),
        &["export", "--out", out_dir.path().to_str().unwrap()],
    );
    let written = Path::new(&printed);
    let name = written.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("flow-timer-data-") && name.ends_with(".json"));

    let contents: Value = serde_json::from_str(&std::fs::read_to_string(written).unwrap()).unwrap();
    assert!(contents["sessions"].as_array().unwrap().is_empty());
}
