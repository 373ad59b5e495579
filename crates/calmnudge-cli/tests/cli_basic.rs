//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_calmnudge-cli"))
        .env("CALMNUDGE_HOME", home)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command {args:?} failed: {stderr}");
    stdout
}

fn parse_json(json: &str) -> serde_json::Value {
    serde_json::from_str(json).expect("Failed to parse JSON output")
}

fn home() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    // Keep results independent of the machine's local time zone.
    run_cli_success(dir.path(), &["config", "set", "quiet_hours.enabled", "false"]);
    dir
}

#[test]
fn test_evaluate_without_permission_skips() {
    let dir = home();
    let out = run_cli_success(dir.path(), &["reminder", "evaluate", "--json"]);
    let json = parse_json(&out);
    assert_eq!(json["outcome"], "skipped");
    assert_eq!(json["reason"]["type"], "no_permission");
}

#[test]
fn test_grant_schedules_then_cooldown() {
    let dir = home();

    let out = run_cli_success(dir.path(), &["permission", "request", "--grant"]);
    let json = parse_json(&out);
    assert_eq!(json["granted"], true);
    assert_eq!(json["decision"]["outcome"], "scheduled");

    let out = run_cli_success(dir.path(), &["reminder", "evaluate", "--json"]);
    let json = parse_json(&out);
    assert_eq!(json["reason"]["type"], "cooldown_active");

    let pending = parse_json(&run_cli_success(dir.path(), &["reminder", "pending"]));
    assert_eq!(pending.as_array().map(Vec::len), Some(1));

    let status = parse_json(&run_cli_success(dir.path(), &["reminder", "status", "--json"]));
    assert_eq!(status["phase"], "permission_granted_pending");
    assert_eq!(status["permission"], "granted");
}

#[test]
fn test_deny_leaves_nothing_scheduled() {
    let dir = home();
    let out = run_cli_success(dir.path(), &["permission", "request", "--deny"]);
    let json = parse_json(&out);
    assert_eq!(json["granted"], false);
    assert!(json["decision"].is_null());

    assert_eq!(run_cli_success(dir.path(), &["permission", "status"]).trim(), "denied");
    let pending = parse_json(&run_cli_success(dir.path(), &["reminder", "pending"]));
    assert_eq!(pending.as_array().map(Vec::len), Some(0));
}

#[test]
fn test_request_requires_an_answer() {
    let dir = home();
    let (_, _, code) = run_cli(dir.path(), &["permission", "request"]);
    assert_ne!(code, 0);
}

#[test]
fn test_disable_cancels_and_enable_respects_cooldown() {
    let dir = home();
    run_cli_success(dir.path(), &["permission", "request", "--grant"]);

    let out = run_cli_success(dir.path(), &["reminder", "disable"]);
    assert!(out.contains("cancelled"));
    let pending = parse_json(&run_cli_success(dir.path(), &["reminder", "pending"]));
    assert_eq!(pending.as_array().map(Vec::len), Some(0));

    let out = run_cli_success(dir.path(), &["reminder", "evaluate", "--json"]);
    assert_eq!(parse_json(&out)["reason"]["type"], "disabled");

    let out = run_cli_success(dir.path(), &["reminder", "enable"]);
    assert!(out.contains("cooldown active"), "unexpected output: {out}");
}

#[test]
fn test_revoke_cancels_pending() {
    let dir = home();
    run_cli_success(dir.path(), &["permission", "request", "--grant"]);

    let out = run_cli_success(dir.path(), &["permission", "revoke"]);
    assert_eq!(parse_json(&out)["reason"]["type"], "no_permission");

    let pending = parse_json(&run_cli_success(dir.path(), &["reminder", "pending"]));
    assert_eq!(pending.as_array().map(Vec::len), Some(0));
}

#[test]
fn test_delivered_clears_pending() {
    let dir = home();
    let out = run_cli_success(dir.path(), &["permission", "request", "--grant"]);
    let id = parse_json(&out)["decision"]["id"].as_str().unwrap().to_string();

    let out = run_cli_success(dir.path(), &["reminder", "delivered", &id]);
    assert!(out.contains("delivered"));
    let out = run_cli_success(dir.path(), &["reminder", "delivered", &id]);
    assert!(out.contains("not pending"));

    let status = parse_json(&run_cli_success(dir.path(), &["reminder", "status", "--json"]));
    assert_eq!(status["phase"], "permission_granted_no_reminder");
}

#[test]
fn test_evaluate_at_past_instant() {
    let dir = home();
    // Grant without scheduling so the cooldown is clear.
    run_cli_success(dir.path(), &["config", "set", "reminders.enabled", "false"]);
    run_cli_success(dir.path(), &["permission", "request", "--grant"]);
    run_cli_success(dir.path(), &["config", "set", "reminders.enabled", "true"]);

    let out = run_cli_success(
        dir.path(),
        &["reminder", "evaluate", "--at", "2020-01-06T12:00:00Z", "--json"],
    );
    let json = parse_json(&out);
    assert_eq!(json["outcome"], "scheduled");
    assert_eq!(json["fire_at"], "2020-01-06T12:00:00Z");
}

#[test]
fn test_activity_record_and_last() {
    let dir = home();
    run_cli_success(dir.path(), &["activity", "record", "breathing"]);
    let json = parse_json(&run_cli_success(dir.path(), &["activity", "last"]));
    assert!(json["last_breathing_completed_at"].is_string());
    assert!(json["last_test_completed_at"].is_null());

    let (_, stderr, code) = run_cli(dir.path(), &["activity", "record", "yoga"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("yoga"));
}

#[test]
fn test_config_get_set() {
    let dir = home();
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "reminders.cooldown_hours"]).trim(),
        "72"
    );
    run_cli_success(dir.path(), &["config", "set", "quiet_hours.start_hour", "21"]);
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "quiet_hours.start_hour"]).trim(),
        "21"
    );

    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "quiet_hours.end_hour", "25"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));
}
