//! Corruption recovery tests for the luna binary.
//!
//! The store policy is fail-open: a damaged preferences file must never
//! crash a command, and the next successful save must leave a valid file
//! behind.

use assert_cmd::Command;
use chrono::Duration;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn cli(data_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("luna"));
    cmd.arg("--data-dir").arg(data_dir.path());
    cmd
}

fn prefs_path(data_dir: &TempDir) -> std::path::PathBuf {
    data_dir.path().join("preferences.json")
}

#[test]
fn test_corrupted_preferences_file() {
    let data_dir = setup_test_dir();
    fs::write(prefs_path(&data_dir), "{ invalid json }}}}").unwrap();

    cli(&data_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No period data yet"));
}

#[test]
fn test_empty_preferences_file() {
    let data_dir = setup_test_dir();
    fs::write(prefs_path(&data_dir), "").unwrap();

    cli(&data_dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("No period data yet"));
}

#[test]
fn test_log_recovers_corrupted_file() {
    let data_dir = setup_test_dir();
    fs::write(prefs_path(&data_dir), "corrupted").unwrap();

    let start = chrono::Local::now().date_naive() - Duration::days(1);
    cli(&data_dir)
        .arg("log")
        .arg("--start")
        .arg(start.format("%Y-%m-%d").to_string())
        .arg("--days")
        .arg("5")
        .assert()
        .success();

    // The save replaced the damaged file with valid JSON.
    let contents = fs::read_to_string(prefs_path(&data_dir)).unwrap();
    let parsed: Result<serde_json::Value, _> = serde_json::from_str(&contents);
    assert!(parsed.is_ok(), "Preferences should be valid JSON");

    cli(&data_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cycle day: 2"));
}

#[test]
fn test_corrupted_history_value_only() {
    let data_dir = setup_test_dir();

    // A valid preferences file whose history value is garbage.
    fs::write(
        prefs_path(&data_dir),
        r#"{"default/cycle_history": "garbage", "default/average_cycle_length": 30}"#,
    )
    .unwrap();

    // History fails open to empty while the intact setting survives.
    cli(&data_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No period data yet"));
}

#[test]
fn test_missing_data_dir_is_created() {
    let data_dir = setup_test_dir();
    let nested = data_dir.path().join("deep").join("nested");

    let start = chrono::Local::now().date_naive() - Duration::days(1);
    Command::new(assert_cmd::cargo::cargo_bin!("luna"))
        .arg("--data-dir")
        .arg(&nested)
        .arg("log")
        .arg("--start")
        .arg(start.format("%Y-%m-%d").to_string())
        .arg("--days")
        .arg("3")
        .assert()
        .success();

    assert!(nested.join("preferences.json").exists());
}

#[test]
fn test_unknown_history_schema_version() {
    let data_dir = setup_test_dir();

    fs::write(
        prefs_path(&data_dir),
        r#"{"default/cycle_history": {"version": 99, "records": [{"start_date": "2024-06-10", "duration_days": 5}]}}"#,
    )
    .unwrap();

    cli(&data_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No period data yet"));
}
