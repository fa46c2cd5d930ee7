//! Corruption recovery tests for the repset binary.
//!
//! These tests verify the CLI can handle:
//! - Corrupted session and history files
//! - Missing data directories
//! - Unparseable config files

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = format!(
        "[data]\ndata_dir = {:?}\n\n[remote]\nbase_url = \"http://127.0.0.1:9/api/workouts\"\ntimeout_ms = 2000\n",
        temp_dir.path().join("data")
    );
    fs::write(temp_dir.path().join("config.toml"), config).unwrap();
    temp_dir
}

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("repset"));
    cmd.arg("--config").arg(dir.path().join("config.toml"));
    cmd
}

#[test]
fn test_corrupted_session_file_starts_fresh() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("session.json"), "{ invalid json }}}}").unwrap();

    cli(&temp_dir)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("No active session"));

    cli(&temp_dir)
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("Started session"));

    let contents = fs::read_to_string(data_dir.join("session.json")).unwrap();
    let session: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(session["status"], "preparing");
}

#[test]
fn test_corrupted_history_file_is_replaced_on_finish() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("history.json"), "[{\"id\": ").unwrap();

    cli(&temp_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No workouts yet"));

    cli(&temp_dir).arg("start").assert().success();
    cli(&temp_dir).arg("finish").assert().success();

    let contents = fs::read_to_string(data_dir.join("history.json")).unwrap();
    let history: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[test]
fn test_finished_session_on_disk_is_discarded() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(
        data_dir.join("session.json"),
        r#"{"id":"w1","startTime":1000,"endTime":2000,"status":"finished","exercises":[]}"#,
    )
    .unwrap();

    cli(&temp_dir)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("No active session"));
}

#[test]
fn test_missing_data_dir_is_created() {
    let temp_dir = setup_test_dir();
    let nested = temp_dir.path().join("a").join("b");

    cli(&temp_dir)
        .arg("--data-dir")
        .arg(&nested)
        .arg("start")
        .assert()
        .success();

    assert!(nested.join("session.json").exists());
}

#[test]
fn test_invalid_config_is_reported() {
    let temp_dir = setup_test_dir();
    fs::write(temp_dir.path().join("config.toml"), "[timer\ntick_ms = ").unwrap();

    cli(&temp_dir).arg("show").assert().failure();
}
