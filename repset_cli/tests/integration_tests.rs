//! Integration tests for the repset binary.
//!
//! These tests verify end-to-end behavior including:
//! - Session lifecycle across separate invocations
//! - Exercise and set editing
//! - Offline finish keeping the workout locally
//! - Timers, stats and CSV export

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory with a hermetic config file.
///
/// The remote points at a closed port so every upload fails fast.
fn setup_test_dir() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = format!(
        r#"
[data]
data_dir = {:?}

[remote]
base_url = "http://127.0.0.1:9/api/workouts"
timeout_ms = 2000

[timer]
tick_ms = 50
"#,
        temp_dir.path().join("data")
    );
    fs::write(temp_dir.path().join("config.toml"), config).unwrap();
    temp_dir
}

/// Helper to get the CLI binary wired to the test config
fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("repset"));
    cmd.arg("--config").arg(dir.path().join("config.toml"));
    cmd
}

fn data_dir(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("data")
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn session(dir: &TempDir) -> Value {
    read_json(&data_dir(dir).join("session.json"))
}

#[test]
fn test_cli_help() {
    let dir = setup_test_dir();
    cli(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout session tracker"));
}

#[test]
fn test_start_creates_preparing_session() {
    let dir = setup_test_dir();

    cli(&dir)
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("Started session"));

    assert_eq!(session(&dir)["status"], "preparing");

    // A second start keeps the same session
    let id = session(&dir)["id"].clone();
    cli(&dir)
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("already open"));
    assert_eq!(session(&dir)["id"], id);
}

#[test]
fn test_add_exercise_copies_catalog_name() {
    let dir = setup_test_dir();
    cli(&dir).arg("start").assert().success();

    cli(&dir)
        .args(["add", "chest_bench_press"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Barbell Bench Press"));

    cli(&dir)
        .args(["add", "sled", "--name", "Sled Push"])
        .assert()
        .success();

    let s = session(&dir);
    let exercises = s["exercises"].as_array().unwrap();
    assert_eq!(exercises.len(), 2);
    assert_eq!(exercises[0]["exerciseId"], "chest_bench_press");
    assert_eq!(exercises[0]["sets"].as_array().unwrap().len(), 1);
    assert_eq!(exercises[1]["name"], "Sled Push");
}

#[test]
fn test_unknown_exercise_is_rejected() {
    let dir = setup_test_dir();
    cli(&dir).arg("start").assert().success();

    cli(&dir).args(["add", "not_an_exercise"]).assert().failure();

    assert!(session(&dir)["exercises"].as_array().unwrap().is_empty());
}

#[test]
fn test_editing_without_session_fails() {
    let dir = setup_test_dir();
    cli(&dir).args(["add", "legs_squat"]).assert().failure();
    cli(&dir).arg("clock").assert().failure();
}

#[test]
fn test_set_update_and_copy_forward() {
    let dir = setup_test_dir();
    cli(&dir).arg("start").assert().success();
    cli(&dir).args(["add", "legs_squat"]).assert().success();

    let s = session(&dir);
    let ex_id = s["exercises"][0]["id"].as_str().unwrap().to_string();
    let set_id = s["exercises"][0]["sets"][0]["id"].as_str().unwrap().to_string();

    cli(&dir)
        .args(["set", "update", &ex_id, &set_id, "--weight", "100", "--reps", "5"])
        .assert()
        .success();
    cli(&dir).args(["set", "add", &ex_id]).assert().success();

    let sets = session(&dir)["exercises"][0]["sets"].clone();
    let sets = sets.as_array().unwrap();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[1]["weight"], "100");
    assert_eq!(sets[1]["reps"], "5");
    assert_eq!(sets[1]["completed"], false);

    cli(&dir)
        .args(["set", "update", &ex_id, "missing-set", "--reps", "3"])
        .assert()
        .failure();
}

#[test]
fn test_clock_starts_once() {
    let dir = setup_test_dir();
    cli(&dir).arg("start").assert().success();

    cli(&dir).arg("clock").assert().success();
    assert_eq!(session(&dir)["status"], "active");

    cli(&dir).arg("clock").assert().failure();
}

#[test]
fn test_offline_finish_keeps_workout_locally() {
    let dir = setup_test_dir();
    cli(&dir).arg("start").assert().success();
    cli(&dir).args(["add", "back_deadlift"]).assert().success();
    cli(&dir).arg("clock").assert().success();

    cli(&dir)
        .arg("finish")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout saved"))
        .stderr(predicate::str::contains("Could not save workout to backend"));

    assert!(!data_dir(&dir).join("session.json").exists());

    let history = read_json(&data_dir(&dir).join("history.json"));
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["status"], "finished");
    assert_eq!(history[0]["exercises"][0]["name"], "Deadlift");

    cli(&dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deadlift"));
}

#[test]
fn test_finish_without_session() {
    let dir = setup_test_dir();
    cli(&dir)
        .arg("finish")
        .assert()
        .success()
        .stdout(predicate::str::contains("No active session"));
}

#[test]
fn test_history_refresh_offline_keeps_local() {
    let dir = setup_test_dir();
    cli(&dir)
        .args(["history", "--refresh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No workouts yet"))
        .stderr(predicate::str::contains("showing local history"));
}

#[test]
fn test_catalog_category_filter() {
    let dir = setup_test_dir();
    cli(&dir)
        .args(["catalog", "--category", "legs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("legs_squat"))
        .stdout(predicate::str::contains("chest_bench_press").not());

    cli(&dir)
        .args(["catalog", "--category", "wings"])
        .assert()
        .failure();
}

#[test]
fn test_interval_timer_runs_to_completion() {
    let dir = setup_test_dir();
    cli(&dir)
        .args(["timer", "--work", "3", "--rest", "3", "--rounds", "2"])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .success()
        .stdout(predicate::str::contains("Round 1/2 REST"))
        .stdout(predicate::str::contains("Round 2/2 WORK"))
        .stdout(predicate::str::contains("Done: 2 rounds"));
}

#[test]
fn test_timer_templates() {
    let dir = setup_test_dir();
    cli(&dir)
        .args(["timer", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tabata"))
        .stdout(predicate::str::contains("boxing"));

    cli(&dir).args(["timer", "no_such_template"]).assert().failure();
}

#[test]
fn test_stats_and_export_after_finish() {
    let dir = setup_test_dir();
    cli(&dir).arg("start").assert().success();
    cli(&dir).args(["add", "chest_bench_press"]).assert().success();

    let s = session(&dir);
    let ex_id = s["exercises"][0]["id"].as_str().unwrap().to_string();
    let set_id = s["exercises"][0]["sets"][0]["id"].as_str().unwrap().to_string();
    cli(&dir)
        .args(["set", "update", &ex_id, &set_id, "--weight", "100", "--reps", "5"])
        .assert()
        .success();
    cli(&dir).arg("finish").assert().success();

    cli(&dir)
        .args(["stats", "--exercise", "bench"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Workouts: 1"))
        .stdout(predicate::str::contains("116.7"));

    let csv_path = dir.path().join("export").join("history.csv");
    cli(&dir)
        .arg("export")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 rows"));

    let contents = fs::read_to_string(&csv_path).unwrap();
    assert!(contents.starts_with("workout_id,"));
    assert!(contents.contains("Barbell Bench Press"));
}

#[test]
fn test_completed_set_can_still_be_edited() {
    let dir = setup_test_dir();
    cli(&dir).arg("start").assert().success();
    cli(&dir).args(["add", "legs_squat"]).assert().success();

    let s = session(&dir);
    let ex_id = s["exercises"][0]["id"].as_str().unwrap().to_string();
    let set_id = s["exercises"][0]["sets"][0]["id"].as_str().unwrap().to_string();

    cli(&dir)
        .args(["set", "update", &ex_id, &set_id, "--weight", "100", "--reps", "5"])
        .assert()
        .success();
    cli(&dir)
        .args(["set", "update", &ex_id, &set_id, "--completed", "true"])
        .assert()
        .success();
    cli(&dir)
        .args(["set", "update", &ex_id, &set_id, "--weight", "105", "--reps", "4"])
        .assert()
        .success();

    let set = session(&dir)["exercises"][0]["sets"][0].clone();
    assert_eq!(set["weight"], "105");
    assert_eq!(set["reps"], "4");
    assert_eq!(set["completed"], true);
}

#[test]
fn test_catalog_detail_view() {
    let dir = setup_test_dir();
    cli(&dir)
        .args(["catalog", "back_pullup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PULL UP"))
        .stdout(predicate::str::contains("Latissimus Dorsi"))
        .stdout(predicate::str::contains("Biceps, Rhomboids"))
        .stdout(predicate::str::contains("Improves grip strength"));

    cli(&dir).args(["catalog", "back_nope"]).assert().failure();
    cli(&dir)
        .args(["catalog", "back_pullup", "--category", "back"])
        .assert()
        .failure();
}

#[test]
fn test_weight_log_and_show() {
    let dir = setup_test_dir();
    cli(&dir)
        .args(["weight", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No weight logged yet"));

    cli(&dir).args(["weight", "log", "82.5"]).assert().success();
    cli(&dir)
        .args(["weight", "log", "81"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged 81 kg"));

    cli(&dir)
        .args(["weight", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Latest weight: 81 kg"))
        .stdout(predicate::str::contains("-1.5 kg"));

    cli(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Latest weight: 81 kg"));

    let progress = read_json(&data_dir(&dir).join("progress.json"));
    assert_eq!(progress["weightLogs"].as_array().unwrap().len(), 2);

    cli(&dir).args(["weight", "log", "--", "-3"]).assert().failure();
}

#[test]
fn test_measurements_are_saved() {
    let dir = setup_test_dir();
    cli(&dir)
        .args(["measure", "--waist", "84 cm", "--arms", "38 cm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Waist  84 cm"))
        .stdout(predicate::str::contains("Chest").not());

    let progress = read_json(&data_dir(&dir).join("progress.json"));
    let m = &progress["measurements"][0];
    assert_eq!(m["waist"], "84 cm");
    assert_eq!(m["legs"], "");

    cli(&dir).arg("measure").assert().failure();
}

#[test]
fn test_config_init_and_show() {
    let dir = setup_test_dir();
    let path = dir.path().join("fresh").join("config.toml");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("repset"));
    cmd.arg("--config")
        .arg(&path)
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));
    assert!(path.exists());

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("repset"));
    cmd.arg("--config")
        .arg(&path)
        .args(["config", "--init"])
        .assert()
        .failure();

    cli(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[timer]"))
        .stdout(predicate::str::contains("tick_ms = 50"));
}
