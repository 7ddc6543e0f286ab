use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join(relative)
}

/// Command isolated from any config in the user's home directory.
fn dacc(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("dacc").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn hours_lists_twenty_five_positions_on_fall_back_day() {
    let home = tempdir().unwrap();
    let output = dacc(home.path())
        .args(["hours", "--date", "2019-10-27"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(25 hours)"))
        .stdout(predicate::str::contains("CC-RAO_20191027_B230_V01.json"))
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let rows = text
        .lines()
        .filter(|line| line.contains("CC-RAO_20191027_"))
        .count();
    assert_eq!(rows, 25);
}

#[test]
fn hours_lists_twenty_three_positions_on_spring_forward_day() {
    let home = tempdir().unwrap();
    dacc(home.path())
        .args(["hours", "--date", "2019-03-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(23 hours)"))
        .stdout(predicate::str::contains("_0230_").not());
}

#[test]
fn name_hourly_marks_repeated_hour() {
    let home = tempdir().unwrap();
    dacc(home.path())
        .args([
            "name",
            "hourly",
            "--instant",
            "2019-10-27T01:00Z",
            "--version",
            "2",
        ])
        .assert()
        .success()
        .stdout("CC-RAO_20191027_B230_V02.json\n");
}

#[test]
fn name_daily_uses_artifact_prefix() {
    let home = tempdir().unwrap();
    dacc(home.path())
        .args([
            "name",
            "daily",
            "--date",
            "2019-01-08",
            "--version",
            "3",
            "--artifact",
            "manifest",
        ])
        .assert()
        .success()
        .stdout("CC-MANIFEST_20190108_V03.json\n");
}

#[test]
fn name_rejects_malformed_instant() {
    let home = tempdir().unwrap();
    dacc(home.path())
        .args(["name", "hourly", "--instant", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn run_exports_daily_artifacts() {
    let home = tempdir().unwrap();
    let out = tempdir().unwrap();
    let data = repo_path("test_data/day_2019_01_08");
    dacc(home.path())
        .args([
            "run",
            "--request",
            data.join("request.json").to_str().unwrap(),
            "--constraints",
            data.join("constraints.json").to_str().unwrap(),
            "--outcomes",
            data.join("outcomes.json").to_str().unwrap(),
            "--out",
            out.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("4 success, 1 failure"))
        .stdout(predicate::str::contains("Loop-flow computation diverged"));

    let document: Value = serde_json::from_str(
        &fs::read_to_string(out.path().join("CC-DAILY_20190108_V01.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(document["variants"].as_array().unwrap().len(), 6);
    assert!(out.path().join("CC-MANIFEST_20190108_V01.json").exists());
    assert!(out.path().join("CC-LOG_20190108_V01.json").exists());

    let limits: Vec<f64> = document["constraints"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["id"] == "NL_CB_0003")
        .map(|c| c["limit"].as_f64().unwrap())
        .collect();
    assert_eq!(limits, vec![1200.0, 1100.0]);
}

#[test]
fn config_init_then_show() {
    let home = tempdir().unwrap();
    let path = home.path().join("custom.toml");
    dacc(home.path())
        .args(["--config", path.to_str().unwrap(), "config", "init"])
        .assert()
        .success();
    assert!(path.exists());

    dacc(home.path())
        .args(["--config", path.to_str().unwrap(), "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("timeout_minutes = 60"))
        .stdout(predicate::str::contains("Europe/Brussels"));

    dacc(home.path())
        .args(["--config", path.to_str().unwrap(), "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
