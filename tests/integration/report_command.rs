//! `opsrun report` writes a parseable artifact.

#![allow(clippy::expect_used, deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn opsrun() -> Command {
    let mut cmd = Command::cargo_bin("opsrun").expect("opsrun binary should exist");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_report_writes_json_with_expected_fields() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("pipeline_report.json");

    opsrun()
        .args(["report", "success", "--duration", "12.5", "--triggered-by", "scheduler"])
        .arg("--output")
        .arg(&path)
        .assert()
        .success();

    let content = std::fs::read_to_string(&path).expect("report file");
    let parsed: serde_json::Value = serde_json::from_str(&content).expect("valid JSON");
    assert_eq!(parsed["status"], "success");
    assert_eq!(parsed["triggered_by"], "scheduler");
    assert!((parsed["duration_seconds"].as_f64().expect("f64") - 12.5).abs() < f64::EPSILON);
    assert!(parsed["timestamp"].is_string());
}

#[test]
fn test_report_triggered_by_defaults_to_manual() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("report.json");

    opsrun()
        .args(["report", "failure", "--duration", "3"])
        .arg("--output")
        .arg(&path)
        .assert()
        .success();

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("report file"))
            .expect("valid JSON");
    assert_eq!(parsed["status"], "failure");
    assert_eq!(parsed["triggered_by"], "manual");
}

#[test]
fn test_report_rejects_unknown_status() {
    opsrun()
        .args(["report", "sideways", "--duration", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
