//! `opsrun pipe` against real processes.

#![allow(clippy::expect_used, deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn opsrun() -> Command {
    let mut cmd = Command::cargo_bin("opsrun").expect("opsrun binary should exist");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_pipe_two_stages_transforms_output() {
    opsrun()
        .args(["pipe", "echo cloud engineering", "tr a-z A-Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CLOUD ENGINEERING"));
}

#[test]
fn test_pipe_single_stage_behaves_like_run() {
    opsrun()
        .args(["pipe", "echo solo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("solo"));
}

#[test]
fn test_pipe_unresolvable_stage_fails() {
    opsrun()
        .args(["pipe", "echo hi", "nonexistent-tool-xyz"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("executable not found"));
}

#[test]
fn test_pipe_final_stage_failure_without_check_succeeds() {
    opsrun()
        .args(["pipe", "echo hi", "sh -c exit_1_does_not_exist"])
        .assert()
        .success()
        .stdout(predicate::str::contains("final stage exited"));
}

#[test]
fn test_pipe_check_escalates_final_stage_failure() {
    opsrun()
        .args(["pipe", "--check", "echo hi", "false"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("exited with status 1"));
}

#[test]
fn test_pipe_json_emits_final_stage_outcome() {
    let output = opsrun()
        .args(["--json", "pipe", "echo abc", "wc -c"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value =
        serde_json::from_slice(&output).expect("stdout should be valid JSON");
    assert_eq!(parsed["code"], 0);
    assert!(parsed["stdout"].as_str().expect("stdout").contains('4'));
}
