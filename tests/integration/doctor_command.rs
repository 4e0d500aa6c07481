//! `opsrun doctor` tool probing.
//!
//! The hosts these tests run on may have none of the wrapped tools
//! installed, so assertions stick to the report shape.

#![allow(clippy::expect_used, deprecated)]

use assert_cmd::Command;

fn opsrun() -> Command {
    let mut cmd = Command::cargo_bin("opsrun").expect("opsrun binary should exist");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_doctor_json_reports_every_known_tool() {
    let output = opsrun()
        .args(["--json", "doctor"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value =
        serde_json::from_slice(&output).expect("stdout should be valid JSON");
    let tools = parsed["tools"].as_array().expect("tools array");

    let names: Vec<&str> = tools
        .iter()
        .map(|t| t["name"].as_str().expect("name"))
        .collect();
    for expected in ["terraform", "ansible", "docker", "kubectl"] {
        assert!(names.contains(&expected), "missing {expected}");
    }
    for tool in tools {
        assert!(tool["found"].is_boolean());
    }
}

#[test]
fn test_doctor_succeeds_even_when_tools_are_missing() {
    // A missing tool is a finding, not a failure.
    opsrun().arg("doctor").assert().success();
}
