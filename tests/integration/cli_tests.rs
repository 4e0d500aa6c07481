//! CLI skeleton tests: help, version, and command hierarchy.

#![allow(clippy::expect_used, deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn opsrun() -> Command {
    let mut cmd = Command::cargo_bin("opsrun").expect("opsrun binary should exist");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    // clap with arg_required_else_help shows help on stderr and exits 2
    opsrun()
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "Automation command runner for DevOps pipelines",
        ));
}

#[test]
fn test_cli_help_flag_shows_help() {
    opsrun()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    opsrun()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("opsrun"));
}

#[test]
fn test_version_command_shows_version() {
    opsrun()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("opsrun 0.2.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    opsrun()
        .arg("version")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"version":"0.2.0"}"#));
}

#[test]
fn test_help_lists_all_commands() {
    let listed = [
        "run", "pipe", "terraform", "ansible", "docker", "ci", "config", "doctor", "report",
        "notify",
    ];
    for command in listed {
        opsrun()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(command));
    }
}

#[test]
fn test_ci_dispatch_requires_a_token() {
    opsrun()
        .env_remove("GITHUB_TOKEN")
        .args(["ci", "github-dispatch", "deploy.yml", "--repo", "acme/infra"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--token"));
}

#[test]
fn test_unknown_command_fails() {
    opsrun()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
