//! Config file loading through the `OPSRUN_CONFIG` override.

#![allow(clippy::expect_used, deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn opsrun() -> Command {
    let mut cmd = Command::cargo_bin("opsrun").expect("opsrun binary should exist");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    opsrun()
        .env("OPSRUN_CONFIG", dir.path().join("does-not-exist.yaml"))
        .args(["run", "echo", "defaults"])
        .assert()
        .success()
        .stdout(predicate::str::contains("defaults"));
}

#[test]
fn test_config_timeout_applies_to_every_run() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "timeout_secs: 1\n").expect("write config");

    opsrun()
        .env("OPSRUN_CONFIG", &path)
        .args(["run", "sleep", "10"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("timed out"));
}

#[test]
fn test_config_init_writes_a_restricted_default_file() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("config.yaml");

    opsrun()
        .env("OPSRUN_CONFIG", &path)
        .args(["config", "init"])
        .assert()
        .success();

    let content = std::fs::read_to_string(&path).expect("config file");
    assert!(content.contains("timeout_secs: 300"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path)
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn test_config_init_refuses_to_overwrite_without_force() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "timeout_secs: 7\n").expect("write config");

    opsrun()
        .env("OPSRUN_CONFIG", &path)
        .args(["config", "init"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--force"));

    opsrun()
        .env("OPSRUN_CONFIG", &path)
        .args(["config", "init", "--force"])
        .assert()
        .success();
    let content = std::fs::read_to_string(&path).expect("config file");
    assert!(content.contains("timeout_secs: 300"));
}

#[test]
fn test_config_show_prints_effective_values() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "timeout_secs: 42\n").expect("write config");

    opsrun()
        .env("OPSRUN_CONFIG", &path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("timeout_secs: 42"));
}

#[test]
fn test_unparsable_config_file_is_an_error() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "timeout_secs: [not a number\n").expect("write config");

    opsrun()
        .env("OPSRUN_CONFIG", &path)
        .args(["run", "echo", "hi"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot parse"));
}
