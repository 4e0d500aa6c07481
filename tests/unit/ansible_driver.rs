//! Unit tests for the Ansible facade.

#![allow(clippy::expect_used)]

use crate::mocks::{ScriptedRunner, exit_outcome, ok_outcome};
use opsrun::tools::ansible::{Ansible, PlaybookParams};

#[tokio::test]
async fn test_ping_builds_ad_hoc_invocation() {
    let runner = ScriptedRunner::new(vec![Ok(ok_outcome(b"web1 | SUCCESS"))]);
    Ansible::new(&runner)
        .ping("inventory.ini", "all")
        .await
        .expect("ping");
    assert_eq!(runner.calls(), vec!["ansible all -i inventory.ini -m ping"]);
}

#[tokio::test]
async fn test_ping_reports_unreachable_hosts_as_outcome() {
    // Unreachable hosts are an outcome for the caller to inspect, not an
    // error from the driver.
    let runner = ScriptedRunner::new(vec![Ok(exit_outcome(4, b"web1 | UNREACHABLE!"))]);
    let outcome = Ansible::new(&runner)
        .ping("inventory.ini", "web*")
        .await
        .expect("ping runs");
    assert!(!outcome.success());
    assert_eq!(outcome.code(), 4);
}

#[tokio::test]
async fn test_playbook_failure_escalates() {
    let runner = ScriptedRunner::new(vec![Ok(exit_outcome(2, b"fatal: task failed"))]);
    let params = PlaybookParams::new("deploy.yml", "inventory.ini");
    let err = Ansible::new(&runner)
        .playbook(&params)
        .await
        .expect_err("failed playbook must escalate");
    assert!(format!("{err:#}").contains("deploy.yml"));
}

#[tokio::test]
async fn test_playbook_renders_full_parameter_set() {
    let runner = ScriptedRunner::new(vec![Ok(ok_outcome(b""))]);
    let mut params = PlaybookParams::new("site.yml", "inventory.ini");
    params.limit = Some("web1".to_string());
    params.check_mode = true;
    Ansible::new(&runner)
        .playbook(&params)
        .await
        .expect("playbook");
    assert_eq!(
        runner.calls(),
        vec!["ansible-playbook -i inventory.ini site.yml --limit web1 --check"]
    );
}

#[tokio::test]
async fn test_lint_tolerates_findings() {
    let runner = ScriptedRunner::new(vec![Ok(exit_outcome(
        2,
        b"yaml[line-length]: line too long",
    ))]);
    let outcome = Ansible::new(&runner)
        .lint("site.yml")
        .await
        .expect("lint findings are not a driver error");
    assert!(!outcome.success());
}

#[tokio::test]
async fn test_vault_encrypt_and_decrypt_invocations() {
    let runner = ScriptedRunner::new(vec![Ok(ok_outcome(b"")), Ok(ok_outcome(b""))]);
    let ansible = Ansible::new(&runner)
        .with_vault_password("s3cret")
        .expect("vault password file");
    ansible.vault_encrypt("secrets.yml").await.expect("encrypt");
    ansible.vault_decrypt("secrets.yml").await.expect("decrypt");
    assert_eq!(
        runner.calls(),
        vec![
            "ansible-vault encrypt secrets.yml",
            "ansible-vault decrypt secrets.yml",
        ]
    );
}
