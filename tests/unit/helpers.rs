//! Sanity checks for the shared mock helpers themselves.

#![allow(clippy::expect_used)]

use crate::mocks::{ScriptedRunner, exit_outcome, ok_outcome};
use opsrun::runner::{CommandRunner, Invocation, RunError};

#[test]
fn test_outcome_helpers_carry_status_and_streams() {
    let ok = ok_outcome(b"fine\n");
    assert!(ok.success());
    assert_eq!(ok.stdout_text(), "fine\n");

    let err = exit_outcome(2, b"boom\n");
    assert!(!err.success());
    assert_eq!(err.code(), 2);
    assert_eq!(err.stderr_text(), "boom\n");
}

#[tokio::test]
async fn test_scripted_runner_replays_in_order_and_records_calls() {
    let runner = ScriptedRunner::new(vec![Ok(ok_outcome(b"one")), Ok(ok_outcome(b"two"))]);
    let first = runner
        .run(&Invocation::new("echo").arg("a"))
        .await
        .expect("first");
    let second = runner
        .run(&Invocation::new("echo").arg("b"))
        .await
        .expect("second");
    assert_eq!(first.stdout, b"one");
    assert_eq!(second.stdout, b"two");
    assert_eq!(runner.calls(), vec!["echo a", "echo b"]);
}

#[tokio::test]
async fn test_scripted_runner_escalates_checked_nonzero() {
    let runner = ScriptedRunner::new(vec![Ok(exit_outcome(1, b"denied"))]);
    let err = runner
        .run(&Invocation::new("terraform").arg("apply").check(true))
        .await
        .expect_err("check must escalate");
    assert!(matches!(err, RunError::NonZeroExit { code: 1, .. }));
}
