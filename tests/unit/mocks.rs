//! Shared mock infrastructure for unit tests.
//!
//! [`ScriptedRunner`] replays a queue of canned results and records every
//! invocation it sees, so tests can assert both the arguments a facade
//! builds and its handling of each outcome.

#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::Mutex;
use std::time::Duration;

use opsrun::runner::{CommandRunner, Invocation, Outcome, RunError};

// ── Outcome helpers ───────────────────────────────────────────────────────────

pub fn ok_outcome(stdout: &[u8]) -> Outcome {
    Outcome {
        status: ExitStatus::from_raw(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
        duration: Duration::from_millis(5),
    }
}

pub fn exit_outcome(code: i32, stderr: &[u8]) -> Outcome {
    Outcome {
        status: ExitStatus::from_raw(code << 8),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
        duration: Duration::from_millis(5),
    }
}

// ── ScriptedRunner ────────────────────────────────────────────────────────────

pub struct ScriptedRunner {
    responses: Mutex<VecDeque<Result<Outcome, RunError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new(responses: Vec<Result<Outcome, RunError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every invocation seen so far, rendered as command lines.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn next(&self, inv: &Invocation) -> Result<Outcome, RunError> {
        let response = self
            .responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected invocation: {}", inv.display()));

        // Mirror the production contract: check escalates non-zero exits.
        match response {
            Ok(outcome) if inv.check_value() && !outcome.success() => Err(RunError::NonZeroExit {
                program: inv.program().to_string(),
                code: outcome.code(),
                stdout: outcome.stdout_text(),
                stderr: outcome.stderr_text(),
            }),
            other => other,
        }
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, inv: &Invocation) -> Result<Outcome, RunError> {
        self.calls.lock().expect("calls lock").push(inv.display());
        self.next(inv)
    }

    async fn run_with_stdin(&self, inv: &Invocation, _input: &[u8]) -> Result<Outcome, RunError> {
        self.calls.lock().expect("calls lock").push(inv.display());
        self.next(inv)
    }

    async fn run_status(&self, inv: &Invocation) -> Result<ExitStatus, RunError> {
        self.calls.lock().expect("calls lock").push(inv.display());
        self.next(inv).map(|outcome| outcome.status)
    }

    async fn run_chain(&self, stages: &[Invocation]) -> Result<Outcome, RunError> {
        let rendered = stages
            .iter()
            .map(Invocation::display)
            .collect::<Vec<_>>()
            .join(" | ");
        self.calls.lock().expect("calls lock").push(rendered);
        let Some(last) = stages.last() else {
            panic!("empty chain");
        };
        self.next(last)
    }
}
