//! External-process invocation wrapper.
//!
//! Everything in this crate that touches an external tool (`terraform`,
//! `ansible-playbook`, `docker`, ...) goes through [`CommandRunner`]. The
//! production implementation uses tokio; test doubles can return canned
//! outcomes without spawning processes.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::AsyncReadExt;

/// One planned invocation of an external executable.
///
/// `check` is off by default: a non-zero exit is returned in the [`Outcome`]
/// and it is the caller's decision whether that is a failure. With
/// `check(true)` a non-zero exit becomes [`RunError::NonZeroExit`].
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    env_clear: bool,
    timeout: Option<Duration>,
    check: bool,
}

impl Invocation {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Working directory for the child. Defaults to the caller's own.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Add one environment override, merged into the inherited environment.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Replace the inherited environment instead of merging into it.
    /// Executable resolution still uses the parent's `PATH`.
    #[must_use]
    pub fn env_clear(mut self) -> Self {
        self.env_clear = true;
        self
    }

    /// Kill the child if it has not exited after `timeout`.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Escalate a non-zero exit to [`RunError::NonZeroExit`].
    #[must_use]
    pub fn check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn timeout_value(&self) -> Option<Duration> {
        self.timeout
    }

    #[must_use]
    pub fn check_value(&self) -> bool {
        self.check
    }

    #[must_use]
    pub fn cwd_value(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Environment overrides in insertion order.
    #[must_use]
    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }

    /// The invocation rendered as a shell-style line, for messages and logs.
    #[must_use]
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// What one invocation produced.
#[derive(Debug)]
pub struct Outcome {
    /// Exit status of the child.
    pub status: ExitStatus,
    /// Captured stdout bytes (empty in passthrough mode).
    pub stdout: Vec<u8>,
    /// Captured stderr bytes (empty in passthrough mode).
    pub stderr: Vec<u8>,
    /// Wall-clock time from spawn to exit.
    pub duration: Duration,
}

impl Outcome {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or -1 when the child was killed by a signal.
    #[must_use]
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    #[must_use]
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    #[must_use]
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Typed failure modes of one invocation.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("executable not found: {program}")]
    NotFound { program: String },

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code}\n{stderr}")]
    NonZeroExit {
        program: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("{program} timed out after {after:?}")]
    TimedOut { program: String, after: Duration },

    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command chain has no stages")]
    EmptyChain,
}

/// Generic command execution with timeout and guaranteed process kill.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] on resolution, spawn, timeout, or (with
    /// `check`) non-zero exit.
    async fn run(&self, inv: &Invocation) -> Result<Outcome, RunError>;

    /// Run a command with stdin piped from `input`, capturing output.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`CommandRunner::run`].
    async fn run_with_stdin(&self, inv: &Invocation, input: &[u8]) -> Result<Outcome, RunError>;

    /// Run a command with inherited stdio (interactive pass-through).
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] on resolution, spawn, timeout, or wait failure.
    async fn run_status(&self, inv: &Invocation) -> Result<ExitStatus, RunError>;

    /// Run a chain of commands, each stage's stdout piped into the next
    /// stage's stdin through an OS pipe. Only the final stage is captured;
    /// the chain's status is the final stage's status. The chain as a whole
    /// runs under one deadline: the largest per-stage timeout, or the
    /// runner's default when no stage sets one.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] if the chain is empty, a stage cannot be
    /// resolved or spawned, the deadline expires, or the final stage cannot
    /// be waited on. `check` on the final stage escalates its non-zero
    /// exit.
    async fn run_chain(&self, stages: &[Invocation]) -> Result<Outcome, RunError>;
}

impl<R: CommandRunner> CommandRunner for &R {
    async fn run(&self, inv: &Invocation) -> Result<Outcome, RunError> {
        (**self).run(inv).await
    }

    async fn run_with_stdin(&self, inv: &Invocation, input: &[u8]) -> Result<Outcome, RunError> {
        (**self).run_with_stdin(inv, input).await
    }

    async fn run_status(&self, inv: &Invocation) -> Result<ExitStatus, RunError> {
        (**self).run_status(inv).await
    }

    async fn run_chain(&self, stages: &[Invocation]) -> Result<Outcome, RunError> {
        (**self).run_chain(stages).await
    }
}

/// Resolve `program` to an executable path without spawning anything.
///
/// A name containing a path separator is checked directly (relative names
/// against `cwd` when given); a bare name is searched on `PATH`.
///
/// # Errors
///
/// Returns [`RunError::NotFound`] when no executable candidate exists.
pub fn resolve_program(program: &str, cwd: Option<&Path>) -> Result<PathBuf, RunError> {
    let not_found = || RunError::NotFound {
        program: program.to_string(),
    };

    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        let full = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            cwd.unwrap_or_else(|| Path::new(".")).join(candidate)
        };
        return if is_executable(&full) {
            Ok(full)
        } else {
            Err(not_found())
        };
    }

    let path_var = std::env::var_os("PATH").ok_or_else(not_found)?;
    for dir in std::env::split_paths(&path_var) {
        let full = dir.join(program);
        if is_executable(&full) {
            return Ok(full);
        }
    }
    Err(not_found())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Production [`CommandRunner`] — tokio process execution with guaranteed
/// timeout and kill on all platforms.
///
/// `tokio::time::timeout` around `.output().await` does not kill the child
/// when the timeout fires — the future is dropped but the OS process keeps
/// running. This implementation uses `tokio::select!` with an explicit
/// `child.kill()` instead.
pub struct TokioCommandRunner {
    default_timeout: Option<Duration>,
}

impl TokioCommandRunner {
    /// A runner that applies no timeout unless the invocation sets one.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_timeout: None,
        }
    }

    /// A runner that applies `timeout` to every invocation that does not
    /// set its own.
    #[must_use]
    pub fn with_default_timeout(timeout: Duration) -> Self {
        Self {
            default_timeout: Some(timeout),
        }
    }

    fn effective_timeout(&self, inv: &Invocation) -> Option<Duration> {
        inv.timeout.or(self.default_timeout)
    }

    fn command(inv: &Invocation, resolved: &Path) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(resolved);
        cmd.args(&inv.args);
        if let Some(dir) = &inv.cwd {
            cmd.current_dir(dir);
        }
        if inv.env_clear {
            cmd.env_clear();
        }
        for (key, value) in &inv.envs {
            cmd.env(key, value);
        }
        cmd.kill_on_drop(true);
        cmd
    }

    async fn collect(
        inv: &Invocation,
        mut child: tokio::process::Child,
        timeout: Option<Duration>,
        started: Instant,
    ) -> Result<Outcome, RunError> {
        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        // Drain stdout/stderr concurrently with wait(). If the child writes
        // more than the OS pipe buffer and nobody reads, it blocks on write
        // and wait() never resolves.
        let gather = async {
            let (status, stdout, stderr) = tokio::join!(
                child.wait(),
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stdout_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stderr_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
            );
            let status = status.map_err(|source| RunError::Wait {
                program: inv.program.clone(),
                source,
            })?;
            Ok(Outcome {
                status,
                stdout,
                stderr,
                duration: started.elapsed(),
            })
        };

        let outcome = if let Some(after) = timeout {
            tokio::select! {
                result = gather => result?,
                () = tokio::time::sleep(after) => {
                    let _ = child.kill().await;
                    return Err(RunError::TimedOut { program: inv.program.clone(), after });
                }
            }
        } else {
            gather.await?
        };

        if inv.check && !outcome.status.success() {
            return Err(RunError::NonZeroExit {
                program: inv.program.clone(),
                code: outcome.code(),
                stdout: outcome.stdout_text(),
                stderr: outcome.stderr_text(),
            });
        }
        Ok(outcome)
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, inv: &Invocation) -> Result<Outcome, RunError> {
        let resolved = resolve_program(&inv.program, inv.cwd.as_deref())?;
        let started = Instant::now();
        let child = Self::command(inv, &resolved)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunError::Launch {
                program: inv.program.clone(),
                source,
            })?;
        Self::collect(inv, child, self.effective_timeout(inv), started).await
    }

    async fn run_with_stdin(&self, inv: &Invocation, input: &[u8]) -> Result<Outcome, RunError> {
        let resolved = resolve_program(&inv.program, inv.cwd.as_deref())?;
        let started = Instant::now();
        let mut child = Self::command(inv, &resolved)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunError::Launch {
                program: inv.program.clone(),
                source,
            })?;

        // Feed stdin from a task so the write cannot deadlock against our
        // stdout/stderr reads.
        let stdin_handle = child.stdin.take();
        let input_owned = input.to_vec();
        tokio::spawn(async move {
            if let Some(mut stdin) = stdin_handle {
                use tokio::io::AsyncWriteExt;
                let _ = stdin.write_all(&input_owned).await;
            }
        });

        Self::collect(inv, child, self.effective_timeout(inv), started).await
    }

    async fn run_status(&self, inv: &Invocation) -> Result<ExitStatus, RunError> {
        let resolved = resolve_program(&inv.program, inv.cwd.as_deref())?;
        let mut child =
            Self::command(inv, &resolved)
                .spawn()
                .map_err(|source| RunError::Launch {
                    program: inv.program.clone(),
                    source,
                })?;

        let wait = async {
            child.wait().await.map_err(|source| RunError::Wait {
                program: inv.program.clone(),
                source,
            })
        };
        if let Some(after) = self.effective_timeout(inv) {
            tokio::select! {
                status = wait => status,
                () = tokio::time::sleep(after) => {
                    let _ = child.kill().await;
                    Err(RunError::TimedOut { program: inv.program.clone(), after })
                }
            }
        } else {
            wait.await
        }
    }

    async fn run_chain(&self, stages: &[Invocation]) -> Result<Outcome, RunError> {
        let Some((last, upstream)) = stages.split_last() else {
            return Err(RunError::EmptyChain);
        };

        // One deadline for the whole chain; a single hung stage must not
        // stall the pipeline forever.
        let timeout = stages
            .iter()
            .filter_map(|inv| inv.timeout)
            .max()
            .or(self.default_timeout);

        let started = Instant::now();
        let mut children = Vec::with_capacity(upstream.len());
        let mut prev_stdout: Option<tokio::process::ChildStdout> = None;

        for inv in upstream {
            let resolved = resolve_program(&inv.program, inv.cwd.as_deref())?;
            let mut cmd = Self::command(inv, &resolved);
            if let Some(out) = prev_stdout.take() {
                let stdio: Stdio = out.try_into().map_err(|source| RunError::Launch {
                    program: inv.program.clone(),
                    source,
                })?;
                cmd.stdin(stdio);
            }
            // The parent keeps no copy of this pipe's write end, so the
            // upstream stage sees EOF/SIGPIPE as soon as its reader exits.
            let mut child = cmd.stdout(Stdio::piped()).spawn().map_err(|source| {
                RunError::Launch {
                    program: inv.program.clone(),
                    source,
                }
            })?;
            prev_stdout = child.stdout.take();
            children.push(child);
        }

        let resolved = resolve_program(&last.program, last.cwd.as_deref())?;
        let mut cmd = Self::command(last, &resolved);
        if let Some(out) = prev_stdout.take() {
            let stdio: Stdio = out.try_into().map_err(|source| RunError::Launch {
                program: last.program.clone(),
                source,
            })?;
            cmd.stdin(stdio);
        }
        let mut final_child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunError::Launch {
                program: last.program.clone(),
                source,
            })?;

        let mut stdout_handle = final_child.stdout.take();
        let mut stderr_handle = final_child.stderr.take();

        // Drain the final stage while waiting on every stage; an upstream
        // stage can only finish once its reader keeps consuming.
        let gather = async {
            let (status, stdout, stderr) = tokio::join!(
                async {
                    for child in &mut children {
                        let _ = child.wait().await;
                    }
                    final_child.wait().await
                },
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stdout_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stderr_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
            );
            let status = status.map_err(|source| RunError::Wait {
                program: last.program.clone(),
                source,
            })?;
            Ok(Outcome {
                status,
                stdout,
                stderr,
                duration: started.elapsed(),
            })
        };

        let outcome = if let Some(after) = timeout {
            tokio::select! {
                result = gather => result?,
                () = tokio::time::sleep(after) => {
                    for child in &mut children {
                        let _ = child.kill().await;
                    }
                    let _ = final_child.kill().await;
                    return Err(RunError::TimedOut { program: last.program.clone(), after });
                }
            }
        } else {
            gather.await?
        };
        if last.check && !outcome.status.success() {
            return Err(RunError::NonZeroExit {
                program: last.program.clone(),
                code: outcome.code(),
                stdout: outcome.stdout_text(),
                stderr: outcome.stderr_text(),
            });
        }
        Ok(outcome)
    }
}
