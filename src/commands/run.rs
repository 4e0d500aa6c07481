//! `opsrun run` — execute one external command with captured output.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use crate::output::OutputContext;
use crate::retry::RetryPolicy;
use crate::runner::{CommandRunner, Invocation, Outcome};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Working directory for the command
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Environment override, repeatable (KEY=VALUE)
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Kill the command after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Return the exit status instead of treating non-zero as an error
    #[arg(long)]
    pub no_check: bool,

    /// Retry the command up to N times on failure
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Base delay between retries in milliseconds (doubles each attempt)
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub retry_base_ms: u64,

    /// The command and its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

fn parse_env(pairs: &[String]) -> Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .with_context(|| format!("invalid --env value '{pair}', expected KEY=VALUE"))
        })
        .collect()
}

fn build_invocation(args: &RunArgs) -> Result<Invocation> {
    let (program, rest) = args
        .command
        .split_first()
        .context("no command given")?;
    let mut inv = Invocation::new(program)
        .args(rest.iter().cloned())
        .check(!args.no_check);
    if let Some(dir) = &args.cwd {
        inv = inv.current_dir(dir);
    }
    for (key, value) in parse_env(&args.env)? {
        inv = inv.env(key, value);
    }
    if let Some(secs) = args.timeout {
        inv = inv.timeout(Duration::from_secs(secs));
    }
    Ok(inv)
}

fn emit(ctx: &OutputContext, outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        let obj = serde_json::json!({
            "code": outcome.code(),
            "stdout": outcome.stdout_text(),
            "stderr": outcome.stderr_text(),
            "duration_seconds": outcome.duration.as_secs_f64(),
        });
        println!("{}", serde_json::to_string_pretty(&obj).context("serializing outcome")?);
        return Ok(());
    }
    // Pass the child's streams through untouched.
    std::io::stdout()
        .write_all(&outcome.stdout)
        .context("writing captured stdout")?;
    std::io::stderr()
        .write_all(&outcome.stderr)
        .context("writing captured stderr")?;
    if outcome.success() {
        ctx.success(&format!(
            "exit 0 in {:.2}s",
            outcome.duration.as_secs_f64()
        ));
    } else {
        ctx.warn(&format!("exit {}", outcome.code()));
    }
    Ok(())
}

/// Run `opsrun run`.
///
/// # Errors
///
/// Returns an error if the command cannot be executed, or exits non-zero
/// without `--no-check` (after exhausting any retry budget).
pub async fn run(
    ctx: &OutputContext,
    runner: &impl CommandRunner,
    args: &RunArgs,
    json: bool,
) -> Result<()> {
    let inv = build_invocation(args)?;

    let outcome = if let Some(retries) = args.retries {
        let policy = RetryPolicy::new(
            retries.saturating_add(1),
            Duration::from_millis(args.retry_base_ms),
        );
        policy
            .run(|attempt| {
                if attempt > 1 {
                    ctx.info(&format!("retrying ({attempt}/{})", policy.max_attempts()));
                }
                runner.run(&inv)
            })
            .await?
    } else {
        runner.run(&inv).await?
    };

    emit(ctx, &outcome, json)
}
