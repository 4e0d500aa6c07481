//! `opsrun pipe` — chain commands through OS pipes.
//!
//! Each stage is one quoted argument, split on whitespace:
//! `opsrun pipe "echo cloud engineering" "tr a-z A-Z"`.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Args;

use crate::output::OutputContext;
use crate::runner::{CommandRunner, Invocation};

#[derive(Args, Debug)]
pub struct PipeArgs {
    /// Treat a non-zero exit of the final stage as an error
    #[arg(long)]
    pub check: bool,

    /// Pipeline stages, one quoted command each
    #[arg(required = true, num_args = 1.., value_name = "STAGE")]
    pub stages: Vec<String>,
}

fn parse_stages(stages: &[String], check: bool) -> Result<Vec<Invocation>> {
    let mut parsed = Vec::with_capacity(stages.len());
    for stage in stages {
        let mut tokens = stage.split_whitespace();
        let Some(program) = tokens.next() else {
            bail!("empty pipeline stage");
        };
        parsed.push(Invocation::new(program).args(tokens.map(str::to_string)));
    }
    if check {
        if let Some(last) = parsed.pop() {
            parsed.push(last.check(true));
        }
    }
    Ok(parsed)
}

/// Run `opsrun pipe`.
///
/// # Errors
///
/// Returns an error if any stage cannot be spawned, or — with `--check` —
/// if the final stage exits non-zero.
pub async fn run(
    ctx: &OutputContext,
    runner: &impl CommandRunner,
    args: &PipeArgs,
    json: bool,
) -> Result<()> {
    let stages = parse_stages(&args.stages, args.check)?;
    let outcome = runner.run_chain(&stages).await?;

    if json {
        let obj = serde_json::json!({
            "code": outcome.code(),
            "stdout": outcome.stdout_text(),
            "duration_seconds": outcome.duration.as_secs_f64(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&obj).context("serializing outcome")?
        );
        return Ok(());
    }

    std::io::stdout()
        .write_all(&outcome.stdout)
        .context("writing captured stdout")?;
    if !outcome.success() {
        ctx.warn(&format!("final stage exited {}", outcome.code()));
    }
    Ok(())
}
