//! `opsrun terraform` — drive a Terraform project directory.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};

use crate::config::Config;
use crate::output::{OutputContext, progress};
use crate::runner::CommandRunner;
use crate::tools::terraform::{DriftStatus, Terraform};

#[derive(Args, Debug)]
pub struct TerraformArgs {
    /// Input variable, repeatable (NAME=VALUE, passed as TF_VAR_<NAME>)
    #[arg(long = "var", value_name = "NAME=VALUE", global = true)]
    pub vars: Vec<String>,

    /// Enable terraform debug logging (TF_LOG=DEBUG)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: TerraformCommand,
}

#[derive(Subcommand, Debug)]
pub enum TerraformCommand {
    /// Initialize backend and modules
    Init,
    /// Validate the configuration
    Validate,
    /// Format configuration files
    Fmt,
    /// Preview changes, optionally saving the plan file
    Plan {
        /// Save the plan to this file (-out)
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
    /// Apply changes without interactive approval
    Apply,
    /// Destroy all managed infrastructure
    Destroy,
    /// Show current state resources
    Show,
    /// Print output variables as JSON
    Output,
    /// Create or select a workspace
    Workspace {
        /// Workspace name
        name: String,
        /// Create the workspace instead of selecting it
        #[arg(long)]
        new: bool,
    },
    /// Compare live infrastructure against the declared definition
    Drift {
        /// Exit with an error when drift is detected
        #[arg(long)]
        fail_on_drift: bool,
    },
}

/// Run `opsrun terraform <subcommand>`.
///
/// # Errors
///
/// Returns an error if terraform fails, prints unparsable JSON, or — with
/// `--fail-on-drift` — reports drift.
pub async fn run(
    ctx: &OutputContext,
    runner: &impl CommandRunner,
    config: &Config,
    args: TerraformArgs,
    json: bool,
) -> Result<()> {
    let mut tf = Terraform::new(runner, &config.terraform_dir);
    for pair in &args.vars {
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("invalid --var value '{pair}', expected NAME=VALUE"))?;
        tf = tf.with_var(name, value);
    }
    if args.debug {
        tf = tf.with_debug_logging();
    }

    match args.command {
        TerraformCommand::Init => {
            tf.init().await?;
            ctx.success("Terraform initialized");
        }
        TerraformCommand::Validate => {
            tf.validate().await?;
            ctx.success("Configuration is valid");
        }
        TerraformCommand::Fmt => {
            let outcome = tf.fmt().await?;
            for file in outcome.stdout_text().lines() {
                ctx.kv("formatted", file);
            }
            ctx.success("Formatting done");
        }
        TerraformCommand::Plan { out } => {
            let spinner = ctx
                .show_progress()
                .then(|| progress::spinner("Planning changes..."));
            let outcome = tf.plan(out.as_deref()).await?;
            if let Some(pb) = spinner {
                if outcome.success() {
                    progress::finish_ok(&pb, "Plan complete");
                } else {
                    progress::finish_err(&pb, "Plan failed");
                }
            }
            print!("{}", outcome.stdout_text());
            if !outcome.success() {
                bail!("terraform plan exited {}", outcome.code());
            }
        }
        TerraformCommand::Apply => {
            let spinner = ctx
                .show_progress()
                .then(|| progress::spinner("Applying changes..."));
            let result = tf.apply().await;
            if let Some(pb) = &spinner {
                match &result {
                    Ok(_) => progress::finish_ok(pb, "Infrastructure applied"),
                    Err(_) => progress::finish_err(pb, "Apply failed"),
                }
            }
            result?;
            if spinner.is_none() {
                ctx.success("Infrastructure applied");
            }
        }
        TerraformCommand::Destroy => {
            tf.destroy().await?;
            ctx.success("Infrastructure destroyed");
        }
        TerraformCommand::Show => {
            let resources = tf.state_resources().await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&resources).context("serializing resources")?
                );
            } else if resources.is_empty() {
                ctx.info("No resources in state.");
            } else {
                ctx.header("State resources");
                for address in &resources {
                    ctx.kv("resource", address);
                }
            }
        }
        TerraformCommand::Output => {
            let outputs = tf.outputs().await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&outputs).context("serializing outputs")?
            );
        }
        TerraformCommand::Workspace { name, new } => {
            if new {
                tf.workspace_new(&name).await?;
            }
            tf.workspace_select(&name).await?;
            ctx.success(&format!("Workspace '{name}' selected"));
        }
        TerraformCommand::Drift { fail_on_drift } => {
            let status = tf.detect_drift().await?;
            if json {
                let drifted = status == DriftStatus::Drifted;
                println!("{}", serde_json::json!({ "drifted": drifted }));
            }
            match status {
                DriftStatus::InSync => ctx.success("Infrastructure matches its definition"),
                DriftStatus::Drifted if fail_on_drift => {
                    bail!("drift detected: live infrastructure deviates from its definition")
                }
                DriftStatus::Drifted => ctx.warn("Drift detected in infrastructure"),
            }
        }
    }
    Ok(())
}
