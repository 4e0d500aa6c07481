//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use crate::config::ConfigStore;
use crate::output::OutputContext;
use crate::runner::TokioCommandRunner;

/// Automation command runner for DevOps pipelines
#[derive(Parser)]
#[command(
    name = "opsrun",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute one external command
    Run(commands::run::RunArgs),

    /// Chain commands through OS pipes
    Pipe(commands::pipe::PipeArgs),

    /// Drive a Terraform project
    Terraform(commands::terraform::TerraformArgs),

    /// Drive Ansible playbooks and vault
    #[command(subcommand)]
    Ansible(commands::ansible::AnsibleCommand),

    /// Drive Docker images and containers
    #[command(subcommand)]
    Docker(commands::docker::DockerCommand),

    /// Trigger and poll remote CI pipelines
    #[command(subcommand)]
    Ci(commands::ci::CiCommand),

    /// Inspect and initialize the config file
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Check that wrapped tools are present and usable
    Doctor,

    /// Write a structured pipeline report
    Report(commands::report::ReportArgs),

    /// Post a message to the configured webhook
    Notify(commands::notify::NotifyArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            no_color,
            quiet,
            json,
            command,
        } = self;

        if let Command::Version = command {
            commands::version::run(json);
            return Ok(());
        }

        let ctx = OutputContext::new(no_color, quiet);
        let config = ConfigStore::load()?;
        let runner = TokioCommandRunner::with_default_timeout(config.timeout());

        match command {
            Command::Run(args) => commands::run::run(&ctx, &runner, &args, json).await,
            Command::Pipe(args) => commands::pipe::run(&ctx, &runner, &args, json).await,
            Command::Terraform(args) => {
                commands::terraform::run(&ctx, &runner, &config, args, json).await
            }
            Command::Ansible(cmd) => commands::ansible::run(&ctx, &runner, &config, cmd).await,
            Command::Docker(cmd) => commands::docker::run(&ctx, &runner, cmd, json).await,
            Command::Ci(cmd) => commands::ci::run(&ctx, cmd, json).await,
            Command::Config(cmd) => commands::config::run(&ctx, &config, cmd, json),
            Command::Doctor => commands::doctor::run(&ctx, &runner, json).await,
            Command::Report(args) => commands::report::run(&ctx, &args),
            Command::Notify(args) => commands::notify::run(&ctx, &config, &args).await,
            Command::Version => Ok(()),
        }
    }
}
