//! `opsrun config` — inspect and initialize the config file.

use anyhow::{Context, Result, bail};
use clap::Subcommand;

use crate::config::{Config, ConfigStore};
use crate::output::OutputContext;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write a default config file to edit
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run `opsrun config <subcommand>`.
///
/// # Errors
///
/// Returns an error if the config file cannot be written, or exists and
/// `--force` was not given.
pub fn run(ctx: &OutputContext, config: &Config, cmd: ConfigCommand, json: bool) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(config).context("serializing config")?
                );
            } else {
                print!(
                    "{}",
                    serde_yaml::to_string(config).context("serializing config")?
                );
            }
        }
        ConfigCommand::Init { force } => {
            let path = ConfigStore::path()?;
            if path.exists() && !force {
                bail!(
                    "config file {} already exists; pass --force to overwrite",
                    path.display()
                );
            }
            ConfigStore::save(&Config::default())?;
            ctx.success(&format!("Wrote {}", path.display()));
        }
    }
    Ok(())
}
