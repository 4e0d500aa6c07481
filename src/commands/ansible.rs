//! `opsrun ansible` — ad-hoc pings, playbook runs, vault, and lint.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};

use crate::config::Config;
use crate::output::OutputContext;
use crate::runner::CommandRunner;
use crate::tools::ansible::{Ansible, PlaybookParams};

#[derive(Subcommand, Debug)]
pub enum AnsibleCommand {
    /// Connectivity check against the inventory
    Ping {
        /// Host pattern to ping
        #[arg(default_value = "all")]
        pattern: String,
    },
    /// Run a playbook
    Playbook(PlaybookArgs),
    /// Check a playbook against best practices
    Lint {
        /// Playbook file
        playbook: String,
    },
    /// Encrypt a file with ansible-vault
    Encrypt {
        /// File to encrypt
        file: String,
    },
    /// Decrypt a file with ansible-vault
    Decrypt {
        /// File to decrypt
        file: String,
    },
}

#[derive(Args, Debug)]
pub struct PlaybookArgs {
    /// Playbook file
    pub playbook: String,

    /// Inventory file (defaults to the configured inventory)
    #[arg(short, long, value_name = "FILE")]
    pub inventory: Option<String>,

    /// Restrict execution to matching hosts
    #[arg(long, value_name = "PATTERN")]
    pub limit: Option<String>,

    /// Extra variable, repeatable (KEY=VALUE)
    #[arg(long = "extra-var", value_name = "KEY=VALUE")]
    pub extra_vars: Vec<String>,

    /// Dry-run: report changes without making them
    #[arg(long)]
    pub check: bool,

    /// Increase verbosity (repeatable, up to -vvvv)
    #[arg(short, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only run tasks with these tags (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Skip tasks with these tags (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skip_tags: Vec<String>,
}

fn inventory_of(explicit: Option<&str>, config: &Config) -> Result<String> {
    if let Some(inventory) = explicit {
        return Ok(inventory.to_string());
    }
    match &config.inventory {
        Some(inventory) => Ok(inventory.clone()),
        None => bail!("no inventory given; pass --inventory or set `inventory` in the config"),
    }
}

fn driver<R: CommandRunner>(runner: R) -> Result<Ansible<R>> {
    // Vault secrets come from the environment, never the command line.
    match std::env::var("OPSRUN_VAULT_PASSWORD") {
        Ok(password) => Ansible::new(runner).with_vault_password(&password),
        Err(_) => Ok(Ansible::new(runner)),
    }
}

/// Run `opsrun ansible <subcommand>`.
///
/// # Errors
///
/// Returns an error if the underlying tool fails or no inventory is
/// configured.
pub async fn run(
    ctx: &OutputContext,
    runner: &impl CommandRunner,
    config: &Config,
    cmd: AnsibleCommand,
) -> Result<()> {
    let ansible = driver(runner)?;

    match cmd {
        AnsibleCommand::Ping { pattern } => {
            let inventory = inventory_of(None, config)?;
            let outcome = ansible.ping(&inventory, &pattern).await?;
            print!("{}", outcome.stdout_text());
            if outcome.success() {
                ctx.success("All hosts reachable");
            } else {
                bail!("some hosts are unreachable");
            }
        }
        AnsibleCommand::Playbook(args) => {
            let mut params =
                PlaybookParams::new(&args.playbook, inventory_of(args.inventory.as_deref(), config)?);
            params.limit = args.limit.clone();
            params.extra_vars = args
                .extra_vars
                .iter()
                .map(|pair| {
                    pair.split_once('=')
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .with_context(|| {
                            format!("invalid --extra-var value '{pair}', expected KEY=VALUE")
                        })
                })
                .collect::<Result<_>>()?;
            params.check_mode = args.check;
            params.verbosity = args.verbose;
            params.tags = args.tags.clone();
            params.skip_tags = args.skip_tags.clone();

            let outcome = ansible.playbook(&params).await?;
            print!("{}", outcome.stdout_text());
            ctx.success(&format!("Playbook {} finished", args.playbook));
        }
        AnsibleCommand::Lint { playbook } => {
            let outcome = ansible.lint(&playbook).await?;
            print!("{}", outcome.stdout_text());
            if outcome.success() {
                ctx.success("No lint findings");
            } else {
                ctx.warn("Lint reported findings");
            }
        }
        AnsibleCommand::Encrypt { file } => {
            ansible.vault_encrypt(&file).await?;
            ctx.success(&format!("{file} encrypted"));
        }
        AnsibleCommand::Decrypt { file } => {
            ansible.vault_decrypt(&file).await?;
            ctx.success(&format!("{file} decrypted"));
            ctx.warn("Re-encrypt as soon as the plaintext is no longer needed");
        }
    }
    Ok(())
}
