//! Ansible CLI facade: ad-hoc modules, playbooks, vault, and lint.

use std::io::Write;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::runner::{CommandRunner, Invocation, Outcome};

/// Parameters for one `ansible-playbook` run. Struct-based so adding a flag
/// later doesn't break every call site.
#[derive(Debug, Clone, Default)]
pub struct PlaybookParams {
    /// Playbook file, e.g. `site.yml`.
    pub playbook: String,
    /// Inventory file or dynamic inventory plugin config, e.g.
    /// `inventory.ini` or `aws_ec2.yml`.
    pub inventory: String,
    /// Restrict execution to matching hosts (`--limit`).
    pub limit: Option<String>,
    /// Extra variables, passed as `--extra-vars "k=v k=v"`.
    pub extra_vars: Vec<(String, String)>,
    /// Dry-run (`--check`): report what would change without changing it.
    pub check_mode: bool,
    /// Verbosity level 0-4, rendered as `-v` through `-vvvv`.
    pub verbosity: u8,
    /// Only run tasks with these tags (`--tags`).
    pub tags: Vec<String>,
    /// Skip tasks with these tags (`--skip-tags`).
    pub skip_tags: Vec<String>,
}

impl PlaybookParams {
    #[must_use]
    pub fn new(playbook: impl Into<String>, inventory: impl Into<String>) -> Self {
        Self {
            playbook: playbook.into(),
            inventory: inventory.into(),
            ..Self::default()
        }
    }

    fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-i".to_string(), self.inventory.clone(), self.playbook.clone()];
        if let Some(limit) = &self.limit {
            args.push("--limit".to_string());
            args.push(limit.clone());
        }
        if !self.extra_vars.is_empty() {
            let rendered = self
                .extra_vars
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(" ");
            args.push("--extra-vars".to_string());
            args.push(rendered);
        }
        if self.check_mode {
            args.push("--check".to_string());
        }
        if self.verbosity > 0 {
            let level = usize::from(self.verbosity.min(4));
            args.push(format!("-{}", "v".repeat(level)));
        }
        if !self.tags.is_empty() {
            args.push("--tags".to_string());
            args.push(self.tags.join(","));
        }
        if !self.skip_tags.is_empty() {
            args.push("--skip-tags".to_string());
            args.push(self.skip_tags.join(","));
        }
        args
    }
}

/// Ansible driver over a [`CommandRunner`].
pub struct Ansible<R> {
    runner: R,
    vault_password_file: Option<NamedTempFile>,
}

impl<R: CommandRunner> Ansible<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            vault_password_file: None,
        }
    }

    /// Write the vault password to a mode-600 scratch file and point every
    /// subsequent command at it via `ANSIBLE_VAULT_PASSWORD_FILE`. The file
    /// is deleted when this driver is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch file cannot be created or written.
    pub fn with_vault_password(mut self, password: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(".vault-pass-")
            .tempfile()
            .context("cannot create vault password file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o600))
                .context("cannot restrict vault password file permissions")?;
        }
        file.write_all(password.as_bytes())
            .context("cannot write vault password file")?;
        file.flush().context("cannot flush vault password file")?;
        self.vault_password_file = Some(file);
        Ok(self)
    }

    fn invocation(&self, program: &str, args: Vec<String>) -> Invocation {
        let mut inv = Invocation::new(program).args(args);
        if let Some(file) = &self.vault_password_file {
            inv = inv.env(
                "ANSIBLE_VAULT_PASSWORD_FILE",
                file.path().to_string_lossy().into_owned(),
            );
        }
        inv
    }

    /// `ansible <pattern> -i <inventory> -m ping` — connectivity check
    /// before running a real playbook.
    ///
    /// # Errors
    ///
    /// Returns an error only if ansible cannot be run at all; unreachable
    /// hosts show up as a non-zero outcome.
    pub async fn ping(&self, inventory: &str, pattern: &str) -> Result<Outcome> {
        let args = vec![
            pattern.to_string(),
            "-i".to_string(),
            inventory.to_string(),
            "-m".to_string(),
            "ping".to_string(),
        ];
        self.runner
            .run(&self.invocation("ansible", args))
            .await
            .context("ansible ping failed to run")
    }

    /// `ansible-playbook` with the given parameters, checked.
    ///
    /// # Errors
    ///
    /// Returns an error if the playbook fails on any host.
    pub async fn playbook(&self, params: &PlaybookParams) -> Result<Outcome> {
        self.runner
            .run(&self.invocation("ansible-playbook", params.to_args()).check(true))
            .await
            .with_context(|| format!("ansible-playbook {} failed", params.playbook))
    }

    /// `ansible-vault encrypt <file>`.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails (wrong password, already
    /// encrypted).
    pub async fn vault_encrypt(&self, file: &str) -> Result<Outcome> {
        self.runner
            .run(
                &self
                    .invocation("ansible-vault", vec!["encrypt".to_string(), file.to_string()])
                    .check(true),
            )
            .await
            .with_context(|| format!("ansible-vault encrypt {file} failed"))
    }

    /// `ansible-vault decrypt <file>`. Callers should re-encrypt as soon as
    /// the plaintext is no longer needed.
    ///
    /// # Errors
    ///
    /// Returns an error if decryption fails.
    pub async fn vault_decrypt(&self, file: &str) -> Result<Outcome> {
        self.runner
            .run(
                &self
                    .invocation("ansible-vault", vec!["decrypt".to_string(), file.to_string()])
                    .check(true),
            )
            .await
            .with_context(|| format!("ansible-vault decrypt {file} failed"))
    }

    /// `ansible-lint <playbook>`. Unchecked: lint findings are reported as
    /// the outcome, and the caller decides whether they gate the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error only if ansible-lint cannot be run at all.
    pub async fn lint(&self, playbook: &str) -> Result<Outcome> {
        self.runner
            .run(&self.invocation("ansible-lint", vec![playbook.to_string()]))
            .await
            .context("ansible-lint failed to run")
    }
}
