//! Terraform CLI facade.
//!
//! All commands run inside a fixed project directory, mirroring how
//! pipelines drive `terraform` from a checkout root. Commands that gate a
//! deployment (`init`, `validate`, `apply`, `destroy`) run checked so a
//! failure surfaces as an error instead of a silently non-zero outcome.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::runner::{CommandRunner, Invocation, Outcome};

/// Marker terraform prints when a plan proposes nothing.
/// Its absence from plan output means the real infrastructure has drifted
/// from the declared definition.
pub const NO_CHANGES_MARKER: &str = "No changes.";

/// Plan comparison against live infrastructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftStatus {
    /// Plan output carried the "No changes." marker.
    InSync,
    /// Plan proposed changes: live state deviates from the definition.
    Drifted,
}

/// Terraform project driver.
pub struct Terraform<R> {
    runner: R,
    dir: PathBuf,
    vars: Vec<(String, String)>,
}

impl<R: CommandRunner> Terraform<R> {
    pub fn new(runner: R, dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            dir: dir.into(),
            vars: Vec::new(),
        }
    }

    /// Inject a terraform input variable as `TF_VAR_<name>` so secrets never
    /// appear on the command line.
    #[must_use]
    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((format!("TF_VAR_{name}"), value.into()));
        self
    }

    /// Enable terraform's own debug logging (`TF_LOG=DEBUG`) for this driver.
    #[must_use]
    pub fn with_debug_logging(mut self) -> Self {
        self.vars.push(("TF_LOG".to_string(), "DEBUG".to_string()));
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn invocation(&self, args: &[&str]) -> Invocation {
        let mut inv = Invocation::new("terraform")
            .args(args.iter().copied())
            .current_dir(&self.dir);
        for (key, value) in &self.vars {
            inv = inv.env(key, value);
        }
        inv
    }

    /// `terraform init -input=false`. Required before any other command.
    ///
    /// # Errors
    ///
    /// Returns an error if terraform is missing or init exits non-zero.
    pub async fn init(&self) -> Result<Outcome> {
        self.runner
            .run(&self.invocation(&["init", "-input=false"]).check(true))
            .await
            .context("terraform init failed")
    }

    /// `terraform validate`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub async fn validate(&self) -> Result<Outcome> {
        self.runner
            .run(&self.invocation(&["validate"]).check(true))
            .await
            .context("terraform validate failed")
    }

    /// `terraform fmt`. Unchecked: formatting problems are not deployment
    /// blockers.
    ///
    /// # Errors
    ///
    /// Returns an error only if terraform cannot be run at all.
    pub async fn fmt(&self) -> Result<Outcome> {
        self.runner
            .run(&self.invocation(&["fmt"]))
            .await
            .context("terraform fmt failed to run")
    }

    /// `terraform plan -input=false [-out=<file>]`, output captured for the
    /// caller to inspect. Unchecked: a failed plan is still a result the
    /// caller may want to report rather than abort on.
    ///
    /// # Errors
    ///
    /// Returns an error only if terraform cannot be run at all.
    pub async fn plan(&self, out_file: Option<&str>) -> Result<Outcome> {
        let mut args = vec!["plan", "-input=false"];
        let out_arg;
        if let Some(file) = out_file {
            out_arg = format!("-out={file}");
            args.push(&out_arg);
        }
        self.runner
            .run(&self.invocation(&args))
            .await
            .context("terraform plan failed to run")
    }

    /// `terraform apply -input=false -auto-approve`.
    ///
    /// # Errors
    ///
    /// Returns an error if the apply exits non-zero. A non-zero apply may
    /// leave infrastructure half-changed; the error carries terraform's own
    /// diagnostics and recovery is terraform's job, not this wrapper's.
    pub async fn apply(&self) -> Result<Outcome> {
        self.runner
            .run(
                &self
                    .invocation(&["apply", "-input=false", "-auto-approve"])
                    .check(true),
            )
            .await
            .context("terraform apply failed")
    }

    /// `terraform destroy -input=false -auto-approve`.
    ///
    /// # Errors
    ///
    /// Returns an error if the destroy exits non-zero.
    pub async fn destroy(&self) -> Result<Outcome> {
        self.runner
            .run(
                &self
                    .invocation(&["destroy", "-input=false", "-auto-approve"])
                    .check(true),
            )
            .await
            .context("terraform destroy failed")
    }

    /// `terraform show -json`, parsed.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or prints invalid JSON.
    pub async fn show_state(&self) -> Result<Value> {
        let outcome = self
            .runner
            .run(&self.invocation(&["show", "-json"]).check(true))
            .await
            .context("terraform show failed")?;
        serde_json::from_slice(&outcome.stdout).context("cannot parse terraform state JSON")
    }

    /// Resource addresses in the root module of the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be read or parsed.
    pub async fn state_resources(&self) -> Result<Vec<String>> {
        let state = self.show_state().await?;
        let resources = state
            .pointer("/values/root_module/resources")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|r| r.get("address").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(resources)
    }

    /// `terraform output -json`, parsed into a map of output values.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or prints invalid JSON.
    pub async fn outputs(&self) -> Result<Value> {
        let outcome = self
            .runner
            .run(&self.invocation(&["output", "-json"]).check(true))
            .await
            .context("terraform output failed")?;
        serde_json::from_slice(&outcome.stdout).context("cannot parse terraform outputs JSON")
    }

    /// `terraform workspace new <name>`. Unchecked: the workspace may
    /// already exist, which terraform reports as a non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error only if terraform cannot be run at all.
    pub async fn workspace_new(&self, name: &str) -> Result<Outcome> {
        self.runner
            .run(&self.invocation(&["workspace", "new", name]))
            .await
            .context("terraform workspace new failed to run")
    }

    /// `terraform workspace select <name>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace does not exist.
    pub async fn workspace_select(&self, name: &str) -> Result<Outcome> {
        self.runner
            .run(&self.invocation(&["workspace", "select", name]).check(true))
            .await
            .context("terraform workspace select failed")
    }

    /// Run a plan and classify its output by the "No changes." marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan itself fails — a broken plan is not
    /// evidence of drift.
    pub async fn detect_drift(&self) -> Result<DriftStatus> {
        let outcome = self
            .runner
            .run(&self.invocation(&["plan", "-input=false"]).check(true))
            .await
            .context("terraform plan failed during drift detection")?;
        if outcome.stdout_text().contains(NO_CHANGES_MARKER) {
            Ok(DriftStatus::InSync)
        } else {
            Ok(DriftStatus::Drifted)
        }
    }
}
