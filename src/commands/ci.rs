//! `opsrun ci` — trigger and poll remote CI pipelines.
//!
//! Tokens come from the environment by default so they never land in shell
//! history; every variant also accepts an explicit flag.

use anyhow::{Result, bail};
use clap::Subcommand;

use crate::ci::{GithubActions, GitlabCi, Jenkins};
use crate::output::OutputContext;

#[derive(Subcommand, Debug)]
pub enum CiCommand {
    /// Dispatch a GitHub Actions workflow
    GithubDispatch {
        /// Workflow file name, e.g. deploy.yml
        workflow: String,

        /// Repository as owner/name
        #[arg(long, value_name = "OWNER/NAME")]
        repo: String,

        /// Git ref to run the workflow on
        #[arg(long, value_name = "REF", default_value = "main")]
        git_ref: String,

        /// API token
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Show the state of a GitHub Actions workflow run
    GithubStatus {
        /// Workflow run id
        run_id: u64,

        /// Repository as owner/name
        #[arg(long, value_name = "OWNER/NAME")]
        repo: String,

        /// API token
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Trigger a GitLab CI pipeline
    GitlabTrigger {
        /// Project id or URL-encoded path
        project_id: String,

        /// Git ref to run the pipeline on
        #[arg(long, value_name = "REF", default_value = "main")]
        git_ref: String,

        /// GitLab instance base URL
        #[arg(long, value_name = "URL", default_value = "https://gitlab.com")]
        base_url: String,

        /// Pipeline trigger token
        #[arg(long, env = "GITLAB_TRIGGER_TOKEN", hide_env_values = true)]
        trigger_token: String,
    },

    /// Show the state of a GitLab CI pipeline
    GitlabStatus {
        /// Project id or URL-encoded path
        project_id: String,

        /// Pipeline id
        pipeline_id: u64,

        /// GitLab instance base URL
        #[arg(long, value_name = "URL", default_value = "https://gitlab.com")]
        base_url: String,

        /// Personal access token
        #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
        access_token: String,
    },

    /// Queue a Jenkins job build
    JenkinsBuild {
        /// Job name
        job: String,

        /// Jenkins controller base URL
        #[arg(long, value_name = "URL")]
        base_url: String,

        /// Jenkins user
        #[arg(long, env = "JENKINS_USER")]
        user: String,

        /// Jenkins API token
        #[arg(long, env = "JENKINS_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Show the last build of a Jenkins job
    JenkinsStatus {
        /// Job name
        job: String,

        /// Jenkins controller base URL
        #[arg(long, value_name = "URL")]
        base_url: String,

        /// Jenkins user
        #[arg(long, env = "JENKINS_USER")]
        user: String,

        /// Jenkins API token
        #[arg(long, env = "JENKINS_TOKEN", hide_env_values = true)]
        token: String,
    },
}

fn emit_value(ctx: &OutputContext, value: &serde_json::Value, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
        return Ok(());
    }
    if let Some(status) = value.get("status").and_then(serde_json::Value::as_str) {
        ctx.kv("status", status);
    } else if let Some(result) = value.get("result").and_then(serde_json::Value::as_str) {
        ctx.kv("result", result);
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Run `opsrun ci`.
///
/// # Errors
///
/// Returns an error on transport failure or when a trigger is rejected.
pub async fn run(ctx: &OutputContext, cmd: CiCommand, json: bool) -> Result<()> {
    // The HTTP clients are blocking; keep them off the runtime's core threads.
    match cmd {
        CiCommand::GithubDispatch {
            workflow,
            repo,
            git_ref,
            token,
        } => {
            let status = tokio::task::spawn_blocking(move || {
                GithubActions::new(repo, token).dispatch_workflow(&workflow, &git_ref)
            })
            .await??;
            if status != 204 {
                bail!("workflow dispatch rejected with status {status}");
            }
            ctx.success("Workflow dispatched");
            Ok(())
        }
        CiCommand::GithubStatus {
            run_id,
            repo,
            token,
        } => {
            let value = tokio::task::spawn_blocking(move || {
                GithubActions::new(repo, token).run_status(run_id)
            })
            .await??;
            emit_value(ctx, &value, json)
        }
        CiCommand::GitlabTrigger {
            project_id,
            git_ref,
            base_url,
            trigger_token,
        } => {
            let value = tokio::task::spawn_blocking(move || {
                GitlabCi::new(base_url, project_id).trigger_pipeline(&trigger_token, &git_ref)
            })
            .await??;
            if let Some(id) = value.get("id").and_then(serde_json::Value::as_u64) {
                ctx.success(&format!("Pipeline {id} triggered"));
            }
            emit_value(ctx, &value, json)
        }
        CiCommand::GitlabStatus {
            project_id,
            pipeline_id,
            base_url,
            access_token,
        } => {
            let value = tokio::task::spawn_blocking(move || {
                GitlabCi::new(base_url, project_id).pipeline_status(pipeline_id, &access_token)
            })
            .await??;
            emit_value(ctx, &value, json)
        }
        CiCommand::JenkinsBuild {
            job,
            base_url,
            user,
            token,
        } => {
            let status = tokio::task::spawn_blocking(move || {
                Jenkins::new(base_url, user, token).trigger_job(&job)
            })
            .await??;
            if !(200..300).contains(&status) {
                bail!("jenkins rejected the build with status {status}");
            }
            ctx.success(&format!("Build queued ({status})"));
            Ok(())
        }
        CiCommand::JenkinsStatus {
            job,
            base_url,
            user,
            token,
        } => {
            let value = tokio::task::spawn_blocking(move || {
                Jenkins::new(base_url, user, token).last_build_status(&job)
            })
            .await??;
            emit_value(ctx, &value, json)
        }
    }
}
