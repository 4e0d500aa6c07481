//! CI pipeline HTTP integrations: workflow triggers, status queries, and a
//! generic webhook notifier.
//!
//! Every client is constructed explicitly with its own `ureq::Agent`;
//! nothing here relies on ambient global state. Trigger calls return the
//! HTTP status code the way the wrapped APIs document it — a 4xx answer is
//! data for the caller, not an error, while transport failures are errors.

use anyhow::{Context, Result};
use base64::Engine as _;
use serde_json::Value;

fn status_of(result: Result<ureq::Response, ureq::Error>, what: &str) -> Result<u16> {
    match result {
        Ok(resp) => Ok(resp.status()),
        Err(ureq::Error::Status(code, _)) => Ok(code),
        Err(err) => Err(err).with_context(|| format!("{what} request failed")),
    }
}

/// Generic webhook notifier (Slack-compatible `{"text": ...}` payload).
pub struct Webhook {
    agent: ureq::Agent,
    url: String,
}

impl Webhook {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            agent: ureq::agent(),
            url: url.into(),
        }
    }

    /// Post `message` to the webhook, returning the HTTP status code.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure (DNS, TLS, connection).
    pub fn notify(&self, message: &str) -> Result<u16> {
        let result = self
            .agent
            .post(&self.url)
            .send_json(serde_json::json!({ "text": message }));
        status_of(result, "webhook")
    }
}

/// GitHub Actions client for one repository.
pub struct GithubActions {
    agent: ureq::Agent,
    repo: String,
    token: String,
}

impl GithubActions {
    #[must_use]
    pub fn new(repo: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            agent: ureq::agent(),
            repo: repo.into(),
            token: token.into(),
        }
    }

    /// Dispatch a workflow on `git_ref`, returning the HTTP status code
    /// (204 on success).
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    pub fn dispatch_workflow(&self, workflow: &str, git_ref: &str) -> Result<u16> {
        let url = format!(
            "https://api.github.com/repos/{}/actions/workflows/{workflow}/dispatches",
            self.repo
        );
        let result = self
            .agent
            .post(&url)
            .set("Authorization", &format!("token {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .send_json(serde_json::json!({ "ref": git_ref }));
        status_of(result, "workflow dispatch")
    }

    /// Fetch one workflow run's state for dashboards and polling.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success answer.
    pub fn run_status(&self, run_id: u64) -> Result<Value> {
        let url = format!(
            "https://api.github.com/repos/{}/actions/runs/{run_id}",
            self.repo
        );
        self.agent
            .get(&url)
            .set("Authorization", &format!("token {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .call()
            .context("workflow run status request failed")?
            .into_json()
            .context("cannot parse workflow run JSON")
    }
}

/// GitLab CI client for one project.
pub struct GitlabCi {
    agent: ureq::Agent,
    base_url: String,
    project_id: String,
}

impl GitlabCi {
    /// `base_url` is typically `https://gitlab.com`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            agent: ureq::agent(),
            base_url: base_url.into(),
            project_id: project_id.into(),
        }
    }

    /// Trigger a pipeline on `git_ref` with a pipeline trigger token.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an invalid JSON answer.
    pub fn trigger_pipeline(&self, trigger_token: &str, git_ref: &str) -> Result<Value> {
        let url = format!(
            "{}/api/v4/projects/{}/trigger/pipeline",
            self.base_url, self.project_id
        );
        self.agent
            .post(&url)
            .send_form(&[("token", trigger_token), ("ref", git_ref)])
            .context("pipeline trigger request failed")?
            .into_json()
            .context("cannot parse pipeline trigger JSON")
    }

    /// Fetch one pipeline's state.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an invalid JSON answer.
    pub fn pipeline_status(&self, pipeline_id: u64, access_token: &str) -> Result<Value> {
        let url = format!(
            "{}/api/v4/projects/{}/pipelines/{pipeline_id}",
            self.base_url, self.project_id
        );
        self.agent
            .get(&url)
            .set("PRIVATE-TOKEN", access_token)
            .call()
            .context("pipeline status request failed")?
            .into_json()
            .context("cannot parse pipeline status JSON")
    }
}

/// Jenkins client for one controller.
pub struct Jenkins {
    agent: ureq::Agent,
    base_url: String,
    user: String,
    token: String,
}

impl Jenkins {
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            agent: ureq::agent(),
            base_url: base_url.into(),
            user: user.into(),
            token: token.into(),
        }
    }

    fn basic_auth(&self) -> String {
        let credentials = format!("{}:{}", self.user, self.token);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials)
        )
    }

    /// Queue a build of `job`, returning the HTTP status code (201 when
    /// queued).
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    pub fn trigger_job(&self, job: &str) -> Result<u16> {
        let url = format!("{}/job/{job}/build", self.base_url);
        let result = self
            .agent
            .post(&url)
            .set("Authorization", &self.basic_auth())
            .call();
        status_of(result, "jenkins build")
    }

    /// Fetch the last build of `job`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an invalid JSON answer.
    pub fn last_build_status(&self, job: &str) -> Result<Value> {
        let url = format!("{}/job/{job}/lastBuild/api/json", self.base_url);
        self.agent
            .get(&url)
            .set("Authorization", &self.basic_auth())
            .call()
            .context("jenkins last build request failed")?
            .into_json()
            .context("cannot parse jenkins build JSON")
    }
}
