//! Docker CLI facade: daemon checks, image lifecycle, container lifecycle.
//!
//! Containers started through this facade always have an explicit teardown
//! path: [`Docker::remove`] force-removes by name and is safe to call even
//! when the container never started.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::runner::{CommandRunner, Invocation, Outcome};

/// Parameters for `docker build`.
#[derive(Debug, Clone)]
pub struct BuildParams {
    /// Image tag, e.g. `myapp:latest`.
    pub tag: String,
    /// Build context directory.
    pub context_dir: PathBuf,
    /// Build args, rendered as `--build-arg k=v`.
    pub build_args: Vec<(String, String)>,
}

impl BuildParams {
    #[must_use]
    pub fn new(tag: impl Into<String>, context_dir: impl Into<PathBuf>) -> Self {
        Self {
            tag: tag.into(),
            context_dir: context_dir.into(),
            build_args: Vec::new(),
        }
    }
}

/// Parameters for `docker run` (detached).
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Image to run, e.g. `nginx:latest`.
    pub image: String,
    /// Container name, used later for exec/logs/teardown.
    pub name: String,
    /// Port publications, rendered as `-p host:container`.
    pub ports: Vec<(u16, u16)>,
    /// Environment for the container, rendered as `-e k=v`.
    pub env: Vec<(String, String)>,
}

impl RunParams {
    #[must_use]
    pub fn new(image: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name: name.into(),
            ports: Vec::new(),
            env: Vec::new(),
        }
    }
}

/// Docker driver over a [`CommandRunner`].
pub struct Docker<R> {
    runner: R,
}

impl<R: CommandRunner> Docker<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn invocation(args: Vec<String>) -> Invocation {
        Invocation::new("docker").args(args)
    }

    /// `docker version` — daemon reachability check before any pipeline
    /// step that needs containers.
    ///
    /// # Errors
    ///
    /// Returns an error if the docker CLI is missing or the daemon does not
    /// answer.
    pub async fn check_daemon(&self) -> Result<Outcome> {
        self.runner
            .run(&Self::invocation(vec!["version".to_string()]).check(true))
            .await
            .context("docker daemon is not reachable")
    }

    /// `docker images --format '{{.Repository}}:{{.Tag}} {{.ID}}'`, one
    /// image per output line.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub async fn images(&self) -> Result<Vec<String>> {
        let outcome = self
            .runner
            .run(
                &Self::invocation(vec![
                    "images".to_string(),
                    "--format".to_string(),
                    "{{.Repository}}:{{.Tag}} {{.ID}}".to_string(),
                ])
                .check(true),
            )
            .await
            .context("docker images failed")?;
        Ok(outcome
            .stdout_text()
            .lines()
            .map(str::to_string)
            .collect())
    }

    /// `docker pull <image>` — pre-pull base images so later steps are
    /// deterministic and fast.
    ///
    /// # Errors
    ///
    /// Returns an error if the pull fails.
    pub async fn pull(&self, image: &str) -> Result<Outcome> {
        self.runner
            .run(&Self::invocation(vec!["pull".to_string(), image.to_string()]).check(true))
            .await
            .with_context(|| format!("docker pull {image} failed"))
    }

    /// `docker build -t <tag> [--build-arg ...] <context>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the build fails.
    pub async fn build(&self, params: &BuildParams) -> Result<Outcome> {
        let mut args = vec!["build".to_string(), "-t".to_string(), params.tag.clone()];
        for (key, value) in &params.build_args {
            args.push("--build-arg".to_string());
            args.push(format!("{key}={value}"));
        }
        args.push(params.context_dir.to_string_lossy().into_owned());
        self.runner
            .run(&Self::invocation(args).check(true))
            .await
            .with_context(|| format!("docker build {} failed", params.tag))
    }

    /// `docker run -d --name <name> [-p ...] [-e ...] <image>`. Returns the
    /// container id printed by docker.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be started.
    pub async fn run_detached(&self, params: &RunParams) -> Result<String> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            params.name.clone(),
        ];
        for (host, container) in &params.ports {
            args.push("-p".to_string());
            args.push(format!("{host}:{container}"));
        }
        for (key, value) in &params.env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        args.push(params.image.clone());
        let outcome = self
            .runner
            .run(&Self::invocation(args).check(true))
            .await
            .with_context(|| format!("docker run {} failed", params.image))?;
        Ok(outcome.stdout_text().trim().to_string())
    }

    /// `docker exec <name> <cmd...>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the exec fails or the container is not running.
    pub async fn exec(&self, name: &str, cmd: &[&str]) -> Result<Outcome> {
        let mut args = vec!["exec".to_string(), name.to_string()];
        args.extend(cmd.iter().map(ToString::to_string));
        self.runner
            .run(&Self::invocation(args).check(true))
            .await
            .with_context(|| format!("docker exec in {name} failed"))
    }

    /// `docker logs [--tail n] <name>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the container does not exist.
    pub async fn logs(&self, name: &str, tail: Option<u32>) -> Result<Outcome> {
        let mut args = vec!["logs".to_string()];
        if let Some(n) = tail {
            args.push("--tail".to_string());
            args.push(n.to_string());
        }
        args.push(name.to_string());
        self.runner
            .run(&Self::invocation(args).check(true))
            .await
            .with_context(|| format!("docker logs {name} failed"))
    }

    /// `docker stop <name>` followed by `docker rm <name>`. Unchecked on
    /// purpose: teardown of a container that already exited (or never
    /// started) is a no-op, not a failure.
    ///
    /// # Errors
    ///
    /// Returns an error only if the docker CLI cannot be run at all.
    pub async fn remove(&self, name: &str) -> Result<()> {
        self.runner
            .run(&Self::invocation(vec!["stop".to_string(), name.to_string()]))
            .await
            .context("docker stop failed to run")?;
        self.runner
            .run(&Self::invocation(vec![
                "rm".to_string(),
                "-f".to_string(),
                name.to_string(),
            ]))
            .await
            .context("docker rm failed to run")?;
        Ok(())
    }

    /// `docker tag <source> <target>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source image does not exist.
    pub async fn tag(&self, source: &str, target: &str) -> Result<Outcome> {
        self.runner
            .run(
                &Self::invocation(vec![
                    "tag".to_string(),
                    source.to_string(),
                    target.to_string(),
                ])
                .check(true),
            )
            .await
            .with_context(|| format!("docker tag {source} {target} failed"))
    }

    /// `docker push <image>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the push is rejected.
    pub async fn push(&self, image: &str) -> Result<Outcome> {
        self.runner
            .run(&Self::invocation(vec!["push".to_string(), image.to_string()]).check(true))
            .await
            .with_context(|| format!("docker push {image} failed"))
    }

    /// `docker inspect <target>`, parsed. Works for containers and images.
    ///
    /// # Errors
    ///
    /// Returns an error if the target does not exist or prints invalid JSON.
    pub async fn inspect(&self, target: &str) -> Result<Value> {
        let outcome = self
            .runner
            .run(&Self::invocation(vec!["inspect".to_string(), target.to_string()]).check(true))
            .await
            .with_context(|| format!("docker inspect {target} failed"))?;
        serde_json::from_slice(&outcome.stdout).context("cannot parse docker inspect JSON")
    }

    /// `docker image prune -f` — free disk on build agents.
    ///
    /// # Errors
    ///
    /// Returns an error if the prune fails.
    pub async fn prune_images(&self) -> Result<Outcome> {
        self.runner
            .run(
                &Self::invocation(vec![
                    "image".to_string(),
                    "prune".to_string(),
                    "-f".to_string(),
                ])
                .check(true),
            )
            .await
            .context("docker image prune failed")
    }

    /// `docker save -o <path> <image>` — archive an image for transfer to
    /// an air-gapped host.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub async fn save(&self, image: &str, path: &Path) -> Result<Outcome> {
        self.runner
            .run(
                &Self::invocation(vec![
                    "save".to_string(),
                    "-o".to_string(),
                    path.to_string_lossy().into_owned(),
                    image.to_string(),
                ])
                .check(true),
            )
            .await
            .with_context(|| format!("docker save {image} failed"))
    }

    /// `docker load -i <path>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be loaded.
    pub async fn load(&self, path: &Path) -> Result<Outcome> {
        self.runner
            .run(
                &Self::invocation(vec![
                    "load".to_string(),
                    "-i".to_string(),
                    path.to_string_lossy().into_owned(),
                ])
                .check(true),
            )
            .await
            .context("docker load failed")
    }
}
