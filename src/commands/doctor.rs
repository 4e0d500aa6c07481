//! `opsrun doctor` — check that the wrapped tools are present and usable.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use semver::Version;
use serde::Serialize;

use crate::output::OutputContext;
use crate::runner::{CommandRunner, Invocation, resolve_program};

/// How a tool announces its version.
struct ToolSpec {
    name: &'static str,
    version_args: &'static [&'static str],
    /// Oldest version the wrapped flag sets are known to work with.
    min_version: Option<Version>,
}

fn known_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "terraform",
            version_args: &["version"],
            min_version: Some(Version::new(1, 0, 0)),
        },
        ToolSpec {
            name: "ansible",
            version_args: &["--version"],
            min_version: None,
        },
        ToolSpec {
            name: "ansible-playbook",
            version_args: &["--version"],
            min_version: None,
        },
        ToolSpec {
            name: "docker",
            version_args: &["--version"],
            min_version: Some(Version::new(20, 10, 0)),
        },
        ToolSpec {
            name: "kubectl",
            version_args: &["version", "--client"],
            min_version: None,
        },
        ToolSpec {
            name: "trivy",
            version_args: &["--version"],
            min_version: None,
        },
    ]
}

/// Result of probing one tool.
#[derive(Debug, Serialize)]
pub struct ToolCheck {
    pub name: String,
    pub found: bool,
    pub path: Option<String>,
    pub version: Option<String>,
    /// `None` when no minimum is defined or no version could be read.
    pub meets_minimum: Option<bool>,
}

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)] // compile-time constant pattern
    Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("valid regex")
});

fn extract_version(text: &str) -> Option<Version> {
    let captures = VERSION_RE.captures(text)?;
    Version::parse(captures.get(0)?.as_str()).ok()
}

async fn probe(runner: &impl CommandRunner, spec: &ToolSpec) -> ToolCheck {
    let Ok(path) = resolve_program(spec.name, None) else {
        return ToolCheck {
            name: spec.name.to_string(),
            found: false,
            path: None,
            version: None,
            meets_minimum: None,
        };
    };

    let inv = Invocation::new(spec.name)
        .args(spec.version_args.iter().copied())
        .timeout(Duration::from_secs(10));
    let version = match runner.run(&inv).await {
        Ok(outcome) => {
            let mut text = outcome.stdout_text();
            text.push_str(&outcome.stderr_text());
            extract_version(&text)
        }
        Err(_) => None,
    };
    let meets_minimum = match (&spec.min_version, &version) {
        (Some(min), Some(found)) => Some(found >= min),
        _ => None,
    };

    ToolCheck {
        name: spec.name.to_string(),
        found: true,
        path: Some(path.to_string_lossy().into_owned()),
        version: version.map(|v| v.to_string()),
        meets_minimum,
    }
}

/// Run `opsrun doctor`.
///
/// # Errors
///
/// Returns an error only if the JSON report cannot be serialized; a missing
/// or outdated tool is a finding, not a failure.
pub async fn run(ctx: &OutputContext, runner: &impl CommandRunner, json: bool) -> Result<()> {
    let mut checks = Vec::new();
    for spec in known_tools() {
        checks.push(probe(runner, &spec).await);
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "tools": checks }))
                .context("serializing doctor report")?
        );
        return Ok(());
    }

    ctx.header("Tools");
    for check in &checks {
        if !check.found {
            ctx.warn(&format!("{} not found on PATH", check.name));
            continue;
        }
        let version = check.version.as_deref().unwrap_or("unknown version");
        match check.meets_minimum {
            Some(false) => ctx.warn(&format!("{} {version} is older than supported", check.name)),
            _ => ctx.success(&format!("{} {version}", check.name)),
        }
    }
    Ok(())
}
