//! Pipeline report and log artifacts.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final state of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    Failure,
}

/// Structured pipeline run report, persisted as pretty JSON for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub status: ReportStatus,
    /// Wall-clock duration of the run in seconds.
    pub duration_seconds: f64,
    /// Who or what started the run (user, scheduler, webhook).
    pub triggered_by: String,
    pub timestamp: DateTime<Utc>,
}

impl PipelineReport {
    /// A report stamped with the current time.
    #[must_use]
    pub fn now(status: ReportStatus, duration_seconds: f64, triggered_by: impl Into<String>) -> Self {
        Self {
            status,
            duration_seconds,
            triggered_by: triggered_by.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Report file manager with an injectable path for tests.
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the report as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, report: &PipelineReport) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(report).context("serializing report")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("writing report file {}", self.path.display()))
    }

    /// Load a previously written report, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<PipelineReport>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading report file {}", self.path.display()))?;
        let report = serde_json::from_str(&content)
            .with_context(|| format!("parsing report file {}", self.path.display()))?;
        Ok(Some(report))
    }

    /// Remove the report file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("removing report file {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// Append one timestamped line to a plain-text pipeline log.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub fn append_log(path: &Path, line: &str) -> Result<()> {
    use std::io::Write;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    writeln!(file, "{} {line}", Utc::now().format("%Y-%m-%dT%H:%M:%SZ"))
        .with_context(|| format!("writing log file {}", path.display()))
}
