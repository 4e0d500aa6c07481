//! `opsrun report` — write a structured pipeline report.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::output::OutputContext;
use crate::report::{PipelineReport, ReportStatus, ReportWriter};

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Final pipeline state
    #[arg(value_enum)]
    pub status: StatusArg,

    /// Pipeline duration in seconds
    #[arg(long, value_name = "SECS")]
    pub duration: f64,

    /// Who or what started the pipeline
    #[arg(long, value_name = "NAME", default_value = "manual")]
    pub triggered_by: String,

    /// Where to write the report
    #[arg(long, value_name = "FILE", default_value = "pipeline_report.json")]
    pub output: PathBuf,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum StatusArg {
    Success,
    Failure,
}

impl From<StatusArg> for ReportStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Success => ReportStatus::Success,
            StatusArg::Failure => ReportStatus::Failure,
        }
    }
}

/// Run `opsrun report`.
///
/// # Errors
///
/// Returns an error if the report file cannot be written.
pub fn run(ctx: &OutputContext, args: &ReportArgs) -> Result<()> {
    let report = PipelineReport::now(args.status.into(), args.duration, &args.triggered_by);
    ReportWriter::new(&args.output).save(&report)?;
    ctx.success(&format!("Report written to {}", args.output.display()));
    Ok(())
}
