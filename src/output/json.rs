//! JSON output helpers.
//!
//! Provides the error-object formatter used by all `--json` code paths when
//! a command fails.

use anyhow::{Context, Result};

use crate::runner::RunError;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails (should not happen in
/// practice — `serde_json` only fails on non-finite floats and maps with
/// non-string keys, neither of which appear here).
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable machine-readable code for an error chain. Invocation failures get
/// their own codes; everything else is `"error"`.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    match err.downcast_ref::<RunError>() {
        Some(RunError::NotFound { .. }) => "executable_not_found",
        Some(RunError::Launch { .. }) => "launch_failed",
        Some(RunError::NonZeroExit { .. }) => "nonzero_exit",
        Some(RunError::TimedOut { .. }) => "timed_out",
        Some(RunError::Wait { .. }) => "wait_failed",
        Some(RunError::EmptyChain) => "empty_chain",
        None => "error",
    }
}
