//! End-to-end tests against the compiled binary.
//!
//! Only commands with no external tool requirement are exercised here;
//! the tool facades are covered by the unit suite against mock runners.

mod cli_tests;
mod config_file;
mod doctor_command;
mod pipe_command;
mod report_command;
