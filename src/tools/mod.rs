//! CLI facades for the external tools opsrun drives.
//!
//! Each facade builds [`crate::runner::Invocation`]s and hands them to a
//! [`crate::runner::CommandRunner`], so tests can substitute a canned runner
//! and never spawn the real tool.

pub mod ansible;
pub mod docker;
pub mod terraform;
