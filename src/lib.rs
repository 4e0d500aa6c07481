//! opsrun library — exposes modules for integration testing.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod ci;
pub mod cli;
pub mod commands;
pub mod config;
pub mod output;
pub mod report;
pub mod retry;
pub mod runner;
pub mod tools;
