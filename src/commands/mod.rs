//! CLI command implementations.
//!
//! Each module exposes argument structs and a `run` function; the run
//! functions take their collaborators (runner, config, output context) as
//! parameters so unit tests can substitute canned implementations.

pub mod ansible;
pub mod ci;
pub mod config;
pub mod docker;
pub mod doctor;
pub mod notify;
pub mod pipe;
pub mod report;
pub mod run;
pub mod terraform;
pub mod version;
