//! opsrun - automation command runner for DevOps pipelines

use clap::Parser;

use opsrun::cli::Cli;
use opsrun::output::json::{error_code, format_error};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;
    if let Err(e) = cli.run().await {
        if json {
            if let Ok(rendered) = format_error(&format!("{e:#}"), error_code(&e)) {
                println!("{rendered}");
            }
        }
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
