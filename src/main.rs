//! Rollout CLI - fleet provisioning for the Warden remote-administration agent

#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;

use rollout_cli::cli::Cli;
use rollout_cli::domain::error::exit_code_for;

#[tokio::main]
async fn main() {
    rollout_cli::logging::init();
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        tracing::error!(error = ?e, "command failed");
        std::process::exit(exit_code_for(&e));
    }
}
