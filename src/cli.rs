//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Fleet provisioning for the Warden remote-administration agent
#[derive(Parser)]
#[command(
    name = "rollout",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (also honored via the `NO_COLOR` env var)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Answer prompts with their defaults
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install Warden in a role on this machine
    Install(commands::install::InstallArgs),

    /// Remove Warden from this machine
    Uninstall(commands::uninstall::UninstallArgs),

    /// Show this machine's provisioning state
    Info,

    /// Export the local key material as a bundle
    ExportKeys(commands::keys::ExportArgs),

    /// Import a key bundle into the canonical location
    ImportKeys(commands::keys::ImportArgs),

    /// Manage restriction policies
    #[command(subcommand)]
    Policy(commands::policy::PolicyCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error when the command fails; the error chain carries the
    /// taxonomy exit code.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            command,
        } = self;

        if let Command::Version = command {
            commands::version::run(json);
            return Ok(());
        }

        let ctx = AppContext::new(&AppFlags {
            no_color,
            quiet,
            json,
            yes,
        })?;
        match command {
            Command::Install(args) => commands::install::run(&ctx, &args).await,
            Command::Uninstall(args) => commands::uninstall::run(&ctx, &args).await,
            Command::Info => commands::info::run(&ctx).await,
            Command::ExportKeys(args) => commands::keys::run_export(&ctx, &args),
            Command::ImportKeys(args) => commands::keys::run_import(&ctx, &args),
            Command::Policy(cmd) => commands::policy::run(&ctx, &cmd),
            // Handled before the context is built.
            Command::Version => Ok(()),
        }
    }
}
