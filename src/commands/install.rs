//! Install command — provision one machine into a role.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::app::AppContext;
use crate::application::services::install_flow::{FlowPorts, InstallOptions, RoleInstallFlow};
use crate::application::services::release;
use crate::domain::session::Role;
use crate::infra::download::UreqFetcher;
use crate::infra::prompt::TerminalDecisions;
use crate::infra::release_index::GithubReleaseIndex;
use crate::infra::settings::{LocalHost, RegSettingsStore};
use crate::output::progress;

/// Role selection on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    /// Management console plus the private key.
    Supervisor,
    /// Background service holding the public key.
    Agent,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Supervisor => Role::Supervisor,
            RoleArg::Agent => Role::Agent,
        }
    }
}

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Which role this machine takes.
    #[arg(value_enum)]
    pub role: RoleArg,

    /// Key bundle directory (export target for supervisor, import source
    /// for agent).
    #[arg(long, default_value = "keys")]
    pub bundle: PathBuf,

    /// Policy settings file to apply after installation.
    #[arg(long)]
    pub policy: Option<PathBuf>,
}

/// Run the install command.
///
/// # Errors
///
/// Returns an error carrying the failure-category exit code when any flow
/// stage fails.
pub async fn run(ctx: &AppContext, args: &InstallArgs) -> Result<()> {
    let role = Role::from(args.role);
    ctx.output.header(&format!("Provisioning this machine as {role}"));

    let spinner = ctx
        .output
        .show_progress()
        .then(|| progress::spinner("Resolving the latest Warden release"));
    let index = GithubReleaseIndex::new(&ctx.cfg);
    let artifact = release::resolve_latest(&index, &ctx.cfg);
    match spinner {
        Some(spinner) if !artifact.degraded => {
            progress::finish_ok(&spinner, &format!("Latest release: {}", artifact.version));
        }
        Some(spinner) => spinner.finish_and_clear(),
        None => {}
    }
    if artifact.degraded {
        ctx.output.warn(&format!(
            "Release index unreachable; using the pinned release {}",
            artifact.version
        ));
    }

    let fetcher = UreqFetcher::new(&ctx.cfg, ctx.output.show_progress());
    let decisions = TerminalDecisions::new(ctx.non_interactive);
    let flow = RoleInstallFlow::new(
        role,
        &ctx.cfg,
        FlowPorts {
            runner: &ctx.runner,
            fetcher: &fetcher,
            settings: &RegSettingsStore,
            host: &LocalHost,
            decisions: &decisions,
            progress: &ctx.output,
        },
        InstallOptions {
            bundle_dir: args.bundle.clone(),
            policy_file: args.policy.clone(),
        },
    );

    let summary = flow.run(artifact).await?;
    ctx.output.success(&format!("{role} provisioning complete"));
    ctx.output.summary(&summary);
    Ok(())
}
