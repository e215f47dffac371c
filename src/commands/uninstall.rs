//! Uninstall command — remove the managed product from this machine.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::HostInspector as _;
use crate::application::services::uninstall::Uninstaller;
use crate::domain::error::ProvisionError;
use crate::infra::settings::LocalHost;

/// Arguments for the uninstall command.
#[derive(Args)]
pub struct UninstallArgs {
    /// Also delete the product data directory (keys, configuration, logs).
    #[arg(long)]
    pub purge_data: bool,
}

/// Run the uninstall command.
///
/// # Errors
///
/// Returns an error when no uninstaller is present, the process is not
/// elevated, or the uninstaller exits non-zero.
pub async fn run(ctx: &AppContext, args: &UninstallArgs) -> Result<()> {
    if !LocalHost.is_elevated() {
        return Err(ProvisionError::PermissionDenied(
            "uninstalling modifies machine state".to_string(),
        )
        .into());
    }

    if !ctx.confirm("Remove Warden from this machine?", true)? {
        return Err(ProvisionError::Cancelled.into());
    }
    let purge = args.purge_data
        && ctx.confirm(
            "Also delete ALL Warden data (keys, configuration, logs)? This cannot be undone.",
            false,
        )?;

    let outcome = Uninstaller::new(&ctx.cfg, &ctx.runner).run(purge).await?;
    ctx.output.success("Warden removed");
    ctx.output
        .kv("Uninstaller", &outcome.uninstaller.display().to_string());
    if let Some(dir) = outcome.purged_data_dir {
        ctx.output.kv("Purged", &dir.display().to_string());
    } else if args.purge_data && !purge {
        ctx.output.info("Data directory kept");
    }
    Ok(())
}
