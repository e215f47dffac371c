//! Key bundle commands — move authentication key material between machines.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::keystore::KeyStore;

/// Arguments for the export-keys command.
#[derive(Args)]
pub struct ExportArgs {
    /// Directory the bundle is written to.
    #[arg(default_value = "keys")]
    pub dest: PathBuf,
}

/// Arguments for the import-keys command.
#[derive(Args)]
pub struct ImportArgs {
    /// Directory holding a previously exported bundle.
    #[arg(default_value = "keys")]
    pub src: PathBuf,
}

/// Run the export-keys command.
///
/// # Errors
///
/// Returns an error if the local key tree cannot be copied.
pub fn run_export(ctx: &AppContext, args: &ExportArgs) -> Result<()> {
    let store = key_store(ctx)?;
    let report = store.export_to(&args.dest)?;
    ctx.output.success(&format!(
        "Exported {} key file(s) to {}",
        report.files,
        args.dest.display()
    ));
    if report.private_included {
        ctx.output
            .warn("The bundle includes PRIVATE key material. Handle it like a password.");
    }
    Ok(())
}

/// Run the import-keys command.
///
/// # Errors
///
/// Returns a bundle-missing error (exit code 15) when `src` does not exist.
pub fn run_import(ctx: &AppContext, args: &ImportArgs) -> Result<()> {
    let store = key_store(ctx)?;
    let report = store.import_from(&args.src)?;
    ctx.output.success(&format!(
        "Imported {} key file(s) into {}",
        report.files,
        store.root().display()
    ));
    Ok(())
}

fn key_store<'a>(
    ctx: &'a AppContext,
) -> Result<KeyStore<'a, crate::infra::command_runner::TokioCommandRunner>> {
    Ok(KeyStore::new(
        ctx.cfg.key_dir()?,
        &ctx.cfg.product.agent_cli,
        ctx.cfg.key_settle(),
        &ctx.runner,
    ))
}
