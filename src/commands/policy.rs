//! Policy commands — list, save, and apply the restriction catalog.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::application::ports::HostInspector as _;
use crate::application::services::policy_apply::{PolicyApplier, probe_current_state};
use crate::domain::config::warden_data_dir;
use crate::domain::error::ProvisionError;
use crate::domain::policy::{
    PolicyEntry, definitions, load_enabled_state, save_enabled_state, validate_catalog,
};
use crate::infra::settings::{LocalHost, RegSettingsStore};

/// Policy subcommands.
#[derive(Subcommand)]
pub enum PolicyCommand {
    /// List catalog entries and their detected state
    List,

    /// Write the detected state to a portable settings file
    Save(SaveArgs),

    /// Apply entries enabled in a settings file to this machine
    Apply(ApplyArgs),
}

/// Arguments for `policy save`.
#[derive(Args)]
pub struct SaveArgs {
    /// Settings file to write.
    #[arg(default_value = "policy.conf")]
    pub path: PathBuf,
}

/// Arguments for `policy apply`.
#[derive(Args)]
pub struct ApplyArgs {
    /// Settings file to read.
    #[arg(default_value = "policy.conf")]
    pub path: PathBuf,
}

/// Run a policy subcommand.
///
/// # Errors
///
/// Returns an error when the catalog wiring is invalid, the settings file is
/// missing for `apply`, or the process lacks elevation for `apply`.
pub fn run(ctx: &AppContext, cmd: &PolicyCommand) -> Result<()> {
    let mut catalog = definitions();
    validate_catalog(&catalog)?;

    match cmd {
        PolicyCommand::List => {
            probe_current_state(&RegSettingsStore, &mut catalog);
            list(ctx, &catalog);
            Ok(())
        }
        PolicyCommand::Save(args) => {
            probe_current_state(&RegSettingsStore, &mut catalog);
            save_enabled_state(&catalog, &args.path)?;
            ctx.output.success(&format!(
                "Saved {} entries to {}",
                catalog.len(),
                args.path.display()
            ));
            Ok(())
        }
        PolicyCommand::Apply(args) => apply(ctx, &mut catalog, args),
    }
}

fn list(ctx: &AppContext, catalog: &[PolicyEntry]) {
    if ctx.is_json() {
        let entries: Vec<_> = catalog
            .iter()
            .map(|e| {
                serde_json::json!({
                    "key": e.key,
                    "label": e.label,
                    "enabled": e.enabled,
                })
            })
            .collect();
        println!("{}", serde_json::json!({ "policies": entries }));
        return;
    }
    ctx.output.header("Policy catalog");
    for entry in catalog {
        let mark = if entry.enabled { "[x]" } else { "[ ]" };
        ctx.output.kv(&format!("{mark} {}", entry.key), entry.label);
    }
}

fn apply(ctx: &AppContext, catalog: &mut [PolicyEntry], args: &ApplyArgs) -> Result<()> {
    if !LocalHost.is_elevated() {
        return Err(ProvisionError::PermissionDenied(
            "applying policy writes machine settings".to_string(),
        )
        .into());
    }
    load_enabled_state(catalog, &args.path)?;

    let enabled = catalog.iter().filter(|e| e.enabled).count();
    if enabled == 0 {
        ctx.output.info("No entries enabled; nothing to apply");
        return Ok(());
    }
    ctx.output
        .info(&format!("Applying {enabled} enabled entries"));

    let data_dir = warden_data_dir(&ctx.cfg)?;
    let applier = PolicyApplier::new(&RegSettingsStore, &LocalHost, &data_dir);
    let report = applier.apply_all(catalog);

    ctx.output.success(&format!("{} applied", report.succeeded));
    if report.skipped > 0 {
        ctx.output.warn(&format!("{} skipped", report.skipped));
    }
    if report.failed > 0 {
        ctx.output.error(&format!(
            "{} failed: {}",
            report.failed,
            report.failed_keys().join(", ")
        ));
    }
    Ok(())
}
