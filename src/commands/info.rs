//! Info command — a one-screen readout of this machine's provisioning state.

use std::path::Path;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::CommandRunner;
use crate::domain::keys::{KeyHalf, SUPERVISOR_KEY_NAME, half_dir};

struct HostReport {
    hostname: String,
    os: String,
    arch: String,
    warden_version: Option<String>,
    public_key: bool,
    private_key: bool,
}

/// Run the info command.
///
/// # Errors
///
/// Returns an error if the key directory cannot be determined.
pub async fn run(ctx: &AppContext) -> Result<()> {
    let report = gather(ctx).await?;

    if ctx.is_json() {
        let json = serde_json::json!({
            "hostname": report.hostname,
            "os": report.os,
            "arch": report.arch,
            "warden": {
                "installed": report.warden_version.is_some(),
                "version": report.warden_version,
            },
            "keys": {
                "public": report.public_key,
                "private": report.private_key,
            },
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    ctx.output.header("Machine");
    ctx.output.kv("Hostname", &report.hostname);
    ctx.output.kv("Platform", &format!("{} / {}", report.os, report.arch));
    println!();
    ctx.output.header("Warden");
    match &report.warden_version {
        Some(version) => ctx.output.kv("Installed", version),
        None => ctx.output.kv("Installed", "no"),
    }
    ctx.output.kv(
        "Public key",
        if report.public_key { "present" } else { "absent" },
    );
    ctx.output.kv(
        "Private key",
        if report.private_key {
            "present (supervisor machine)"
        } else {
            "absent"
        },
    );
    Ok(())
}

async fn gather(ctx: &AppContext) -> Result<HostReport> {
    let key_root = ctx.cfg.key_dir()?;
    Ok(HostReport {
        hostname: hostname(ctx).await,
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        warden_version: warden_version(ctx).await,
        public_key: half_present(&key_root, KeyHalf::Public),
        private_key: half_present(&key_root, KeyHalf::Private),
    })
}

async fn hostname(ctx: &AppContext) -> String {
    for var in ["COMPUTERNAME", "HOSTNAME"] {
        if let Ok(name) = std::env::var(var)
            && !name.is_empty()
        {
            return name;
        }
    }
    match ctx.runner.run("hostname", &[]).await {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        }
        _ => "unknown".to_string(),
    }
}

/// Version of the installed product CLI, `None` when it is not on PATH or
/// refuses to answer.
async fn warden_version(ctx: &AppContext) -> Option<String> {
    let output = ctx
        .runner
        .run(&ctx.cfg.product.agent_cli, &["--version"])
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    text.lines().next().map(|l| l.trim().to_string())
}

fn half_present(root: &Path, half: KeyHalf) -> bool {
    let dir = half_dir(root, half, SUPERVISOR_KEY_NAME);
    std::fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}
