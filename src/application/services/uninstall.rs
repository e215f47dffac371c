//! Silent removal of an installed Warden instance.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::application::ports::CommandRunner;
use crate::domain::config::{ProvisionConfig, warden_data_dir};
use crate::domain::error::ProvisionError;

/// How long the vendor uninstaller may run before it is killed.
const UNINSTALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Uninstaller file names the vendor has shipped across releases.
const UNINSTALLER_NAMES: &[&str] = &["uninstall.exe", "Uninstall.exe", "unins000.exe"];

#[derive(Debug)]
pub struct UninstallOutcome {
    /// Paths the uninstaller and purge actually touched, for the summary.
    pub uninstaller: PathBuf,
    pub purged_data_dir: Option<PathBuf>,
}

/// Locates and runs the product's own uninstaller.
pub struct Uninstaller<'a, R> {
    cfg: &'a ProvisionConfig,
    runner: &'a R,
    install_roots: Vec<PathBuf>,
}

impl<'a, R: CommandRunner> Uninstaller<'a, R> {
    pub fn new(cfg: &'a ProvisionConfig, runner: &'a R) -> Self {
        Self {
            cfg,
            runner,
            install_roots: default_install_roots(),
        }
    }

    /// Override the searched install roots.
    #[must_use]
    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.install_roots = roots;
        self
    }

    /// First uninstaller binary found under the searched roots.
    #[must_use]
    pub fn locate(&self) -> Option<PathBuf> {
        for root in &self.install_roots {
            for name in UNINSTALLER_NAMES {
                let candidate = root.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Run the uninstaller silently; optionally purge the data directory
    /// afterwards. The caller is responsible for any operator confirmation
    /// before passing `purge_data`.
    ///
    /// # Errors
    ///
    /// [`ProvisionError::PreflightHard`] when no uninstaller is found,
    /// [`ProvisionError::InstallerNonZeroExit`] when it exits non-zero.
    pub async fn run(&self, purge_data: bool) -> Result<UninstallOutcome> {
        let uninstaller = self.locate().ok_or_else(|| {
            ProvisionError::PreflightHard(format!(
                "no Warden uninstaller found under: {}",
                self.install_roots
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

        info!(path = %uninstaller.display(), "running uninstaller");
        let program = uninstaller.display().to_string();
        let output = self
            .runner
            .run_with_timeout(&program, &["/S"], UNINSTALL_TIMEOUT)
            .await
            .with_context(|| format!("launching uninstaller {program}"))?;
        if !output.status.success() {
            return Err(ProvisionError::InstallerNonZeroExit {
                code: output.status.code().unwrap_or(-1),
            }
            .into());
        }

        let purged_data_dir = if purge_data {
            let data_dir = warden_data_dir(self.cfg)?;
            if data_dir.exists() {
                purge_tree(&data_dir)?;
                Some(data_dir)
            } else {
                warn!(dir = %data_dir.display(), "data directory already absent");
                None
            }
        } else {
            None
        };

        Ok(UninstallOutcome {
            uninstaller,
            purged_data_dir,
        })
    }
}

/// Standard install locations for the managed product.
fn default_install_roots() -> Vec<PathBuf> {
    #[cfg(windows)]
    {
        let mut roots = Vec::new();
        for var in ["PROGRAMFILES", "PROGRAMFILES(X86)"] {
            if let Some(base) = std::env::var_os(var) {
                roots.push(PathBuf::from(base).join("Warden"));
            }
        }
        if roots.is_empty() {
            roots.push(PathBuf::from(r"C:\Program Files\Warden"));
        }
        roots
    }
    #[cfg(not(windows))]
    {
        vec![PathBuf::from("/opt/warden")]
    }
}

/// Delete a directory tree, clearing read-only attributes first so files the
/// product marked immutable do not abort the removal partway.
fn purge_tree(root: &std::path::Path) -> Result<()> {
    clear_readonly(root)?;
    std::fs::remove_dir_all(root)
        .with_context(|| format!("removing data directory {}", root.display()))
}

fn clear_readonly(path: &std::path::Path) -> Result<()> {
    let meta = std::fs::symlink_metadata(path)
        .with_context(|| format!("inspecting {}", path.display()))?;
    if meta.permissions().readonly() {
        let mut perms = meta.permissions();
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("clearing read-only on {}", path.display()))?;
    }
    if meta.is_dir() {
        for entry in std::fs::read_dir(path)
            .with_context(|| format!("listing {}", path.display()))?
        {
            clear_readonly(&entry?.path())?;
        }
    }
    Ok(())
}
