//! Key lifecycle: ensure, export, import.
//!
//! A state machine over the canonical per-machine key directory:
//! `Absent` → (external generation) → `Present`. Generation is delegated to
//! the product's own CLI (`warden-cli authkeys create <name>`); this module
//! never creates key material itself.
//!
//! Every operation is safe to re-run after a partial failure: `ensure`
//! re-checks presence before generating, and the copy operations merge file
//! by file, so a crash mid-copy converges on re-invocation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::application::ports::CommandRunner;
use crate::domain::error::ProvisionError;
use crate::domain::keys::{KeyHalf, classify, half_dir};

/// Presence of key material for a named pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPresence {
    Absent,
    Present,
}

/// What an export or import actually moved.
#[derive(Debug, Clone, Copy)]
pub struct CopyReport {
    /// Files copied.
    pub files: usize,
    /// True when private material was part of the copy.
    pub private_included: bool,
}

/// Manager for the canonical key directory.
pub struct KeyStore<'a, R> {
    root: PathBuf,
    agent_cli: String,
    settle: Duration,
    runner: &'a R,
}

impl<'a, R: CommandRunner> KeyStore<'a, R> {
    /// Create a key store over `root`, generating through `agent_cli`.
    pub fn new(root: PathBuf, agent_cli: &str, settle: Duration, runner: &'a R) -> Self {
        Self {
            root,
            agent_cli: agent_cli.to_string(),
            settle,
            runner,
        }
    }

    /// The canonical key directory this store manages.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current presence of the named pair (either half counts).
    #[must_use]
    pub fn presence(&self, name: &str) -> KeyPresence {
        let has_half = |half| dir_has_files(&half_dir(&self.root, half, name));
        if has_half(KeyHalf::Public) || has_half(KeyHalf::Private) {
            KeyPresence::Present
        } else {
            KeyPresence::Absent
        }
    }

    /// Idempotent ensure: generate the named pair only when absent.
    ///
    /// When generation runs, presence is re-checked within a bounded settle
    /// wait (the product CLI writes the files asynchronously). Still-absent
    /// material after that wait is a hard [`ProvisionError::KeyGenerationFailed`] —
    /// not retried automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the generation command cannot be spawned, exits
    /// non-zero, or produces no key material.
    pub async fn ensure(&self, name: &str) -> Result<KeyPresence> {
        if self.presence(name) == KeyPresence::Present {
            debug!(name, "key material already present, skipping generation");
            return Ok(KeyPresence::Present);
        }

        info!(name, tool = %self.agent_cli, "generating key pair");
        let output = self
            .runner
            .run(&self.agent_cli, &["authkeys", "create", name])
            .await
            .with_context(|| format!("running {} authkeys create {name}", self.agent_cli))?;

        if output.status.success() {
            // Bounded settle wait for the files to land.
            let deadline = tokio::time::Instant::now() + self.settle;
            loop {
                if self.presence(name) == KeyPresence::Present {
                    return Ok(KeyPresence::Present);
                }
                if tokio::time::Instant::now() >= deadline {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        }

        let reason = if output.status.success() {
            format!(
                "completed but no key material appeared under {}",
                self.root.display()
            )
        } else {
            format!("exited with code {}", output.status.code().unwrap_or(-1))
        };
        Err(ProvisionError::KeyGenerationFailed {
            tool: self.agent_cli.clone(),
            name: name.to_string(),
            reason,
        }
        .into())
    }

    /// Copy the full local key tree (both halves, whatever exists) to
    /// `dest`. On a machine holding only public material this degrades to a
    /// public-only export without error, and a key directory that does not
    /// exist yet degrades to an empty export.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy fails partway; re-running converges.
    pub fn export_to(&self, dest: &Path) -> Result<CopyReport> {
        if !self.root.exists() {
            info!(root = %self.root.display(), "key directory absent, nothing to export");
            return Ok(CopyReport {
                files: 0,
                private_included: false,
            });
        }
        let report = merge_copy_tree(&self.root, dest)?;
        info!(
            dest = %dest.display(),
            files = report.files,
            private = report.private_included,
            "exported key bundle"
        );
        Ok(report)
    }

    /// Merge a previously exported bundle into the canonical location.
    ///
    /// Existing local files not present in the bundle are preserved. After
    /// the copy, public material is made world-readable and any private
    /// material in the bundle (abnormal on an agent, but handled) is
    /// restricted to administrative principals.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::SourceBundleMissing`] when `src` does not
    /// exist — an expected, operator-recoverable condition.
    pub fn import_from(&self, src: &Path) -> Result<CopyReport> {
        if !src.exists() {
            return Err(ProvisionError::SourceBundleMissing {
                path: src.display().to_string(),
            }
            .into());
        }
        let report = merge_copy_tree(src, &self.root)?;
        apply_key_permissions(&self.root)?;
        info!(
            src = %src.display(),
            files = report.files,
            "imported key bundle"
        );
        Ok(report)
    }
}

/// True when `dir` exists and contains at least one file (recursively).
fn dir_has_files(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() || dir_has_files(&path) {
            return true;
        }
    }
    false
}

/// Recursively copy `src` into `dest`, creating directories as needed and
/// overwriting same-named files, while leaving unrelated `dest` files alone.
fn merge_copy_tree(src: &Path, dest: &Path) -> Result<CopyReport> {
    let mut report = CopyReport {
        files: 0,
        private_included: false,
    };
    copy_dir_into(src, dest, src, &mut report)?;
    Ok(report)
}

fn copy_dir_into(dir: &Path, dest_root: &Path, src_root: &Path, report: &mut CopyReport) -> Result<()> {
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry in {}", dir.display()))?;
        let path = entry.path();
        #[allow(clippy::expect_used)] // entries are always under src_root
        let relative = path.strip_prefix(src_root).expect("entry under source root");
        let target = dest_root.join(relative);

        if path.is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("creating {}", target.display()))?;
            copy_dir_into(&path, dest_root, src_root, report)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            std::fs::copy(&path, &target).with_context(|| {
                format!("copying {} to {}", path.display(), target.display())
            })?;
            report.files += 1;
            if classify(relative) == Some(KeyHalf::Private) {
                report.private_included = true;
            }
        }
    }
    Ok(())
}

/// Apply differentiated access control under a key root: public material
/// world-readable, private material restricted.
fn apply_key_permissions(root: &Path) -> Result<()> {
    for half in [KeyHalf::Public, KeyHalf::Private] {
        let dir = root.join(half.dir_name());
        if dir.exists() {
            set_tree_permissions(&dir, half)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn set_tree_permissions(dir: &Path, half: KeyHalf) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(half.dir_mode()))
        .with_context(|| format!("setting permissions on {}", dir.display()))?;
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            set_tree_permissions(&path, half)?;
        } else {
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(half.file_mode()))
                .with_context(|| format!("setting permissions on {}", path.display()))?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_tree_permissions(_dir: &Path, _half: KeyHalf) -> Result<()> {
    // Windows ACL tightening is handled by the product installer itself;
    // the canonical directory inherits ProgramData ACLs.
    Ok(())
}
