//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::policy::SettingValue;
use crate::domain::release::ReleaseArtifact;
use crate::domain::session::{Decision, Gate};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
///
/// This trait is NOT tied to the Warden tooling — it can run any external
/// command. The production implementation uses tokio; test doubles return
/// canned results without spawning processes.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;

    /// Run a program and return only its exit status.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<std::process::ExitStatus>;
}

// ── Release Index Port ────────────────────────────────────────────────────────

/// Queries the product's release index for the most recent published
/// installer artifact.
///
/// Implementations return errors on any lookup failure; the fallback to the
/// pinned known-good artifact belongs to the `ReleaseResolver` service, not
/// to implementations of this trait.
pub trait ReleaseIndex {
    /// Resolve the latest platform installer artifact.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, timeout, malformed response, or
    /// when the release carries no platform-matching asset.
    fn latest(&self) -> Result<ReleaseArtifact>;
}

// ── Artifact Fetcher Port ─────────────────────────────────────────────────────

/// Downloads a release artifact to a local path.
pub trait ArtifactFetcher {
    /// Download `artifact` to `dest`, returning the number of bytes written.
    ///
    /// Implementations must stream to a temporary path and rename onto
    /// `dest` only on full success, so `dest` never names a partial file.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or timeout; `dest` is left absent.
    fn fetch(&self, artifact: &ReleaseArtifact, dest: &Path) -> Result<u64>;
}

// ── Settings Store Port ───────────────────────────────────────────────────────

/// Abstracts the target system's settings store (registry-style hives).
pub trait SettingsStore {
    /// Write a machine-wide setting.
    fn write_machine(&self, path: &str, name: &str, value: &SettingValue) -> Result<()>;

    /// Read a machine-wide setting, `None` when absent.
    fn read_machine(&self, path: &str, name: &str) -> Result<Option<String>>;

    /// Write a setting into one user's hive.
    fn write_user(&self, user: &str, path: &str, name: &str, value: &SettingValue) -> Result<()>;

    /// Ask the policy-refresh subsystem to re-read policy locations.
    fn refresh_policy(&self) -> Result<()>;
}

// ── Host Inspection Port ──────────────────────────────────────────────────────

/// Abstracts host probing so preflight and special-case procedures can be
/// tested with mocks.
pub trait HostInspector {
    /// True when the process runs with administrative rights.
    fn is_elevated(&self) -> bool;

    /// Free bytes on the volume containing `path`.
    fn free_disk_bytes(&self, path: &Path) -> Result<u64>;

    /// Names of local non-administrator accounts.
    fn standard_users(&self) -> Result<Vec<String>>;

    /// Shortcut files on the shared (all-users) desktop.
    fn public_desktop_shortcuts(&self) -> Result<Vec<PathBuf>>;

    /// Remove a single file.
    fn remove_file(&self, path: &Path) -> Result<()>;
}

// ── Decision Point Port ───────────────────────────────────────────────────────

/// Operator decision points, decoupled from any input mechanism.
///
/// The production implementation prompts on the terminal; under `--yes` or
/// CI it returns each gate's non-interactive default; tests script answers.
pub trait DecisionPoint {
    /// Ask the operator how to proceed at `gate`.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt itself fails (e.g. no TTY available).
    fn decide(&self, gate: Gate, prompt: &str) -> Result<Decision>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
