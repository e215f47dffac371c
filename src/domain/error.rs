//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

/// Failure taxonomy for the provisioning flow.
///
/// Every variant carries an actionable message and maps to a stable exit
/// code so wrapper scripts can branch on failure category.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Network failure: {0}\nCheck connectivity and re-run, or continue with the pinned fallback release.")]
    NetworkFailure(String),

    #[error("Network timeout after {seconds}s while {action}.\nCheck connectivity and re-run.")]
    NetworkTimeout { action: String, seconds: u64 },

    #[error(
        "Installer verification FAILED.\nExpected SHA-256: {expected}\nComputed SHA-256: {actual}\n\nThe downloaded file does not match the published checksum. This may\nindicate tampering or a corrupted download. Delete the download and re-run."
    )]
    VerificationMismatch { expected: String, actual: String },

    #[error("Installer exited with code {code}. Check the Warden installer log and re-run.")]
    InstallerNonZeroExit { code: i32 },

    #[error(
        "Key generation failed: '{tool} authkeys create {name}' {reason}.\nRun the Warden configurator manually to generate the '{name}' key pair, then\nre-run 'rollout export-keys <path>'."
    )]
    KeyGenerationFailed {
        tool: String,
        name: String,
        /// What the generation command actually did, e.g. a non-zero exit
        /// code or a clean exit that produced no files.
        reason: String,
    },

    #[error(
        "Key bundle not found at: {path}\n\nAgent provisioning needs the supervisor's public key.\n  1. On the SUPERVISOR machine run: rollout install supervisor\n  2. Copy the produced 'keys/' directory next to this tool (or pass --bundle)\n  3. Re-run this command\n\nThe bundle must contain at least: keys/public/supervisor/"
    )]
    SourceBundleMissing { path: String },

    #[error("Preflight check failed: {0}")]
    PreflightHard(String),

    #[error(
        "Permission denied: {0}\nRe-run this command from an elevated (administrator) shell."
    )]
    PermissionDenied(String),

    #[error("Cancelled by operator.")]
    Cancelled,
}

impl ProvisionError {
    /// Stable exit code per failure category; wrapper scripts depend on
    /// these values.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NetworkFailure(_) | Self::NetworkTimeout { .. } => 10,
            Self::VerificationMismatch { .. } => 11,
            Self::InstallerNonZeroExit { .. } => 12,
            Self::PermissionDenied(_) => 13,
            Self::KeyGenerationFailed { .. } => 14,
            Self::SourceBundleMissing { .. } => 15,
            Self::PreflightHard(_) => 16,
            Self::Cancelled => 17,
        }
    }
}

/// Errors related to the policy catalog and its portable settings file.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Policy entry '{0}' has no setting descriptor and no registered special-case handler.")]
    OrphanedSpecialKey(String),

    #[error("Settings file not found: {0}\nGenerate one with: rollout policy save <path>")]
    SettingsFileMissing(String),
}

/// Map an `anyhow::Error` chain to its taxonomy exit code.
///
/// Walks the chain looking for a [`ProvisionError`]; unclassified errors
/// map to the generic exit code 1.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ProvisionError>())
        .map_or(1, ProvisionError::exit_code)
}
