//! The per-invocation configuration value object.
//!
//! Built once in `AppContext::new` from defaults overlaid with an optional
//! `~/.rollout/config.yaml`, then passed by reference to every component.
//! There is deliberately no process-wide mutable configuration state.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ── Defaults ─────────────────────────────────────────────────────────────────

/// Pinned last-known-good release used when live resolution fails.
pub const FALLBACK_VERSION: &str = "4.9.7";
pub const FALLBACK_URL: &str =
    "https://github.com/warden-rms/warden/releases/download/v4.9.7/warden-4.9.7-win64-setup.exe";
pub const FALLBACK_SIZE: u64 = 38_227_968;

fn default_release_owner() -> String {
    "warden-rms".to_string()
}

fn default_release_repo() -> String {
    "warden".to_string()
}

fn default_agent_cli() -> String {
    "warden-cli".to_string()
}

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration, optionally overlaid from `~/.rollout/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Where releases of the managed product are published.
    #[serde(default)]
    pub release: ReleaseConfig,
    /// Local paths and external tool names.
    #[serde(default)]
    pub product: ProductConfig,
}

/// Release index location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    /// GitHub owner hosting the product releases.
    #[serde(default = "default_release_owner")]
    pub owner: String,
    /// GitHub repository name.
    #[serde(default = "default_release_repo")]
    pub repo: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            owner: default_release_owner(),
            repo: default_release_repo(),
        }
    }
}

/// Managed-product paths and tool names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    /// Name of the product's own CLI (key generation, version queries).
    #[serde(default = "default_agent_cli")]
    pub agent_cli: String,
    /// Override for the canonical key directory. `None` = platform default.
    #[serde(default)]
    pub key_dir: Option<PathBuf>,
    /// Override for the product data directory. `None` = platform default.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            agent_cli: default_agent_cli(),
            key_dir: None,
            data_dir: None,
        }
    }
}

impl ProvisionConfig {
    /// Load config from `path`, falling back to defaults when the file does
    /// not exist. Unknown fields are ignored for forward compatibility.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Default config file location (`~/.rollout/config.yaml`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        Ok(rollout_dir()?.join("config.yaml"))
    }

    /// Canonical per-machine key directory for the managed product.
    ///
    /// # Errors
    ///
    /// Returns an error if no platform data directory can be determined.
    pub fn key_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.product.key_dir {
            return Ok(dir.clone());
        }
        Ok(warden_data_dir(self)?.join("keys"))
    }

    /// Timeout for release-metadata fetches.
    #[must_use]
    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    /// Timeout for the installer download.
    #[must_use]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(600)
    }

    /// How long to wait for key material to appear after generation.
    #[must_use]
    pub fn key_settle(&self) -> Duration {
        Duration::from_secs(5)
    }

    /// The pinned known-good artifact descriptor for degraded resolution.
    #[must_use]
    pub fn pinned_artifact(&self) -> crate::domain::release::ReleaseArtifact {
        crate::domain::release::ReleaseArtifact {
            version: FALLBACK_VERSION.to_string(),
            download_url: FALLBACK_URL.to_string(),
            size: FALLBACK_SIZE,
            published: None,
            expected_sha256: None,
            degraded: true,
        }
    }
}

/// The rollout tool's own directory (`~/.rollout`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn rollout_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))
        .map(|h| h.join(".rollout"))
}

/// The managed product's data directory.
///
/// Windows: `%PROGRAMDATA%\Warden`; elsewhere `~/.warden` (dev/test hosts).
///
/// # Errors
///
/// Returns an error if neither a data nor home directory can be determined.
pub fn warden_data_dir(cfg: &ProvisionConfig) -> Result<PathBuf> {
    if let Some(dir) = &cfg.product.data_dir {
        return Ok(dir.clone());
    }
    #[cfg(windows)]
    {
        let program_data =
            std::env::var_os("PROGRAMDATA").map_or_else(|| PathBuf::from("C:/ProgramData"), PathBuf::from);
        Ok(program_data.join("Warden"))
    }
    #[cfg(not(windows))]
    {
        dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))
            .map(|h| h.join(".warden"))
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
