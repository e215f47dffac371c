//! Declarative policy catalog and its portable settings file.
//!
//! Pure functions only — applying an entry to the machine goes through the
//! `SettingsStore` port in `application::services::policy_apply`.
//!
//! The portable settings file is UTF-8 `key=value` text, one entry per
//! line, `#` comment lines ignored, values `true`/`false` case-insensitive.
//! Stable keys are the only persisted identifier: labels may change across
//! versions without breaking round-trips.

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::error::PolicyError;

// ── Model ────────────────────────────────────────────────────────────────────

/// Whether an entry targets the machine hive or each standard user's hive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyScope {
    /// One machine-wide setting.
    Machine,
    /// Applied once per non-administrator local account. Writing it only to
    /// the invoking administrator account would be a silent no-op for the
    /// intended audience.
    User,
}

/// Value written to a setting location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Dword(u32),
    Text(String),
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dword(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Target-effect descriptor: one setting path + name + desired value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingWrite {
    /// Setting store path, without a hive prefix (the scope supplies it).
    pub path: &'static str,
    /// Value name under `path`.
    pub name: &'static str,
    /// Desired value.
    pub value: SettingValue,
}

/// One named, independently toggleable restriction or personalization effect.
#[derive(Debug, Clone)]
pub struct PolicyEntry {
    /// Stable key — the only persisted identifier.
    pub key: &'static str,
    /// Human label; free to change across versions.
    pub label: &'static str,
    pub scope: PolicyScope,
    /// `None` when the effect is a multi-step special-case procedure
    /// dispatched by `key` instead of a single setting write.
    pub effect: Option<SettingWrite>,
    /// Selected for application this session. Defaults to `false`.
    pub enabled: bool,
}

// ── Catalog ──────────────────────────────────────────────────────────────────

/// Stable keys of entries handled by special-case procedures.
///
/// `validate_catalog` checks this list against the catalog at startup so an
/// orphaned key fails fast as a configuration error, never at apply time.
pub const SPECIAL_CASE_KEYS: &[&str] = &["DesktopWallpaper", "CleanPublicDesktop"];

/// The static catalog, in display and application order.
///
/// Order is significant and must be stable across runs so saved settings
/// files are reproducible.
#[must_use]
pub fn definitions() -> Vec<PolicyEntry> {
    fn dword(path: &'static str, name: &'static str, value: u32) -> Option<SettingWrite> {
        Some(SettingWrite {
            path,
            name,
            value: SettingValue::Dword(value),
        })
    }

    vec![
        PolicyEntry {
            key: "AutoUpdate",
            label: "Disable automatic OS updates during sessions",
            scope: PolicyScope::Machine,
            effect: dword(
                r"SOFTWARE\Policies\Microsoft\Windows\WindowsUpdate\AU",
                "NoAutoUpdate",
                1,
            ),
            enabled: false,
        },
        PolicyEntry {
            key: "DisableTaskMgr",
            label: "Block Task Manager",
            scope: PolicyScope::User,
            effect: dword(
                r"SOFTWARE\Microsoft\Windows\CurrentVersion\Policies\System",
                "DisableTaskMgr",
                1,
            ),
            enabled: false,
        },
        PolicyEntry {
            key: "NoControlPanel",
            label: "Block Control Panel and Settings",
            scope: PolicyScope::User,
            effect: dword(
                r"SOFTWARE\Microsoft\Windows\CurrentVersion\Policies\Explorer",
                "NoControlPanel",
                1,
            ),
            enabled: false,
        },
        PolicyEntry {
            key: "DisableCmd",
            label: "Block the command prompt",
            scope: PolicyScope::User,
            effect: dword(r"SOFTWARE\Policies\Microsoft\Windows\System", "DisableCMD", 2),
            enabled: false,
        },
        PolicyEntry {
            key: "DisableRegistryTools",
            label: "Block registry editing tools",
            scope: PolicyScope::User,
            effect: dword(
                r"SOFTWARE\Microsoft\Windows\CurrentVersion\Policies\System",
                "DisableRegistryTools",
                1,
            ),
            enabled: false,
        },
        PolicyEntry {
            key: "HideFastUserSwitching",
            label: "Hide fast user switching",
            scope: PolicyScope::Machine,
            effect: dword(
                r"SOFTWARE\Microsoft\Windows\CurrentVersion\Policies\System",
                "HideFastUserSwitching",
                1,
            ),
            enabled: false,
        },
        PolicyEntry {
            key: "NoUsbStorage",
            label: "Disable USB mass storage",
            scope: PolicyScope::Machine,
            effect: dword(r"SYSTEM\CurrentControlSet\Services\USBSTOR", "Start", 4),
            enabled: false,
        },
        PolicyEntry {
            key: "DisableNotifications",
            label: "Suppress toast notifications",
            scope: PolicyScope::User,
            effect: dword(
                r"SOFTWARE\Policies\Microsoft\Windows\Explorer",
                "DisableNotificationCenter",
                1,
            ),
            enabled: false,
        },
        PolicyEntry {
            key: "DesktopWallpaper",
            label: "Deploy the standard lab wallpaper",
            scope: PolicyScope::User,
            effect: None,
            enabled: false,
        },
        PolicyEntry {
            key: "CleanPublicDesktop",
            label: "Remove vendor shortcuts from the public desktop",
            scope: PolicyScope::Machine,
            effect: None,
            enabled: false,
        },
    ]
}

/// Explicit primary-path → group-policy-path mapping for the fallback
/// mechanism. A primary path with no row here has no fallback.
///
/// A lookup table, not a string transform: the legacy chained-substitution
/// derivation had ambiguous precedence when a path matched several patterns.
pub const FALLBACK_POLICY_PATHS: &[(&str, &str)] = &[
    (
        r"SOFTWARE\Microsoft\Windows\CurrentVersion\Policies\System",
        r"SOFTWARE\Policies\Microsoft\Windows\System",
    ),
    (
        r"SOFTWARE\Microsoft\Windows\CurrentVersion\Policies\Explorer",
        r"SOFTWARE\Policies\Microsoft\Windows\Explorer",
    ),
];

/// Fallback policy path for a primary setting path, when one is mapped.
#[must_use]
pub fn fallback_policy_path(primary: &str) -> Option<&'static str> {
    FALLBACK_POLICY_PATHS
        .iter()
        .find(|(p, _)| *p == primary)
        .map(|(_, fb)| *fb)
}

/// Validate the catalog's special-case wiring at startup.
///
/// # Errors
///
/// Returns [`PolicyError::OrphanedSpecialKey`] when an entry with no setting
/// descriptor has no registered special-case handler, or when a registered
/// handler key has no catalog entry.
pub fn validate_catalog(catalog: &[PolicyEntry]) -> Result<()> {
    for entry in catalog {
        if entry.effect.is_none() && !SPECIAL_CASE_KEYS.contains(&entry.key) {
            return Err(PolicyError::OrphanedSpecialKey(entry.key.to_string()).into());
        }
    }
    for key in SPECIAL_CASE_KEYS {
        let Some(entry) = catalog.iter().find(|e| e.key == *key) else {
            return Err(PolicyError::OrphanedSpecialKey((*key).to_string()).into());
        };
        if entry.effect.is_some() {
            return Err(PolicyError::OrphanedSpecialKey((*key).to_string()).into());
        }
    }
    Ok(())
}

// ── Portable settings file ───────────────────────────────────────────────────

/// Parse settings text and set `enabled` flags on `catalog` by stable key.
///
/// Unknown keys are ignored (forward compatible); entries absent from the
/// text keep their current `enabled` value; malformed lines are skipped.
pub fn apply_settings_text(catalog: &mut [PolicyEntry], text: &str) {
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let enabled = match value.trim().to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            _ => continue,
        };
        if let Some(entry) = catalog.iter_mut().find(|e| e.key == key) {
            entry.enabled = enabled;
        }
    }
}

/// Load `enabled` flags from a settings file into `catalog`.
///
/// # Errors
///
/// Returns [`PolicyError::SettingsFileMissing`] when the file does not exist,
/// or an error if it cannot be read.
pub fn load_enabled_state(catalog: &mut [PolicyEntry], path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(PolicyError::SettingsFileMissing(path.display().to_string()).into());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading settings file {}", path.display()))?;
    apply_settings_text(catalog, &text);
    Ok(())
}

/// Render the catalog's enabled-set as portable settings text, preserving
/// catalog order, with a generation-time header.
#[must_use]
pub fn settings_text(catalog: &[PolicyEntry], generated_at: chrono::DateTime<chrono::Utc>) -> String {
    let mut out = String::new();
    out.push_str("# rollout policy settings\n");
    out.push_str(&format!(
        "# generated {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    for entry in catalog {
        out.push_str(&format!("{}={}\n", entry.key, entry.enabled));
    }
    out
}

/// Write the enabled-set to `path` in portable `key=value` form.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_enabled_state(catalog: &[PolicyEntry], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    std::fs::write(path, settings_text(catalog, chrono::Utc::now()))
        .with_context(|| format!("writing settings file {}", path.display()))
}

// ── Unit tests ───────────────────────────────────────────────────────────────
