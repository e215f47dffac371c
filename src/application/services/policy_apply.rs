//! Applying catalog entries to the current machine.
//!
//! Each entry gets two chances: the primary mechanism writes the entry's
//! setting descriptor directly; on failure, a fallback writes the mapped
//! group-policy location and triggers a policy refresh. Only when both fail
//! is the entry marked failed. Entries never short-circuit the batch.

use anyhow::Result;
use tracing::{info, warn};

use crate::application::ports::{HostInspector, SettingsStore};
use crate::domain::policy::{
    PolicyEntry, PolicyScope, SettingValue, SettingWrite, fallback_policy_path,
};

/// Which mechanism landed a successful apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    /// Direct setting write.
    Primary,
    /// Group-policy location write plus refresh.
    Fallback,
}

/// Outcome for one entry.
#[derive(Debug, Clone)]
pub enum EntryOutcome {
    Applied(Mechanism),
    Failed(String),
    /// User-scoped entry with no standard accounts to apply to.
    Skipped(String),
}

/// Aggregate result of an `apply_all` batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Per-entry outcome keyed by stable key, in application order.
    pub per_entry: Vec<(&'static str, EntryOutcome)>,
}

impl BatchReport {
    /// Stable keys of entries that failed.
    #[must_use]
    pub fn failed_keys(&self) -> Vec<&'static str> {
        self.per_entry
            .iter()
            .filter(|(_, o)| matches!(o, EntryOutcome::Failed(_)))
            .map(|(k, _)| *k)
            .collect()
    }
}

/// Applies catalog entries through the settings-store and host ports.
pub struct PolicyApplier<'a, S: ?Sized, H: ?Sized> {
    store: &'a S,
    host: &'a H,
    /// Path written as the per-user wallpaper source.
    wallpaper: std::path::PathBuf,
}

impl<'a, S: SettingsStore + ?Sized, H: HostInspector + ?Sized> PolicyApplier<'a, S, H> {
    pub fn new(store: &'a S, host: &'a H, data_dir: &std::path::Path) -> Self {
        Self {
            store,
            host,
            wallpaper: data_dir.join("wallpaper.jpg"),
        }
    }

    /// Apply every enabled entry independently — one failure never stops
    /// the remaining entries.
    pub fn apply_all(&self, catalog: &[PolicyEntry]) -> BatchReport {
        let mut report = BatchReport::default();
        for entry in catalog.iter().filter(|e| e.enabled) {
            let outcome = self.apply(entry);
            match &outcome {
                EntryOutcome::Applied(mechanism) => {
                    info!(key = entry.key, ?mechanism, "policy entry applied");
                    report.succeeded += 1;
                }
                EntryOutcome::Failed(reason) => {
                    warn!(key = entry.key, %reason, "policy entry failed");
                    report.failed += 1;
                }
                EntryOutcome::Skipped(reason) => {
                    warn!(key = entry.key, %reason, "policy entry skipped");
                    report.skipped += 1;
                }
            }
            report.per_entry.push((entry.key, outcome));
        }
        report
    }

    /// Apply a single entry.
    #[must_use]
    pub fn apply(&self, entry: &PolicyEntry) -> EntryOutcome {
        match &entry.effect {
            Some(write) => match entry.scope {
                PolicyScope::Machine => self.apply_machine(write),
                PolicyScope::User => self.apply_per_user(write),
            },
            // Validated against SPECIAL_CASE_KEYS at startup, so an unknown
            // key here cannot be reached from a validated catalog.
            None => self.apply_special(entry.key),
        }
    }

    fn apply_machine(&self, write: &SettingWrite) -> EntryOutcome {
        match self.store.write_machine(write.path, write.name, &write.value) {
            Ok(()) => EntryOutcome::Applied(Mechanism::Primary),
            Err(primary_err) => match self.machine_fallback(write) {
                Ok(()) => EntryOutcome::Applied(Mechanism::Fallback),
                Err(fallback_err) => EntryOutcome::Failed(format!(
                    "primary: {primary_err}; fallback: {fallback_err}"
                )),
            },
        }
    }

    fn machine_fallback(&self, write: &SettingWrite) -> Result<()> {
        let fb = fallback_policy_path(write.path)
            .ok_or_else(|| anyhow::anyhow!("no fallback policy path mapped for {}", write.path))?;
        self.store.write_machine(fb, write.name, &write.value)?;
        self.store.refresh_policy()
    }

    fn apply_per_user(&self, write: &SettingWrite) -> EntryOutcome {
        let users = match self.host.standard_users() {
            Ok(users) => users,
            Err(err) => return EntryOutcome::Failed(format!("enumerating accounts: {err}")),
        };
        if users.is_empty() {
            return EntryOutcome::Skipped(
                "no non-administrator accounts exist on this machine".to_string(),
            );
        }

        let mut mechanism = Mechanism::Primary;
        let mut failures = Vec::new();
        for user in &users {
            match self.store.write_user(user, write.path, write.name, &write.value) {
                Ok(()) => {}
                Err(primary_err) => match self.user_fallback(user, write) {
                    Ok(()) => mechanism = Mechanism::Fallback,
                    Err(fallback_err) => failures.push(format!(
                        "{user}: primary: {primary_err}; fallback: {fallback_err}"
                    )),
                },
            }
        }
        if failures.is_empty() {
            EntryOutcome::Applied(mechanism)
        } else {
            EntryOutcome::Failed(failures.join("; "))
        }
    }

    fn user_fallback(&self, user: &str, write: &SettingWrite) -> Result<()> {
        let fb = fallback_policy_path(write.path)
            .ok_or_else(|| anyhow::anyhow!("no fallback policy path mapped for {}", write.path))?;
        self.store.write_user(user, fb, write.name, &write.value)?;
        self.store.refresh_policy()
    }

    // ── Special-case procedures ──────────────────────────────────────────────

    fn apply_special(&self, key: &str) -> EntryOutcome {
        match key {
            "DesktopWallpaper" => self.deploy_wallpaper(),
            "CleanPublicDesktop" => self.clean_public_desktop(),
            other => EntryOutcome::Failed(format!(
                "no special-case handler registered for '{other}'"
            )),
        }
    }

    /// Point every standard user's wallpaper at the staged lab image, then
    /// refresh policy so the desktop picks it up at next logon.
    fn deploy_wallpaper(&self) -> EntryOutcome {
        let users = match self.host.standard_users() {
            Ok(users) => users,
            Err(err) => return EntryOutcome::Failed(format!("enumerating accounts: {err}")),
        };
        if users.is_empty() {
            return EntryOutcome::Skipped(
                "no non-administrator accounts exist on this machine".to_string(),
            );
        }
        let value = SettingValue::Text(self.wallpaper.display().to_string());
        let mut failures = Vec::new();
        for user in &users {
            if let Err(err) =
                self.store
                    .write_user(user, r"Control Panel\Desktop", "WallPaper", &value)
            {
                failures.push(format!("{user}: {err}"));
            }
        }
        if !failures.is_empty() {
            return EntryOutcome::Failed(failures.join("; "));
        }
        match self.store.refresh_policy() {
            Ok(()) => EntryOutcome::Applied(Mechanism::Primary),
            Err(err) => EntryOutcome::Failed(format!("policy refresh: {err}")),
        }
    }

    /// Remove vendor shortcuts from the shared desktop.
    fn clean_public_desktop(&self) -> EntryOutcome {
        let shortcuts = match self.host.public_desktop_shortcuts() {
            Ok(shortcuts) => shortcuts,
            Err(err) => return EntryOutcome::Failed(format!("listing public desktop: {err}")),
        };
        let mut failures = Vec::new();
        for path in &shortcuts {
            if let Err(err) = self.host.remove_file(path) {
                failures.push(format!("{}: {err}", path.display()));
            }
        }
        if failures.is_empty() {
            EntryOutcome::Applied(Mechanism::Primary)
        } else {
            EntryOutcome::Failed(failures.join("; "))
        }
    }
}

/// Best-effort probe: set `enabled` on machine-scoped single-setting entries
/// whose target value is already present.
///
/// User-scoped and special-case entries cannot be probed from a single
/// vantage point and keep their prior value.
pub fn probe_current_state(store: &(impl SettingsStore + ?Sized), catalog: &mut [PolicyEntry]) {
    for entry in catalog.iter_mut() {
        let Some(write) = &entry.effect else { continue };
        if entry.scope != PolicyScope::Machine {
            continue;
        }
        if let Ok(Some(current)) = store.read_machine(write.path, write.name)
            && current == write.value.to_string()
        {
            entry.enabled = true;
        }
    }
}
