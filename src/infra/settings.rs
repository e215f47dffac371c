//! Windows-backed implementations of the `SettingsStore` and `HostInspector`
//! ports, shelling out to the stock administration tools (`reg`, `net`,
//! `gpupdate`). Output parsing is split into pure functions so it stays
//! testable on every platform.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::application::ports::{HostInspector, SettingsStore};
use crate::domain::policy::SettingValue;

/// Registry-style settings store driven by `reg.exe`.
///
/// Machine writes target `HKLM`; per-user writes target the account's
/// `HKEY_USERS` hive resolved through its SID.
pub struct RegSettingsStore;

impl RegSettingsStore {
    fn reg(&self, args: &[&str]) -> Result<std::process::Output> {
        let output = std::process::Command::new("reg")
            .args(args)
            .output()
            .context("running reg.exe")?;
        debug!(?args, code = output.status.code(), "reg invocation");
        if !output.status.success() {
            anyhow::bail!(
                "reg {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output)
    }

    fn write(&self, full_path: &str, name: &str, value: &SettingValue) -> Result<()> {
        let (value_type, data) = match value {
            SettingValue::Dword(v) => ("REG_DWORD", v.to_string()),
            SettingValue::Text(s) => ("REG_SZ", s.clone()),
        };
        self.reg(&[
            "add", full_path, "/v", name, "/t", value_type, "/d", &data, "/f",
        ])?;
        Ok(())
    }

    fn sid_for(&self, user: &str) -> Result<String> {
        let output = std::process::Command::new("wmic")
            .args([
                "useraccount",
                "where",
                &format!("name='{user}'"),
                "get",
                "sid",
                "/value",
            ])
            .output()
            .context("running wmic")?;
        parse_wmic_sid(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| anyhow::anyhow!("no SID found for account '{user}'"))
    }
}

impl SettingsStore for RegSettingsStore {
    fn write_machine(&self, path: &str, name: &str, value: &SettingValue) -> Result<()> {
        self.write(&format!(r"HKLM\{path}"), name, value)
    }

    fn read_machine(&self, path: &str, name: &str) -> Result<Option<String>> {
        let output = std::process::Command::new("reg")
            .args(["query", &format!(r"HKLM\{path}"), "/v", name])
            .output()
            .context("running reg.exe")?;
        if !output.status.success() {
            // Absent key or value, not an error for a probe.
            return Ok(None);
        }
        Ok(parse_reg_query_value(
            &String::from_utf8_lossy(&output.stdout),
            name,
        ))
    }

    fn write_user(&self, user: &str, path: &str, name: &str, value: &SettingValue) -> Result<()> {
        let sid = self.sid_for(user)?;
        self.write(&format!(r"HKU\{sid}\{path}"), name, value)
    }

    fn refresh_policy(&self) -> Result<()> {
        let status = std::process::Command::new("gpupdate")
            .arg("/force")
            .status()
            .context("running gpupdate")?;
        anyhow::ensure!(status.success(), "gpupdate exited with {status}");
        Ok(())
    }
}

/// Production host inspector.
pub struct LocalHost;

impl HostInspector for LocalHost {
    fn is_elevated(&self) -> bool {
        #[cfg(windows)]
        {
            // `net session` fails with access denied for non-elevated shells.
            std::process::Command::new("net")
                .arg("session")
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        }
        #[cfg(not(windows))]
        {
            std::process::Command::new("id")
                .arg("-u")
                .output()
                .ok()
                .and_then(|o| String::from_utf8(o.stdout).ok())
                .is_some_and(|uid| uid.trim() == "0")
        }
    }

    fn free_disk_bytes(&self, path: &Path) -> Result<u64> {
        #[cfg(windows)]
        {
            let drive = path
                .components()
                .next()
                .map_or_else(|| "C:".to_string(), |c| c.as_os_str().to_string_lossy().into_owned());
            let output = std::process::Command::new("wmic")
                .args([
                    "logicaldisk",
                    "where",
                    &format!("DeviceID='{drive}'"),
                    "get",
                    "FreeSpace",
                    "/value",
                ])
                .output()
                .context("running wmic")?;
            parse_wmic_free_space(&String::from_utf8_lossy(&output.stdout))
                .ok_or_else(|| anyhow::anyhow!("no free-space figure for {drive}"))
        }
        #[cfg(not(windows))]
        {
            let output = std::process::Command::new("df")
                .args(["-Pk", &path.display().to_string()])
                .output()
                .context("running df")?;
            parse_df_available(&String::from_utf8_lossy(&output.stdout))
                .ok_or_else(|| anyhow::anyhow!("unparseable df output"))
        }
    }

    fn standard_users(&self) -> Result<Vec<String>> {
        #[cfg(windows)]
        {
            let output = std::process::Command::new("net")
                .args(["localgroup", "Users"])
                .output()
                .context("running net localgroup")?;
            anyhow::ensure!(output.status.success(), "net localgroup Users failed");
            Ok(parse_net_localgroup(&String::from_utf8_lossy(&output.stdout)))
        }
        #[cfg(not(windows))]
        {
            let passwd =
                std::fs::read_to_string("/etc/passwd").context("reading /etc/passwd")?;
            Ok(parse_passwd_users(&passwd))
        }
    }

    fn public_desktop_shortcuts(&self) -> Result<Vec<PathBuf>> {
        let Some(desktop) = public_desktop_dir() else {
            return Ok(Vec::new());
        };
        if !desktop.is_dir() {
            return Ok(Vec::new());
        }
        let mut shortcuts = Vec::new();
        for entry in std::fs::read_dir(&desktop)
            .with_context(|| format!("listing {}", desktop.display()))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("lnk")) {
                shortcuts.push(path);
            }
        }
        shortcuts.sort();
        Ok(shortcuts)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("inspecting {}", path.display()))?;
        if meta.permissions().readonly() {
            let mut perms = meta.permissions();
            #[allow(clippy::permissions_set_readonly_false)]
            perms.set_readonly(false);
            std::fs::set_permissions(path, perms)
                .with_context(|| format!("clearing read-only on {}", path.display()))?;
        }
        std::fs::remove_file(path).with_context(|| format!("removing {}", path.display()))
    }
}

fn public_desktop_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var_os("PUBLIC").map(|p| PathBuf::from(p).join("Desktop"))
    }
    #[cfg(not(windows))]
    {
        None
    }
}

// ── Output parsers ───────────────────────────────────────────────────────────

/// Extract `SID=...` from `wmic useraccount ... get sid /value` output.
fn parse_wmic_sid(output: &str) -> Option<String> {
    output
        .lines()
        .filter_map(|l| l.trim().strip_prefix("SID="))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Extract `FreeSpace=...` from `wmic logicaldisk ... get FreeSpace /value`.
#[cfg_attr(not(windows), allow(dead_code))]
fn parse_wmic_free_space(output: &str) -> Option<u64> {
    output
        .lines()
        .filter_map(|l| l.trim().strip_prefix("FreeSpace="))
        .find_map(|s| s.trim().parse().ok())
}

/// Parse the `Available` column (KiB) of `df -Pk` into bytes.
#[cfg_attr(windows, allow(dead_code))]
fn parse_df_available(output: &str) -> Option<u64> {
    let line = output.lines().nth(1)?;
    let avail_kib: u64 = line.split_whitespace().nth(3)?.parse().ok()?;
    Some(avail_kib * 1024)
}

/// Parse member names out of `net localgroup Users` output: names sit
/// between the dashed separator and the trailing status line. Domain
/// principals (`NT AUTHORITY\...`) are not local accounts and are dropped.
#[cfg_attr(not(windows), allow(dead_code))]
fn parse_net_localgroup(output: &str) -> Vec<String> {
    output
        .lines()
        .skip_while(|l| !l.starts_with("---"))
        .skip(1)
        .take_while(|l| !l.starts_with("The command completed"))
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.contains('\\'))
        .map(ToString::to_string)
        .collect()
}

/// Interactive human accounts from an `/etc/passwd` dump: ordinary UID
/// range with a real login shell.
#[cfg_attr(windows, allow(dead_code))]
fn parse_passwd_users(passwd: &str) -> Vec<String> {
    passwd
        .lines()
        .filter_map(|line| {
            let mut fields = line.split(':');
            let name = fields.next()?;
            let uid: u32 = fields.nth(1)?.parse().ok()?;
            let shell = fields.nth(3)?;
            ((1000..60000).contains(&uid)
                && !shell.ends_with("nologin")
                && !shell.ends_with("false"))
            .then(|| name.to_string())
        })
        .collect()
}

/// Pull the data column for `name` out of `reg query` output.
fn parse_reg_query_value(output: &str, name: &str) -> Option<String> {
    for line in output.lines() {
        let mut parts = line.split_whitespace();
        if parts.next() != Some(name) {
            continue;
        }
        let value_type = parts.next()?;
        let data = parts.collect::<Vec<_>>().join(" ");
        if data.is_empty() {
            return None;
        }
        // Dword probes compare decimal; reg prints hex.
        if value_type == "REG_DWORD"
            && let Some(hex) = data.strip_prefix("0x")
            && let Ok(v) = u32::from_str_radix(hex, 16)
        {
            return Some(v.to_string());
        }
        return Some(data);
    }
    None
}
