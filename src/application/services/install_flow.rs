//! The role install flow.
//!
//! A linear state machine, `Start` through `Complete`, with `Failed`
//! reachable from any stage and cancellation possible at any gate before
//! the external installer runs. Every side effect goes through a port, so
//! the whole flow runs headless under test doubles.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::application::ports::{
    ArtifactFetcher, CommandRunner, DecisionPoint, HostInspector, ProgressReporter, SettingsStore,
};
use crate::application::services::integrity::{self, Verification};
use crate::application::services::keystore::KeyStore;
use crate::application::services::policy_apply::PolicyApplier;
use crate::domain::config::ProvisionConfig;
use crate::domain::error::ProvisionError;
use crate::domain::policy;
use crate::domain::release::ReleaseArtifact;
use crate::domain::session::{Decision, Gate, InstallStage, Role, SessionSummary};

/// Minimum free space on the staging volume before the download starts.
/// Below this the operator is asked, not blocked.
const MIN_FREE_BYTES: u64 = 500 * 1024 * 1024;

/// How long the silent installer may run before it is killed.
const INSTALL_TIMEOUT: Duration = Duration::from_secs(600);

/// Borrowed port implementations the flow drives.
///
/// Only the command runner is generic (its trait is async and not
/// object-safe); everything else is taken as a trait object.
pub struct FlowPorts<'a, R> {
    pub runner: &'a R,
    pub fetcher: &'a dyn ArtifactFetcher,
    pub settings: &'a dyn SettingsStore,
    pub host: &'a dyn HostInspector,
    pub decisions: &'a dyn DecisionPoint,
    pub progress: &'a dyn ProgressReporter,
}

/// Operator-supplied inputs beyond the role itself.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Key bundle directory: export target for a supervisor, import source
    /// for an agent. Defaults to `./keys`.
    pub bundle_dir: PathBuf,
    /// Explicit policy settings file to apply after install.
    pub policy_file: Option<PathBuf>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            bundle_dir: PathBuf::from("keys"),
            policy_file: None,
        }
    }
}

pub struct RoleInstallFlow<'a, R> {
    role: Role,
    cfg: &'a ProvisionConfig,
    ports: FlowPorts<'a, R>,
    opts: InstallOptions,
    stage: InstallStage,
    summary: SessionSummary,
}

impl<'a, R: CommandRunner> RoleInstallFlow<'a, R> {
    pub fn new(
        role: Role,
        cfg: &'a ProvisionConfig,
        ports: FlowPorts<'a, R>,
        opts: InstallOptions,
    ) -> Self {
        Self {
            role,
            cfg,
            ports,
            opts,
            stage: InstallStage::Start,
            summary: SessionSummary::new(),
        }
    }

    #[must_use]
    pub fn stage(&self) -> InstallStage {
        self.stage
    }

    /// Drive the flow to completion for a previously resolved artifact.
    ///
    /// # Errors
    ///
    /// Returns a [`ProvisionError`] carrying the failure category; the
    /// operator declining a gate maps to [`ProvisionError::Cancelled`].
    pub async fn run(mut self, artifact: ReleaseArtifact) -> Result<SessionSummary> {
        self.advance(InstallStage::RoleSelected);
        self.summary.record("Role", self.role.to_string());

        let staging = tempfile::tempdir().context("creating staging directory")?;
        self.preflight(staging.path())?;
        self.advance(InstallStage::Preflighted);

        self.confirm_install(&artifact)?;

        let (artifact, installer) = self.download(&artifact, staging.path())?;
        self.advance(InstallStage::Downloaded);
        self.summary.record(
            "Version",
            if artifact.degraded {
                format!("{} (pinned fallback)", artifact.version)
            } else {
                artifact.version.clone()
            },
        );

        self.verify(&artifact, &installer)?;
        self.advance(InstallStage::Verified);

        self.install(&installer).await?;
        self.advance(InstallStage::Installed);
        self.summary
            .record("Installer", installer.display().to_string());

        self.finalize_role().await?;
        self.advance(InstallStage::RoleFinalized);

        self.advance(InstallStage::Complete);
        Ok(self.summary)
    }

    fn advance(&mut self, to: InstallStage) {
        info!(role = %self.role, from = ?self.stage, to = ?to, "stage transition");
        self.stage = to;
    }

    // ── Preflight ────────────────────────────────────────────────────────────

    fn preflight(&mut self, staging: &Path) -> Result<()> {
        if !self.ports.host.is_elevated() {
            return Err(ProvisionError::PermissionDenied(format!(
                "installing the {} role modifies machine state",
                self.role
            ))
            .into());
        }

        match self.ports.host.free_disk_bytes(staging) {
            Ok(free) if free < MIN_FREE_BYTES => {
                self.soft_gate(&format!(
                    "Only {} MB free on the staging volume. Continue anyway?",
                    free / (1024 * 1024)
                ))?;
            }
            Ok(_) => {}
            Err(err) => {
                // Advisory only; some hosts cannot report free space.
                warn!(error = %err, "could not determine free disk space");
            }
        }

        if self.policy_file().is_some() {
            match self.ports.host.standard_users() {
                Ok(users) if users.is_empty() => {
                    self.soft_gate(
                        "No non-administrator accounts exist, so user-scoped policy \
                         entries will be skipped. Continue?",
                    )?;
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "could not enumerate local accounts"),
            }
        }
        Ok(())
    }

    /// A preflight finding the operator may wave through. Declining cancels.
    fn soft_gate(&self, prompt: &str) -> Result<()> {
        match self.ports.decisions.decide(Gate::PreflightSoft, prompt)? {
            Decision::Abort => Err(ProvisionError::Cancelled.into()),
            Decision::Proceed | Decision::Override => Ok(()),
        }
    }

    fn confirm_install(&self, artifact: &ReleaseArtifact) -> Result<()> {
        let prompt = format!(
            "Install Warden {} as {} on this machine?",
            artifact.version, self.role
        );
        match self
            .ports
            .decisions
            .decide(Gate::InstallConfirm, &prompt)?
        {
            Decision::Abort => Err(ProvisionError::Cancelled.into()),
            Decision::Proceed | Decision::Override => Ok(()),
        }
    }

    // ── Download ─────────────────────────────────────────────────────────────

    /// Fetch the installer into the staging dir. A failed fetch of a live
    /// artifact gets one retry against the pinned fallback release; a failed
    /// fetch of the fallback itself is final.
    fn download(
        &self,
        artifact: &ReleaseArtifact,
        staging: &Path,
    ) -> Result<(ReleaseArtifact, PathBuf)> {
        self.ports
            .progress
            .step(&format!("Downloading Warden {}", artifact.version));

        let dest = staging.join(artifact.file_name());
        match self.ports.fetcher.fetch(artifact, &dest) {
            Ok(bytes) => {
                info!(bytes, dest = %dest.display(), "installer downloaded");
            }
            Err(err) if !artifact.degraded => {
                warn!(error = %err, "live download failed, retrying with the pinned release");
                self.ports
                    .progress
                    .warn("Download failed; retrying with the pinned known-good release");
                let pinned = self.cfg.pinned_artifact();
                let pinned_dest = staging.join(pinned.file_name());
                self.ports.fetcher.fetch(&pinned, &pinned_dest)?;
                return self.staged(pinned, pinned_dest);
            }
            Err(err) => return Err(err),
        }
        self.staged(artifact.clone(), dest)
    }

    fn staged(&self, artifact: ReleaseArtifact, dest: PathBuf) -> Result<(ReleaseArtifact, PathBuf)> {
        // The fetcher contract renames into place only on success, so an
        // absent file here means a broken implementation or a racing cleanup.
        if !dest.is_file() {
            return Err(ProvisionError::PreflightHard(format!(
                "installer missing after download: {}",
                dest.display()
            ))
            .into());
        }
        Ok((artifact, dest))
    }

    // ── Verify ───────────────────────────────────────────────────────────────

    fn verify(&mut self, artifact: &ReleaseArtifact, installer: &Path) -> Result<()> {
        match integrity::verify(installer, artifact.expected_sha256.as_deref())? {
            Verification::Match => {
                self.ports.progress.success("SHA-256 verified");
                self.summary.record("Verification", "SHA-256 match");
            }
            Verification::Unknown { actual } => {
                self.ports.progress.warn(
                    "No published checksum for this release; computed digest shown for the record",
                );
                self.summary
                    .record("Verification", format!("unverified (SHA-256 {actual})"));
            }
            Verification::Mismatch { expected, actual } => {
                let prompt = format!(
                    "Checksum MISMATCH (expected {expected}, got {actual}). \
                     Install anyway? This is NOT recommended."
                );
                match self
                    .ports
                    .decisions
                    .decide(Gate::VerificationMismatch, &prompt)?
                {
                    Decision::Override => {
                        warn!(%expected, %actual, "operator overrode checksum mismatch");
                        self.summary
                            .record("Verification", "MISMATCH (operator override)");
                    }
                    Decision::Proceed | Decision::Abort => {
                        return Err(ProvisionError::VerificationMismatch { expected, actual }.into());
                    }
                }
            }
        }
        Ok(())
    }

    // ── Install ──────────────────────────────────────────────────────────────

    async fn install(&self, installer: &Path) -> Result<()> {
        self.ports.progress.step("Running the Warden installer");
        let program = installer.display().to_string();
        let output = self
            .ports
            .runner
            .run_with_timeout(&program, self.role.installer_args(), INSTALL_TIMEOUT)
            .await
            .with_context(|| format!("launching installer {program}"))?;

        if !output.status.success() {
            return Err(ProvisionError::InstallerNonZeroExit {
                code: output.status.code().unwrap_or(-1),
            }
            .into());
        }
        self.ports.progress.success("Warden installed");
        Ok(())
    }

    // ── Role finalization ────────────────────────────────────────────────────

    /// Key distribution and policy application. The product is installed by
    /// now, so nothing here rolls that back; failures become summary
    /// follow-ups instead of fatal errors where an operator can recover.
    async fn finalize_role(&mut self) -> Result<()> {
        let key_root = self.cfg.key_dir()?;
        let store = KeyStore::new(
            key_root,
            &self.cfg.product.agent_cli,
            self.cfg.key_settle(),
            self.ports.runner,
        );

        match self.role {
            Role::Supervisor => {
                self.ports.progress.step("Generating the supervisor key pair");
                match store.ensure(crate::domain::keys::SUPERVISOR_KEY_NAME).await {
                    Ok(_) => match store.export_to(&self.opts.bundle_dir) {
                        Ok(report) => {
                            self.summary
                                .record("Key bundle", self.opts.bundle_dir.display().to_string());
                            self.summary.follow_up(format!(
                                "Copy '{}' ({} files) to each agent machine before provisioning it.",
                                self.opts.bundle_dir.display(),
                                report.files
                            ));
                        }
                        Err(err) => {
                            warn!(error = %err, "key bundle export failed");
                            self.summary.follow_up(format!(
                                "Key export failed ({err:#}). Re-run 'rollout export-keys {}'.",
                                self.opts.bundle_dir.display()
                            ));
                        }
                    },
                    Err(err) => {
                        warn!(error = %err, "supervisor key generation failed");
                        self.ports.progress.warn(
                            "Warden is installed, but the supervisor key pair could not be generated",
                        );
                        self.summary.follow_up(format!(
                            "Key generation failed ({err:#}). Generate the pair manually, then \
                             re-run 'rollout export-keys {}'.",
                            self.opts.bundle_dir.display()
                        ));
                    }
                }
            }
            Role::Agent => match store.import_from(&self.opts.bundle_dir) {
                Ok(report) => {
                    self.summary.record(
                        "Key bundle",
                        format!("{} ({} files)", self.opts.bundle_dir.display(), report.files),
                    );
                }
                Err(err) => {
                    warn!(error = %err, "key bundle import failed");
                    self.ports
                        .progress
                        .warn("Supervisor key bundle not imported; the agent cannot authenticate yet");
                    self.summary.follow_up(format!(
                        "Import the supervisor key bundle: rollout import-keys {}",
                        self.opts.bundle_dir.display()
                    ));
                }
            },
        }

        if let Some(policy_file) = self.policy_file() {
            self.apply_policy(&policy_file)?;
        }
        Ok(())
    }

    /// Policy settings file to apply, when one is present: an explicit
    /// `--policy` path, else `policy.conf` alongside the agent bundle.
    fn policy_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.opts.policy_file {
            return Some(path.clone());
        }
        if self.role == Role::Agent {
            let sibling = self.opts.bundle_dir.join("policy.conf");
            if sibling.is_file() {
                return Some(sibling);
            }
        }
        None
    }

    fn apply_policy(&mut self, path: &Path) -> Result<()> {
        self.ports
            .progress
            .step(&format!("Applying policy settings from {}", path.display()));
        let mut catalog = policy::definitions();
        policy::load_enabled_state(&mut catalog, path)?;

        let data_dir = crate::domain::config::warden_data_dir(self.cfg)?;
        let applier = PolicyApplier::new(self.ports.settings, self.ports.host, &data_dir);
        let report = applier.apply_all(&catalog);

        self.summary.record(
            "Policy",
            format!(
                "{} applied, {} failed, {} skipped",
                report.succeeded, report.failed, report.skipped
            ),
        );
        if report.failed > 0 {
            self.summary.follow_up(format!(
                "Policy entries failed: {}. Re-run 'rollout policy apply {}' after resolving.",
                report.failed_keys().join(", "),
                path.display()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::process::Output;
    use std::sync::Mutex;

    use super::*;
    use crate::domain::error::exit_code_for;
    use crate::domain::keys::{KeyHalf, half_dir};
    use crate::domain::policy::SettingValue;
    use crate::domain::session::Gate;

    fn exit_status(code: i32) -> std::process::ExitStatus {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            std::process::ExitStatus::from_raw(code << 8)
        }
        #[cfg(windows)]
        {
            use std::os::windows::process::ExitStatusExt;
            std::process::ExitStatus::from_raw(code as u32)
        }
    }

    // ── Doubles ──────────────────────────────────────────────────────────────

    /// Records every invocation. `authkeys create` writes key files under
    /// `key_root`; anything else is treated as the installer and exits with
    /// `installer_code`.
    struct ScriptedRunner {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        key_root: PathBuf,
        installer_code: i32,
        generate_keys: bool,
    }

    impl ScriptedRunner {
        fn new(key_root: &Path) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                key_root: key_root.to_path_buf(),
                installer_code: 0,
                generate_keys: true,
            }
        }

        fn installer_invocations(&self) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, args)| args.first().map(String::as_str) != Some("authkeys"))
                .count()
        }
    }

    impl CommandRunner for ScriptedRunner {
        async fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<Output> {
            self.run_with_timeout(program, args, Duration::from_secs(1)).await
        }

        async fn run_with_timeout(
            &self,
            program: &str,
            args: &[&str],
            _timeout: Duration,
        ) -> anyhow::Result<Output> {
            self.calls.lock().unwrap().push((
                program.to_string(),
                args.iter().map(ToString::to_string).collect(),
            ));
            let code = if let ["authkeys", "create", name] = args {
                if self.generate_keys {
                    for half in [KeyHalf::Public, KeyHalf::Private] {
                        let dir = half_dir(&self.key_root, half, name);
                        std::fs::create_dir_all(&dir).unwrap();
                        std::fs::write(dir.join(format!("{name}_key")), b"material").unwrap();
                    }
                }
                0
            } else {
                self.installer_code
            };
            Ok(Output {
                status: exit_status(code),
                stdout: Vec::new(),
                stderr: Vec::new(),
            })
        }

        async fn run_status(
            &self,
            program: &str,
            args: &[&str],
        ) -> anyhow::Result<std::process::ExitStatus> {
            Ok(self.run(program, args).await?.status)
        }
    }

    /// Writes fixed bytes to the destination; fails for URLs in `fail_urls`.
    struct ScriptedFetcher {
        fail_urls: Vec<String>,
        fetched: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn ok() -> Self {
            Self {
                fail_urls: Vec::new(),
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn failing(url: &str) -> Self {
            Self {
                fail_urls: vec![url.to_string()],
                fetched: Mutex::new(Vec::new()),
            }
        }
    }

    impl ArtifactFetcher for ScriptedFetcher {
        fn fetch(&self, artifact: &ReleaseArtifact, dest: &Path) -> anyhow::Result<u64> {
            if self.fail_urls.contains(&artifact.download_url) {
                return Err(ProvisionError::NetworkFailure(format!(
                    "connection reset fetching {}",
                    artifact.download_url
                ))
                .into());
            }
            std::fs::write(dest, b"installer-bytes")?;
            self.fetched.lock().unwrap().push(artifact.download_url.clone());
            Ok(15)
        }
    }

    struct NoopStore;
    impl SettingsStore for NoopStore {
        fn write_machine(&self, _: &str, _: &str, _: &SettingValue) -> anyhow::Result<()> {
            Ok(())
        }
        fn read_machine(&self, _: &str, _: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }
        fn write_user(&self, _: &str, _: &str, _: &str, _: &SettingValue) -> anyhow::Result<()> {
            Ok(())
        }
        fn refresh_policy(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct StubHost {
        elevated: bool,
    }
    impl HostInspector for StubHost {
        fn is_elevated(&self) -> bool {
            self.elevated
        }
        fn free_disk_bytes(&self, _: &Path) -> anyhow::Result<u64> {
            Ok(u64::MAX)
        }
        fn standard_users(&self) -> anyhow::Result<Vec<String>> {
            Ok(vec!["pupil1".to_string()])
        }
        fn public_desktop_shortcuts(&self) -> anyhow::Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }
        fn remove_file(&self, _: &Path) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Answers every gate with one fixed decision, except an optional
    /// per-gate override.
    struct FixedDecisions {
        default: Decision,
        mismatch: Option<Decision>,
    }

    impl FixedDecisions {
        fn proceed() -> Self {
            Self {
                default: Decision::Proceed,
                mismatch: None,
            }
        }
    }

    impl DecisionPoint for FixedDecisions {
        fn decide(&self, gate: Gate, _prompt: &str) -> anyhow::Result<Decision> {
            Ok(match gate {
                Gate::VerificationMismatch => self.mismatch.unwrap_or(self.default),
                _ => self.default,
            })
        }
    }

    struct SilentProgress;
    impl ProgressReporter for SilentProgress {
        fn step(&self, _: &str) {}
        fn success(&self, _: &str) {}
        fn warn(&self, _: &str) {}
    }

    // ── Fixture ──────────────────────────────────────────────────────────────

    struct Fixture {
        _work: tempfile::TempDir,
        cfg: ProvisionConfig,
        runner: ScriptedRunner,
        fetcher: ScriptedFetcher,
        host: StubHost,
        decisions: FixedDecisions,
        bundle_dir: PathBuf,
        key_root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let work = tempfile::tempdir().expect("tempdir");
            let key_root = work.path().join("warden-keys");
            let bundle_dir = work.path().join("bundle");
            let mut cfg = ProvisionConfig::default();
            cfg.product.key_dir = Some(key_root.clone());
            cfg.product.data_dir = Some(work.path().join("warden-data"));
            Self {
                runner: ScriptedRunner::new(&key_root),
                fetcher: ScriptedFetcher::ok(),
                host: StubHost { elevated: true },
                decisions: FixedDecisions::proceed(),
                cfg,
                bundle_dir,
                key_root,
                _work: work,
            }
        }

        fn flow(&self, role: Role) -> RoleInstallFlow<'_, ScriptedRunner> {
            RoleInstallFlow::new(
                role,
                &self.cfg,
                FlowPorts {
                    runner: &self.runner,
                    fetcher: &self.fetcher,
                    settings: &NoopStore,
                    host: &self.host,
                    decisions: &self.decisions,
                    progress: &SilentProgress,
                },
                InstallOptions {
                    bundle_dir: self.bundle_dir.clone(),
                    policy_file: None,
                },
            )
        }

        fn artifact(&self) -> ReleaseArtifact {
            ReleaseArtifact {
                version: "5.0.1".to_string(),
                download_url: "https://example.invalid/warden-5.0.1-win64-setup.exe".to_string(),
                size: 15,
                published: None,
                expected_sha256: None,
                degraded: false,
            }
        }
    }

    // ── Scenarios ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_supervisor_happy_path_exports_both_halves() {
        let fx = Fixture::new();
        let summary = fx
            .flow(Role::Supervisor)
            .run(fx.artifact())
            .await
            .expect("flow completes");

        // Silent install with the supervisor flag only.
        let calls = fx.runner.calls.lock().unwrap();
        let installer = calls
            .iter()
            .find(|(_, args)| args.first().map(String::as_str) != Some("authkeys"))
            .expect("installer ran");
        assert_eq!(installer.1, vec!["/S"]);
        drop(calls);

        // The exported bundle carries both halves of the supervisor pair.
        assert!(half_dir(&fx.bundle_dir, KeyHalf::Public, "supervisor")
            .join("supervisor_key")
            .is_file());
        assert!(half_dir(&fx.bundle_dir, KeyHalf::Private, "supervisor")
            .join("supervisor_key")
            .is_file());
        assert!(summary.follow_ups().iter().any(|f| f.contains("agent")));
    }

    #[tokio::test]
    async fn test_agent_missing_bundle_still_completes_with_follow_up() {
        let fx = Fixture::new();
        let summary = fx
            .flow(Role::Agent)
            .run(fx.artifact())
            .await
            .expect("bundle absence is not fatal");

        let calls = fx.runner.calls.lock().unwrap();
        let installer = calls.first().expect("installer ran");
        assert_eq!(installer.1, vec!["/S", "/Service"]);
        drop(calls);

        assert!(
            summary
                .follow_ups()
                .iter()
                .any(|f| f.contains("import-keys")),
            "summary must tell the operator how to recover: {:?}",
            summary.follow_ups()
        );
    }

    #[tokio::test]
    async fn test_agent_imports_bundle_when_present() {
        let fx = Fixture::new();
        let src = half_dir(&fx.bundle_dir, KeyHalf::Public, "supervisor");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("supervisor_key"), b"public material").unwrap();

        fx.flow(Role::Agent).run(fx.artifact()).await.expect("flow completes");

        assert!(half_dir(&fx.key_root, KeyHalf::Public, "supervisor")
            .join("supervisor_key")
            .is_file());
    }

    #[tokio::test]
    async fn test_mismatch_without_override_never_runs_installer() {
        let fx = Fixture::new();
        let mut artifact = fx.artifact();
        artifact.expected_sha256 = Some("0".repeat(64));

        let err = fx
            .flow(Role::Supervisor)
            .run(artifact)
            .await
            .expect_err("mismatch aborts");

        assert_eq!(exit_code_for(&err), 11);
        assert_eq!(fx.runner.installer_invocations(), 0);
    }

    #[tokio::test]
    async fn test_mismatch_with_override_proceeds() {
        let mut fx = Fixture::new();
        fx.decisions.mismatch = Some(Decision::Override);
        let mut artifact = fx.artifact();
        artifact.expected_sha256 = Some("0".repeat(64));

        let summary = fx
            .flow(Role::Supervisor)
            .run(artifact)
            .await
            .expect("override continues");
        assert!(
            summary
                .entries()
                .iter()
                .any(|(_, v)| v.contains("override")),
            "override is recorded"
        );
    }

    #[tokio::test]
    async fn test_not_elevated_is_permission_denied() {
        let mut fx = Fixture::new();
        fx.host.elevated = false;
        let err = fx
            .flow(Role::Supervisor)
            .run(fx.artifact())
            .await
            .expect_err("elevation is required");
        assert_eq!(exit_code_for(&err), 13);
    }

    #[tokio::test]
    async fn test_declined_confirm_is_cancelled() {
        let mut fx = Fixture::new();
        fx.decisions.default = Decision::Abort;
        let err = fx
            .flow(Role::Supervisor)
            .run(fx.artifact())
            .await
            .expect_err("operator declined");
        assert_eq!(exit_code_for(&err), 17);
        assert_eq!(fx.runner.installer_invocations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_supervisor_key_generation_failure_does_not_abort_install() {
        let mut fx = Fixture::new();
        fx.runner.generate_keys = false;

        let summary = fx
            .flow(Role::Supervisor)
            .run(fx.artifact())
            .await
            .expect("a completed install is never rolled back");

        assert_eq!(fx.runner.installer_invocations(), 1, "installer still ran once");
        assert!(
            summary
                .follow_ups()
                .iter()
                .any(|f| f.contains("Key generation failed")),
            "the operator is told to recover manually: {:?}",
            summary.follow_ups()
        );
    }

    #[tokio::test]
    async fn test_live_download_failure_falls_back_to_pinned() {
        let mut fx = Fixture::new();
        let artifact = fx.artifact();
        fx.fetcher = ScriptedFetcher::failing(&artifact.download_url);

        let summary = fx
            .flow(Role::Supervisor)
            .run(artifact)
            .await
            .expect("fallback succeeds");

        let fetched = fx.fetcher.fetched.lock().unwrap();
        assert_eq!(fetched.len(), 1, "only the pinned URL succeeded");
        assert!(fetched[0].contains(crate::domain::config::FALLBACK_VERSION));
        drop(fetched);
        assert!(
            summary
                .entries()
                .iter()
                .any(|(_, v)| v.contains("pinned fallback")),
            "degraded resolution is visible in the summary"
        );
    }
}
