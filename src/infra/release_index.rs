//! GitHub releases implementation of the `ReleaseIndex` port.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::ReleaseIndex;
use crate::domain::config::ProvisionConfig;
use crate::domain::error::ProvisionError;
use crate::domain::release::{
    ReleaseArtifact, asset_matches_platform, find_checksum_in_text, is_checksum_asset,
};

/// Queries the GitHub releases API for the latest published installer.
pub struct GithubReleaseIndex {
    agent: ureq::Agent,
    owner: String,
    repo: String,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct GhRelease {
    tag_name: String,
    body: Option<String>,
    published_at: Option<String>,
    assets: Vec<GhAsset>,
}

#[derive(Debug, Deserialize)]
struct GhAsset {
    name: String,
    browser_download_url: String,
    size: u64,
}

impl GithubReleaseIndex {
    #[must_use]
    pub fn new(cfg: &ProvisionConfig) -> Self {
        let timeout = cfg.index_timeout();
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            owner: cfg.release.owner.clone(),
            repo: cfg.release.repo.clone(),
            timeout_secs: timeout.as_secs(),
        }
    }

    fn fetch_text(&self, url: &str) -> Result<String> {
        self.agent
            .get(url)
            .set("User-Agent", concat!("rollout-cli/", env!("CARGO_PKG_VERSION")))
            .call()
            .map_err(|e| crate::infra::download::classify_transport_error(&e, url, self.timeout_secs))?
            .into_string()
            .with_context(|| format!("reading response body from {url}"))
    }
}

impl ReleaseIndex for GithubReleaseIndex {
    fn latest(&self) -> Result<ReleaseArtifact> {
        let url = format!(
            "https://api.github.com/repos/{}/{}/releases/latest",
            self.owner, self.repo
        );
        let body = self.fetch_text(&url)?;
        let release: GhRelease =
            serde_json::from_str(&body).context("parsing release index response")?;
        let mut artifact = select_artifact(&release)?;

        // An expected digest comes from a checksum asset when one is
        // published; the release notes are the lower-precedence source.
        if let Some(checksum_asset) = release.assets.iter().find(|a| is_checksum_asset(&a.name)) {
            match self.fetch_text(&checksum_asset.browser_download_url) {
                Ok(text) => {
                    artifact.expected_sha256 = find_checksum_in_text(&text, artifact.file_name());
                }
                Err(err) => debug!(error = %err, "checksum asset fetch failed"),
            }
        }
        if artifact.expected_sha256.is_none()
            && let Some(body) = &release.body
        {
            artifact.expected_sha256 = find_checksum_in_text(body, artifact.file_name());
        }
        Ok(artifact)
    }
}

/// Pick the platform installer asset out of a release and build the artifact
/// descriptor. Pure so it is testable without a network.
fn select_artifact(release: &GhRelease) -> Result<ReleaseArtifact> {
    let version = release.tag_name.trim_start_matches('v');
    semver::Version::parse(version)
        .with_context(|| format!("release tag '{}' is not a version", release.tag_name))?;

    let asset = release
        .assets
        .iter()
        .find(|a| asset_matches_platform(&a.name))
        .ok_or_else(|| {
            ProvisionError::NetworkFailure(format!(
                "release {version} has no platform installer asset"
            ))
        })?;

    let published = release
        .published_at
        .as_deref()
        .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&chrono::Utc));

    Ok(ReleaseArtifact {
        version: version.to_string(),
        download_url: asset.browser_download_url.clone(),
        size: asset.size,
        published,
        expected_sha256: None,
        degraded: false,
    })
}
