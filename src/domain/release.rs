//! Release artifact model plus checksum extraction helpers.
//!
//! Pure functions only — the actual index fetch lives in
//! `infra::release_index`.

use regex::Regex;

/// A resolved installer artifact for one install invocation.
///
/// Ephemeral — never persisted beyond the invocation that resolved it.
#[derive(Debug, Clone)]
pub struct ReleaseArtifact {
    /// Version string without a leading `v`.
    pub version: String,
    /// Direct download URL for the platform installer.
    pub download_url: String,
    /// Expected size in bytes as published (0 when unknown).
    pub size: u64,
    /// Publish timestamp as reported by the index.
    pub published: Option<chrono::DateTime<chrono::Utc>>,
    /// Expected SHA-256 hex digest, when the index published one.
    pub expected_sha256: Option<String>,
    /// True when this artifact came from the pinned fallback rather than a
    /// live lookup. Callers must warn the operator.
    pub degraded: bool,
}

impl ReleaseArtifact {
    /// File name portion of the download URL.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.download_url
            .rsplit('/')
            .next()
            .unwrap_or(&self.download_url)
    }
}

/// The installer asset name patterns accepted for the current platform.
///
/// Warden publishes a single win64 setup executable per release; on other
/// platforms provisioning goes through the system package manager, so the
/// win64 asset is also what gets staged for bench testing there.
#[must_use]
pub fn asset_matches_platform(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("win64") && (lower.ends_with(".exe") || lower.ends_with(".msi"))
}

/// True when the asset looks like a checksum companion file.
#[must_use]
pub fn is_checksum_asset(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("sha256") || lower.contains("checksum")
}

/// Extract a SHA-256 hex digest for `file_name` from free-form checksum text
/// (a `sha256sum` style listing or a release body).
///
/// A line mentioning `file_name` wins; otherwise the first 64-hex token found
/// is returned as a fallback.
#[must_use]
pub fn find_checksum_in_text(text: &str, file_name: &str) -> Option<String> {
    #[allow(clippy::expect_used)] // compile-time constant pattern
    let hex64 = Regex::new(r"\b([A-Fa-f0-9]{64})\b").expect("valid regex");

    let mut fallback = None;
    for line in text.lines() {
        if let Some(m) = hex64.captures(line) {
            let digest = m[1].to_lowercase();
            if line.contains(file_name) {
                return Some(digest);
            }
            if fallback.is_none() {
                fallback = Some(digest);
            }
        }
    }
    fallback
}
