//! Release resolution with degraded fallback.
//!
//! Wraps a [`ReleaseIndex`] port: any lookup failure — network, timeout,
//! malformed response, no platform asset — degrades to the pinned
//! known-good artifact instead of aborting. The fallback is marked
//! `degraded: true` so callers warn the operator.

use tracing::warn;

use crate::application::ports::ReleaseIndex;
use crate::domain::config::ProvisionConfig;
use crate::domain::release::ReleaseArtifact;

/// Resolve the latest installer artifact, falling back to the pinned
/// descriptor on any failure.
///
/// Never returns an error: degraded resolution is a warning, not a stop.
pub fn resolve_latest(index: &impl ReleaseIndex, cfg: &ProvisionConfig) -> ReleaseArtifact {
    match index.latest() {
        Ok(artifact) => artifact,
        Err(err) => {
            warn!(error = %err, "release lookup failed, using pinned fallback");
            cfg.pinned_artifact()
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::config::FALLBACK_VERSION;

    struct FixedIndex(Option<ReleaseArtifact>);

    impl ReleaseIndex for FixedIndex {
        fn latest(&self) -> anyhow::Result<ReleaseArtifact> {
            self.0
                .clone()
                .ok_or_else(|| anyhow::anyhow!("connection refused"))
        }
    }

    fn live_artifact() -> ReleaseArtifact {
        ReleaseArtifact {
            version: "5.1.0".into(),
            download_url: "https://example.com/warden-5.1.0-win64-setup.exe".into(),
            size: 1024,
            published: None,
            expected_sha256: Some("ab".repeat(32)),
            degraded: false,
        }
    }

    #[test]
    fn test_live_lookup_passes_through() {
        let cfg = ProvisionConfig::default();
        let resolved = resolve_latest(&FixedIndex(Some(live_artifact())), &cfg);
        assert_eq!(resolved.version, "5.1.0");
        assert!(!resolved.degraded);
    }

    #[test]
    fn test_lookup_failure_degrades_to_pinned() {
        let cfg = ProvisionConfig::default();
        let resolved = resolve_latest(&FixedIndex(None), &cfg);
        assert!(resolved.degraded);
        assert_eq!(resolved.version, FALLBACK_VERSION);
        assert!(resolved.expected_sha256.is_none());
    }
}
