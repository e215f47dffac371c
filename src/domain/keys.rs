//! Key bundle layout model.
//!
//! Pure path derivation only — filesystem probing and copying live in the
//! `application::services::keystore` service.
//!
//! On-disk layout of a bundle (and of the canonical key directory):
//!
//! ```text
//! <root>/public/<name>/...    required for distribution
//! <root>/private/<name>/...   present only on the generating machine
//! ```

use std::path::{Path, PathBuf};

/// The default key pair name used by role provisioning.
pub const SUPERVISOR_KEY_NAME: &str = "supervisor";

/// Which half of a key pair a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHalf {
    /// World-readable half, distributed to every agent machine.
    Public,
    /// Restricted half, held only by the supervisor.
    Private,
}

impl KeyHalf {
    /// Subdirectory name for this half.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    /// Unix permission bits appropriate for files of this half.
    ///
    /// Public material must be readable by the agent service account;
    /// private material is restricted to administrators.
    #[must_use]
    pub fn file_mode(self) -> u32 {
        match self {
            Self::Public => 0o644,
            Self::Private => 0o600,
        }
    }

    /// Unix permission bits for directories of this half.
    #[must_use]
    pub fn dir_mode(self) -> u32 {
        match self {
            Self::Public => 0o755,
            Self::Private => 0o700,
        }
    }
}

/// Path of one key half's directory under `root`.
#[must_use]
pub fn half_dir(root: &Path, half: KeyHalf, name: &str) -> PathBuf {
    root.join(half.dir_name()).join(name)
}

/// Classify a path relative to a bundle root as public or private material.
///
/// Returns `None` for paths outside the `public/` and `private/` subtrees
/// (stray files a bundle may carry; they keep their existing permissions).
#[must_use]
pub fn classify(relative: &Path) -> Option<KeyHalf> {
    match relative.components().next() {
        Some(c) if c.as_os_str() == "public" => Some(KeyHalf::Public),
        Some(c) if c.as_os_str() == "private" => Some(KeyHalf::Private),
        _ => None,
    }
}
