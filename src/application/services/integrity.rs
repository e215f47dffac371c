//! Integrity verification of downloaded artifacts.
//!
//! Streaming SHA-256 with a three-way verification result: a missing
//! expected digest is reported as `Unknown`, never silently passed.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Three-way verification outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Computed digest equals the expected digest.
    Match,
    /// Computed digest differs — callers must treat this as a hard stop
    /// requiring explicit operator override.
    Mismatch { expected: String, actual: String },
    /// No expected digest was available. Advisory only: the computed digest
    /// is surfaced for manual checking.
    Unknown { actual: String },
}

/// Compute the SHA-256 hex digest of a file.
///
/// Reads the file in 64 KB chunks so memory use does not scale with file
/// size.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

/// Verify a file against an optional expected digest.
///
/// # Errors
///
/// Returns an error only when the file itself cannot be hashed; absence of
/// an expected digest is the `Unknown` outcome, not an error.
pub fn verify(path: &Path, expected: Option<&str>) -> Result<Verification> {
    let actual = sha256_file(path)?;
    Ok(match expected {
        None => Verification::Unknown { actual },
        Some(expected) if expected.eq_ignore_ascii_case(&actual) => Verification::Match,
        Some(expected) => Verification::Mismatch {
            expected: expected.to_lowercase(),
            actual,
        },
    })
}

/// Lowercase hex encoding of a byte slice.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
