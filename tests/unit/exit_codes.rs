//! Exit-code taxonomy seen through the public error API.

#![allow(clippy::expect_used)]

use anyhow::Context as _;

use rollout_cli::domain::error::{ProvisionError, exit_code_for};

#[test]
fn test_taxonomy_is_stable() {
    let cases: Vec<(anyhow::Error, i32)> = vec![
        (ProvisionError::NetworkFailure("reset".into()).into(), 10),
        (
            ProvisionError::NetworkTimeout {
                action: "downloading installer".into(),
                seconds: 600,
            }
            .into(),
            10,
        ),
        (
            ProvisionError::VerificationMismatch {
                expected: "aa".into(),
                actual: "bb".into(),
            }
            .into(),
            11,
        ),
        (ProvisionError::InstallerNonZeroExit { code: 3 }.into(), 12),
        (ProvisionError::PermissionDenied("reg write".into()).into(), 13),
        (
            ProvisionError::KeyGenerationFailed {
                tool: "warden-cli".into(),
                name: "supervisor".into(),
                reason: "exited with code 1".into(),
            }
            .into(),
            14,
        ),
        (
            ProvisionError::SourceBundleMissing { path: "keys".into() }.into(),
            15,
        ),
        (ProvisionError::PreflightHard("no uninstaller".into()).into(), 16),
        (ProvisionError::Cancelled.into(), 17),
    ];
    for (err, code) in cases {
        assert_eq!(exit_code_for(&err), code, "for error: {err}");
    }
}

#[test]
fn test_wrapped_errors_keep_their_code() {
    let err = anyhow::Error::from(ProvisionError::Cancelled)
        .context("running the supervisor flow")
        .context("provisioning this machine");
    assert_eq!(exit_code_for(&err), 17);
}

#[test]
fn test_unclassified_errors_are_generic() {
    let err = anyhow::anyhow!("something else entirely");
    assert_eq!(exit_code_for(&err), 1);
}

#[test]
fn test_bundle_missing_message_tells_the_operator_what_to_do() {
    let err = ProvisionError::SourceBundleMissing {
        path: "./keys".into(),
    };
    let msg = err.to_string();
    assert!(msg.contains("rollout install supervisor"), "got: {msg}");
    assert!(msg.contains("--bundle"), "got: {msg}");
}
