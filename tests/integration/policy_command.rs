//! Policy commands through the real binary.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn rollout(home: &std::path::Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rollout"));
    cmd.env("NO_COLOR", "1");
    cmd.env("HOME", home);
    cmd
}

#[test]
fn test_policy_list_shows_catalog() {
    let home = tempfile::tempdir().expect("tempdir");
    rollout(home.path())
        .args(["policy", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AutoUpdate"))
        .stdout(predicate::str::contains("DesktopWallpaper"));
}

#[test]
fn test_policy_list_json_has_stable_keys() {
    let home = tempfile::tempdir().expect("tempdir");
    let output = rollout(home.path())
        .args(["policy", "list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value =
        serde_json::from_slice(&output).expect("policy list --json emits valid JSON");
    let policies = parsed["policies"].as_array().expect("policies array");
    assert_eq!(policies.len(), 10);
    assert!(policies.iter().any(|p| p["key"] == "CleanPublicDesktop"));
}

#[test]
fn test_policy_save_writes_portable_file() {
    let home = tempfile::tempdir().expect("tempdir");
    let path = home.path().join("policy.conf");
    rollout(home.path())
        .args(["policy", "save"])
        .arg(&path)
        .assert()
        .success();

    let content = std::fs::read_to_string(&path).expect("saved file");
    assert!(content.starts_with("# rollout policy settings"));
    assert!(content.contains("AutoUpdate="));
    // One line per catalog entry plus the two header lines.
    assert_eq!(content.lines().count(), 12);
}

#[test]
fn test_policy_apply_missing_file_names_the_save_command() {
    let home = tempfile::tempdir().expect("tempdir");
    rollout(home.path())
        .args(["policy", "apply"])
        .arg(home.path().join("absent.conf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("rollout policy save").or(
            // Non-elevated environments fail earlier, at the elevation gate.
            predicate::str::contains("elevated"),
        ));
}
