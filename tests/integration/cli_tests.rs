//! CLI surface tests: help, version, argument validation.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn rollout() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rollout"));
    cmd.env("NO_COLOR", "1");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    // clap with arg_required_else_help shows help on stderr and exits 2
    rollout().assert().code(2).stderr(predicate::str::contains(
        "Fleet provisioning for the Warden remote-administration agent",
    ));
}

#[test]
fn test_cli_help_flag_shows_help() {
    rollout()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"));
}

#[test]
fn test_version_command_shows_version() {
    rollout()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rollout 0.3.0"));
}

#[test]
fn test_no_color_env_value_is_only_checked_for_presence() {
    // The ecosystem convention is "any non-empty value disables color";
    // the value itself must never be parsed as a flag argument.
    for value in ["1", "true", "yes please"] {
        rollout()
            .env("NO_COLOR", value)
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains("rollout 0.3.0"));
    }
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    rollout()
        .arg("version")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""version":"0.3.0""#));
}

// --- Command hierarchy tests ---

#[test]
fn test_help_lists_provisioning_commands() {
    for command in ["install", "uninstall", "info", "export-keys", "import-keys", "policy"] {
        rollout()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(command));
    }
}

#[test]
fn test_install_requires_a_role() {
    rollout()
        .arg("install")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("<ROLE>"));
}

#[test]
fn test_install_rejects_unknown_role() {
    rollout()
        .args(["install", "observer"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_install_help_shows_roles_and_flags() {
    rollout()
        .args(["install", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("supervisor"))
        .stdout(predicate::str::contains("agent"))
        .stdout(predicate::str::contains("--bundle"))
        .stdout(predicate::str::contains("--policy"));
}

#[test]
fn test_info_json_is_machine_readable() {
    let home = tempfile::tempdir().expect("tempdir");
    let output = rollout()
        .env("HOME", home.path())
        .args(["info", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value =
        serde_json::from_slice(&output).expect("info --json emits valid JSON");
    assert!(parsed.get("hostname").is_some());
    assert!(parsed["keys"].get("public").is_some());
}
