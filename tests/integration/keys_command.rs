//! Key bundle commands through the real binary.

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
fn test_import_missing_bundle_exits_fifteen() {
    let home = tempfile::tempdir().expect("tempdir");
    rollout(home.path())
        .args(["import-keys", "/no/such/bundle"])
        .assert()
        .code(15)
        .stderr(predicate::str::contains("Key bundle not found"));
}

#[cfg(unix)]
#[test]
fn test_export_copies_seeded_material() {
    let home = tempfile::tempdir().expect("tempdir");
    let key_dir = home.path().join(".warden/keys/public/supervisor");
    std::fs::create_dir_all(&key_dir).expect("seed dirs");
    std::fs::write(key_dir.join("supervisor_key"), b"public material").expect("seed key");

    let dest = home.path().join("bundle");
    rollout(home.path())
        .arg("export-keys")
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 key file(s)"));

    assert!(dest.join("public/supervisor/supervisor_key").is_file());
}

#[cfg(unix)]
#[test]
fn test_import_then_export_round_trips() {
    let home = tempfile::tempdir().expect("tempdir");
    let bundle = home.path().join("bundle/public/supervisor");
    std::fs::create_dir_all(&bundle).expect("seed dirs");
    std::fs::write(bundle.join("supervisor_key"), b"public material").expect("seed key");

    rollout(home.path())
        .arg("import-keys")
        .arg(home.path().join("bundle"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 key file(s)"));

    assert!(
        home.path()
            .join(".warden/keys/public/supervisor/supervisor_key")
            .is_file()
    );
}
