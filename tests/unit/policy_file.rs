//! Policy settings file behavior through the public API.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use rollout_cli::domain::policy::{
    SPECIAL_CASE_KEYS, definitions, load_enabled_state, save_enabled_state, validate_catalog,
};

#[test]
fn test_save_then_load_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("policy.conf");

    let mut catalog = definitions();
    catalog
        .iter_mut()
        .find(|e| e.key == "DisableCmd")
        .unwrap()
        .enabled = true;
    save_enabled_state(&catalog, &path).expect("write");

    let mut restored = definitions();
    load_enabled_state(&mut restored, &path).expect("read");
    assert!(restored.iter().find(|e| e.key == "DisableCmd").unwrap().enabled);
    assert_eq!(
        restored.iter().filter(|e| e.enabled).count(),
        1,
        "only the toggled entry survives"
    );
}

#[test]
fn test_save_creates_missing_parent_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("deploy").join("lab-a").join("policy.conf");
    save_enabled_state(&definitions(), &path).expect("write with mkdir");
    assert!(path.is_file());
}

#[test]
fn test_load_missing_file_names_the_save_command() {
    let mut catalog = definitions();
    let err = load_enabled_state(&mut catalog, std::path::Path::new("/no/such/policy.conf"))
        .expect_err("missing file");
    assert!(err.to_string().contains("rollout policy save"), "got: {err}");
}

#[test]
fn test_special_case_keys_are_wired() {
    // Guard against a catalog edit that orphans a special-case handler.
    validate_catalog(&definitions()).expect("catalog is internally consistent");
    for key in SPECIAL_CASE_KEYS {
        assert!(definitions().iter().any(|e| e.key == *key), "missing {key}");
    }
}
