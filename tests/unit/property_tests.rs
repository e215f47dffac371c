//! Property-based tests for the portable policy settings file.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used)]

use proptest::prelude::*;

use rollout_cli::domain::policy::{apply_settings_text, definitions, settings_text};

proptest! {
    /// Any subset of enabled entries survives a save/load cycle exactly.
    #[test]
    fn prop_settings_round_trip(mask in proptest::collection::vec(any::<bool>(), 10)) {
        let mut catalog = definitions();
        prop_assert_eq!(catalog.len(), mask.len());
        for (entry, enabled) in catalog.iter_mut().zip(&mask) {
            entry.enabled = *enabled;
        }

        let text = settings_text(&catalog, chrono::Utc::now());

        let mut restored = definitions();
        apply_settings_text(&mut restored, &text);
        let got: Vec<bool> = restored.iter().map(|e| e.enabled).collect();
        prop_assert_eq!(got, mask);
    }

    /// Arbitrary text never panics the parser and never enables an entry
    /// without a well-formed `key=true` line for it.
    #[test]
    fn prop_garbage_lines_never_enable_entries(text in "[ -~\\n]{0,400}") {
        let normalized: String = text.to_ascii_lowercase().chars().filter(|c| !c.is_whitespace()).collect();
        prop_assume!(!normalized.contains("=true"));
        let mut catalog = definitions();
        apply_settings_text(&mut catalog, &text);
        prop_assert!(catalog.iter().all(|e| !e.enabled));
    }

    /// Unknown keys are ignored: adding arbitrary extra lines to a valid
    /// file does not change the restored state.
    #[test]
    fn prop_unknown_keys_are_inert(suffix in "[a-zA-Z0-9_]{1,20}") {
        let key = format!("Future{suffix}");
        prop_assume!(definitions().iter().all(|e| e.key != key));

        let mut catalog = definitions();
        catalog[0].enabled = true;
        let mut text = settings_text(&catalog, chrono::Utc::now());
        text.push_str(&format!("{key}=true\n"));

        let mut restored = definitions();
        apply_settings_text(&mut restored, &text);
        let expect: Vec<bool> = catalog.iter().map(|e| e.enabled).collect();
        let got: Vec<bool> = restored.iter().map(|e| e.enabled).collect();
        prop_assert_eq!(got, expect);
    }
}
