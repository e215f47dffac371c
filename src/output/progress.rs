//! Spinner helpers for long-running steps.

#![allow(clippy::expect_used)] // Templates are compile-time constants

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Spinner shown while a step of unknown duration runs.
///
/// # Panics
///
/// The template is a compile-time constant; the `expect` cannot fire.
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_strings(TICK_FRAMES)
        .template("{spinner:.cyan} {msg}")
        .expect("valid template");
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Resolve a spinner into a permanent `✓ message` line.
pub fn finish_ok(pb: &ProgressBar, msg: &str) {
    let style = ProgressStyle::default_spinner()
        .template("{prefix:.green} {msg}")
        .expect("valid template");
    pb.set_style(style);
    pb.set_prefix("✓");
    pb.finish_with_message(msg.to_string());
}
