//! Terminal output for command handlers.
//!
//! All human-facing text funnels through [`OutputContext`] so quiet mode
//! and color handling stay in one place. Handlers printing JSON bypass
//! this module and write to stdout directly.

pub mod progress;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
pub use styles::Styles;

use crate::application::ports::ProgressReporter;
use crate::domain::session::SessionSummary;

/// Styling plus terminal state, shared by every command handler.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Build the context from CLI flags and the environment. Colors need a
    /// TTY, no `--no-color`, and no `NO_COLOR` in the environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();

        let mut styles = Styles::default();
        if !no_color && is_tty && std::env::var("NO_COLOR").is_err() {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Spinners and bars need a TTY and are pointless under `--quiet`.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// `✓` line for a completed step. Suppressed under `--quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// `⚠` line for an advisory the operator should read. Suppressed
    /// under `--quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// `✗` line on stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// `ℹ` line for neutral progress notes. Suppressed under `--quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Section header. Suppressed under `--quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Aligned key-value line with the key dimmed. Suppressed under
    /// `--quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {:<14}{value}", key.style(self.styles.dim));
        }
    }

    /// Render a completed session summary: recorded facts, then any
    /// follow-up actions the operator still has to perform.
    pub fn summary(&self, summary: &SessionSummary) {
        if self.quiet {
            return;
        }
        println!();
        self.header("Session summary");
        for (label, value) in summary.entries() {
            self.kv(label, value);
        }
        if !summary.follow_ups().is_empty() {
            println!();
            self.header("Next steps");
            for (i, action) in summary.follow_ups().iter().enumerate() {
                println!("  {}. {action}", i + 1);
            }
        }
    }
}

impl ProgressReporter for OutputContext {
    fn step(&self, message: &str) {
        self.info(message);
    }

    fn success(&self, message: &str) {
        Self::success(self, message);
    }

    fn warn(&self, message: &str) {
        Self::warn(self, message);
    }
}
