//! Stylesheet for terminal output.
//!
//! A `Styles` value starts with every field as a no-op style so plain
//! output needs no branching; `colorize` swaps the real palette in when
//! color is enabled.

use owo_colors::Style;

/// Styles applied by [`OutputContext`](crate::output::OutputContext).
#[derive(Default, Clone)]
pub struct Styles {
    /// `✓` prefix on completed steps.
    pub success: Style,
    /// `⚠` prefix on advisory messages.
    pub warning: Style,
    /// `✗` prefix on failures.
    pub error: Style,
    /// `ℹ` prefix on neutral notices.
    pub info: Style,
    /// Key column of key-value readouts.
    pub dim: Style,
    /// Section headers.
    pub header: Style,
}

impl Styles {
    /// Switch every field from the no-op default to the color palette.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.info = Style::new().blue();
        self.dim = Style::new().dimmed();
        self.header = Style::new().bold().cyan();
    }
}
