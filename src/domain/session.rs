//! Installation session model: roles, flow stages, decision points.

use std::fmt;

/// The two installation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Full management console plus the private key.
    Supervisor,
    /// Background service only; holds the public key.
    Agent,
}

impl Role {
    /// Silent-install arguments for the external installer.
    ///
    /// The Agent role suppresses the interactive console component.
    #[must_use]
    pub fn installer_args(self) -> &'static [&'static str] {
        match self {
            Self::Supervisor => &["/S"],
            Self::Agent => &["/S", "/Service"],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supervisor => write!(f, "supervisor"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

/// Stages of the role install flow, in order.
///
/// `Failed` is reachable from any stage; `Cancelled` only before the
/// external installer has run (nothing irreversible has happened yet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InstallStage {
    Start,
    RoleSelected,
    Preflighted,
    Downloaded,
    Verified,
    Installed,
    RoleFinalized,
    Complete,
}

impl InstallStage {
    /// True while an operator decline may still cancel the flow.
    #[must_use]
    pub fn cancellable(self) -> bool {
        self < Self::Installed
    }
}

/// Outcome of an operator decision point.
///
/// Decouples the state machine from any particular input mechanism so the
/// same flow runs headless in tests and under `--yes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Continue normally.
    Proceed,
    /// Stop the flow; maps to `Cancelled` (or `Failed` at a hard gate).
    Abort,
    /// Continue past a blocking condition on explicit operator say-so.
    Override,
}

/// Gates at which the flow consults a decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// A soft preflight finding (low disk, no standard users).
    PreflightSoft,
    /// Digest mismatch — default is abort; `Override` is required to continue.
    VerificationMismatch,
    /// Confirm before launching the irreversible install step.
    InstallConfirm,
}

/// Append-only summary of labeled session facts, displayed once at the end.
#[derive(Debug, Default)]
pub struct SessionSummary {
    entries: Vec<(String, String)>,
    follow_ups: Vec<String>,
}

impl SessionSummary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a labeled fact. Facts are never removed or rewritten.
    pub fn record(&mut self, label: &str, value: impl Into<String>) {
        self.entries.push((label.to_string(), value.into()));
    }

    /// Record an action the operator must perform after the session.
    pub fn follow_up(&mut self, instruction: impl Into<String>) {
        self.follow_ups.push(instruction.into());
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    #[must_use]
    pub fn follow_ups(&self) -> &[String] {
        &self.follow_ups
    }
}
