//! Terminal implementation of the `DecisionPoint` port.

use anyhow::Result;
use tracing::info;

use crate::application::ports::DecisionPoint;
use crate::domain::session::{Decision, Gate};

/// Asks the operator through dialoguer confirms; in non-interactive mode
/// (`--yes`, `CI`, `ROLLOUT_YES`) each gate resolves to its default without
/// touching the terminal.
pub struct TerminalDecisions {
    non_interactive: bool,
}

impl TerminalDecisions {
    #[must_use]
    pub fn new(non_interactive: bool) -> Self {
        Self { non_interactive }
    }

    /// Non-interactive defaults. A checksum mismatch always aborts without
    /// a human explicitly overriding it; everything else proceeds.
    fn default_for(gate: Gate) -> Decision {
        match gate {
            Gate::VerificationMismatch => Decision::Abort,
            Gate::PreflightSoft | Gate::InstallConfirm => Decision::Proceed,
        }
    }
}

impl DecisionPoint for TerminalDecisions {
    fn decide(&self, gate: Gate, prompt: &str) -> Result<Decision> {
        if self.non_interactive {
            let decision = Self::default_for(gate);
            info!(?gate, ?decision, "non-interactive decision");
            return Ok(decision);
        }
        match gate {
            Gate::VerificationMismatch => {
                let yes = dialoguer::Confirm::new()
                    .with_prompt(prompt)
                    .default(false)
                    .interact()?;
                Ok(if yes { Decision::Override } else { Decision::Abort })
            }
            Gate::PreflightSoft | Gate::InstallConfirm => {
                let yes = dialoguer::Confirm::new()
                    .with_prompt(prompt)
                    .default(true)
                    .interact()?;
                Ok(if yes { Decision::Proceed } else { Decision::Abort })
            }
        }
    }
}
