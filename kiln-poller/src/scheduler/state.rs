//! Invocation states

use kiln_core::{GenerationError, GenerationOutcome};

/// Where one invocation currently is
///
/// `Submitting` is initial; `Succeeded`, `Failed` and `TimedOut` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Submitting,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
}

impl InvocationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::TimedOut)
    }

    /// Terminal state an outcome corresponds to
    pub fn of_outcome(outcome: &GenerationOutcome) -> Self {
        match outcome {
            Ok(_) => Self::Succeeded,
            Err(GenerationError::TimedOut { .. }) => Self::TimedOut,
            Err(_) => Self::Failed,
        }
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(self, next: Self) -> bool {
        use InvocationState::*;
        matches!(
            (self, next),
            (Submitting, Polling)
                | (Submitting, Failed)
                | (Submitting, TimedOut)
                | (Polling, Polling)
                | (Polling, Succeeded)
                | (Polling, Failed)
                | (Polling, TimedOut)
        )
    }
}

impl std::fmt::Display for InvocationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Submitting => "submitting",
            Self::Polling => "polling",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        };
        f.write_str(name)
    }
}
