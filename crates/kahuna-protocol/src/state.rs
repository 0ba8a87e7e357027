//! Application-level run state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete state of the automation run, inferred from vendor responses.
///
/// The vendor service exposes no state machine of its own; these states
/// are derived by the classifier from the free-text status query plus a
/// conditional active-prompt query. The set is closed and the variants
/// are mutually exclusive.
///
/// [`RunState::Timeout`] is special: it is a sentinel returned only by
/// the wait-for-change loop to mean "no observed transition within the
/// deadline". It never describes the remote system and must never be
/// stored as a last-known state; [`RunState::is_observable`] is `false`
/// for it.
///
/// # Example
///
/// ```
/// use kahuna_protocol::RunState;
///
/// assert!(RunState::Running.is_observable());
/// assert!(!RunState::Timeout.is_observable());
/// assert!(RunState::Stopped.is_terminal());
/// assert_eq!(RunState::OutOfTips.to_string(), "OutOfTips");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// No experiment is active (also reported after completion).
    Stopped,
    /// The experiment is executing with no prompt waiting.
    Running,
    /// The experiment is paused, typically waiting on operator input.
    Paused,
    /// A prompt is waiting whose message begins with `"No more tips"`;
    /// requires physical intervention and is never auto-acknowledged.
    OutOfTips,
    /// A prompt other than out-of-tips is waiting for user input.
    ActivePrompt,
    /// The experiment was aborted and the vendor is tearing it down.
    Aborted,
    /// The vendor reported an experiment error.
    Error,
    /// Wait-loop sentinel: the deadline elapsed with no state change.
    Timeout,
}

impl RunState {
    /// Returns `true` for states that describe the remote system.
    ///
    /// `Timeout` is the only non-observable variant; it must never be
    /// recorded as a last-known state.
    #[must_use]
    pub fn is_observable(self) -> bool {
        !matches!(self, Self::Timeout)
    }

    /// Returns `true` for states in which no run is in progress.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Aborted | Self::Error)
    }

    /// Returns `true` for states in which an operator's attention is
    /// required before the run can proceed.
    #[must_use]
    pub fn needs_attention(self) -> bool {
        matches!(self, Self::OutOfTips | Self::ActivePrompt | Self::Paused)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "Stopped",
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::OutOfTips => "OutOfTips",
            Self::ActivePrompt => "ActivePrompt",
            Self::Aborted => "Aborted",
            Self::Error => "Error",
            Self::Timeout => "Timeout",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_not_observable() {
        assert!(!RunState::Timeout.is_observable());
        for state in [
            RunState::Stopped,
            RunState::Running,
            RunState::Paused,
            RunState::OutOfTips,
            RunState::ActivePrompt,
            RunState::Aborted,
            RunState::Error,
        ] {
            assert!(state.is_observable(), "{state}");
        }
    }

    #[test]
    fn terminal_states() {
        assert!(RunState::Stopped.is_terminal());
        assert!(RunState::Aborted.is_terminal());
        assert!(RunState::Error.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(!RunState::Timeout.is_terminal());
    }

    #[test]
    fn attention_states() {
        assert!(RunState::OutOfTips.needs_attention());
        assert!(RunState::ActivePrompt.needs_attention());
        assert!(RunState::Paused.needs_attention());
        assert!(!RunState::Running.needs_attention());
    }

    #[test]
    fn display_names() {
        assert_eq!(RunState::OutOfTips.to_string(), "OutOfTips");
        assert_eq!(RunState::ActivePrompt.to_string(), "ActivePrompt");
        assert_eq!(RunState::Timeout.to_string(), "Timeout");
    }
}
