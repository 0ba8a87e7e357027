//! Prompt-handling policy.
//!
//! Pure decisions, separated from the control loop so the escalation
//! rules are testable without a transport. The policy matches on
//! lowercased title fragments because the vendor is not consistent
//! about dialog titles across versions.

use kahuna_protocol::endpoints::prompt_text;
use kahuna_protocol::PromptPayload;

/// What to do about a prompt observed while the experiment is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptDisposition {
    /// A routine pause dialog; acknowledge with `"OK"` and keep going.
    AcknowledgePause,
    /// A pause dialog under a pause-and-report run; stop driving and
    /// hand the message to the caller.
    ReportPause {
        /// First sentence of the prompt message.
        message: String,
    },
    /// The hardware-reset dialog; always declined, a reset mid-run
    /// would lose the deck state.
    DeclineHardwareReset,
    /// Another experiment holds the instrument; fatal for this run.
    ConcurrentConflict,
    /// Not a dialog the policy knows; leave it to the operator.
    Unhandled,
}

/// Classifies a waiting prompt against the dialog policy table.
#[must_use]
pub fn interpret_prompt(prompt: &PromptPayload, pause_on_prompt: bool) -> PromptDisposition {
    if prompt.title_contains(prompt_text::TITLE_PAUSED) {
        if pause_on_prompt {
            PromptDisposition::ReportPause {
                message: prompt.message_summary().to_string(),
            }
        } else {
            PromptDisposition::AcknowledgePause
        }
    } else if prompt.title_contains(prompt_text::TITLE_RESET_HARDWARE) {
        PromptDisposition::DeclineHardwareReset
    } else if prompt.title_contains(prompt_text::TITLE_EXPERIMENT_IN_PROGRESS) {
        PromptDisposition::ConcurrentConflict
    } else {
        PromptDisposition::Unhandled
    }
}

/// How to answer a problem pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseRecovery {
    /// Retry the failed action.
    Repeat,
    /// Too many consecutive problems; give up on the run.
    Abort,
}

/// Whether a pause-state prompt describes a hardware problem rather
/// than an operator hold.
#[must_use]
pub fn is_problem_pause(prompt: Option<&PromptPayload>) -> bool {
    prompt.is_some_and(|p| p.message.to_lowercase().contains("error"))
}

/// Escalation rule for consecutive problem pauses: repeat the action
/// until the run has burned through the threshold, then abort.
/// `consecutive_problems` counts the current pause.
#[must_use]
pub fn pause_recovery(consecutive_problems: u32, threshold: u32) -> PauseRecovery {
    if consecutive_problems > threshold {
        PauseRecovery::Abort
    } else {
        PauseRecovery::Repeat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(message: &str, title: &str) -> PromptPayload {
        PromptPayload {
            message: message.to_string(),
            title: Some(title.to_lowercase()),
            options: vec!["OK".into()],
        }
    }

    #[test]
    fn pause_dialog_is_acknowledged_by_default() {
        let p = prompt("Paused by user. Press OK to resume.", "Experiment Paused");
        assert_eq!(
            interpret_prompt(&p, false),
            PromptDisposition::AcknowledgePause
        );
    }

    #[test]
    fn pause_dialog_is_reported_when_requested() {
        let p = prompt("Paused by user. Press OK to resume.", "Experiment Paused");
        assert_eq!(
            interpret_prompt(&p, true),
            PromptDisposition::ReportPause {
                message: "Paused by user".into()
            }
        );
    }

    #[test]
    fn hardware_reset_is_declined() {
        let p = prompt("Reset hardware before continuing?", "Reset Hardware");
        assert_eq!(
            interpret_prompt(&p, false),
            PromptDisposition::DeclineHardwareReset
        );
    }

    #[test]
    fn concurrent_experiment_is_fatal() {
        let p = prompt(
            "Another client started a run.",
            "Experiment In Progress",
        );
        assert_eq!(
            interpret_prompt(&p, false),
            PromptDisposition::ConcurrentConflict
        );
    }

    #[test]
    fn unknown_dialogs_are_left_alone() {
        let p = prompt("Check the gripper.", "Gripper Check");
        assert_eq!(interpret_prompt(&p, false), PromptDisposition::Unhandled);
        // Untitled prompts too.
        let untitled = PromptPayload {
            message: "Check the gripper.".into(),
            title: None,
            options: vec![],
        };
        assert_eq!(
            interpret_prompt(&untitled, false),
            PromptDisposition::Unhandled
        );
    }

    #[test]
    fn problem_detection_is_case_insensitive() {
        let p = prompt("Dispense ERROR at position A3.", "Experiment Paused");
        assert!(is_problem_pause(Some(&p)));
        let hold = prompt("Holding for operator.", "Experiment Paused");
        assert!(!is_problem_pause(Some(&hold)));
        assert!(!is_problem_pause(None));
    }

    #[test]
    fn escalation_aborts_past_the_threshold() {
        for problems in 1..=5 {
            assert_eq!(pause_recovery(problems, 5), PauseRecovery::Repeat);
        }
        assert_eq!(pause_recovery(6, 5), PauseRecovery::Abort);
    }
}
