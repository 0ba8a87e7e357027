//! Runtime layer errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`RuntimeError::Transport`] | delegated (`TRANSPORT_*`) | delegated |
//! | [`RuntimeError::Protocol`] | delegated (`PROTOCOL_*`) | delegated |
//! | [`RuntimeError::DiscoveryExhausted`] | `RUNTIME_DISCOVERY_EXHAUSTED` | No |
//! | [`RuntimeError::NotReady`] | `RUNTIME_NOT_READY` | No |
//! | [`RuntimeError::SubmissionStep`] | `RUNTIME_SUBMISSION_STEP` | No |
//! | [`RuntimeError::ConcurrentRunConflict`] | `RUNTIME_CONCURRENT_RUN_CONFLICT` | No |
//! | [`RuntimeError::RunFailed`] | `RUNTIME_RUN_FAILED` | No |
//! | [`RuntimeError::NoActiveRun`] | `RUNTIME_NO_ACTIVE_RUN` | No |
//!
//! Transport and protocol failures keep their own codes when wrapped so
//! a log line always names the layer that actually failed.

use kahuna_client::TransportError;
use kahuna_protocol::{ErrorCode, ProtocolError, RunState};
use thiserror::Error;

/// Failure in the run-control layer.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// A transport-level failure bubbled up from a call or discovery.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A wire payload violated the documented format.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Bounded discovery retry ran out of attempts.
    #[error("discovery of server '{server}' exhausted after {attempts} attempts")]
    DiscoveryExhausted {
        /// The server name being discovered.
        server: String,
        /// How many attempts were made.
        attempts: u32,
    },

    /// A run was submitted while the instrument was not idle.
    #[error("cannot start a run while the instrument reports {state}")]
    NotReady {
        /// The state observed before submission.
        state: RunState,
    },

    /// One step of the ordered submission sequence was rejected.
    ///
    /// Submission is fail-fast: later steps were not attempted.
    #[error("submission step {step} rejected (status code {status_code}): {error}")]
    SubmissionStep {
        /// The rejected operation name.
        step: &'static str,
        /// The vendor's negative status code.
        status_code: i64,
        /// The vendor's error description.
        error: String,
    },

    /// Another experiment already holds the instrument.
    #[error("another experiment is already in progress on the instrument")]
    ConcurrentRunConflict,

    /// The vendor reported an experiment error state.
    #[error("the instrument reported an experiment error: {status:?}")]
    RunFailed {
        /// The verbatim status text that classified as an error.
        status: String,
    },

    /// A resume or drive was requested with no submitted run to continue.
    #[error("no active run to continue")]
    NoActiveRun,
}

impl RuntimeError {
    /// Returns `true` when the failure means a run never started, as
    /// opposed to a run that failed or a broken connection.
    #[must_use]
    pub fn is_rejected_submission(&self) -> bool {
        matches!(
            self,
            Self::NotReady { .. } | Self::SubmissionStep { .. } | Self::ConcurrentRunConflict
        )
    }
}

impl ErrorCode for RuntimeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport(e) => e.code(),
            Self::Protocol(e) => e.code(),
            Self::DiscoveryExhausted { .. } => "RUNTIME_DISCOVERY_EXHAUSTED",
            Self::NotReady { .. } => "RUNTIME_NOT_READY",
            Self::SubmissionStep { .. } => "RUNTIME_SUBMISSION_STEP",
            Self::ConcurrentRunConflict => "RUNTIME_CONCURRENT_RUN_CONFLICT",
            Self::RunFailed { .. } => "RUNTIME_RUN_FAILED",
            Self::NoActiveRun => "RUNTIME_NO_ACTIVE_RUN",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_recoverable(),
            Self::Protocol(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kahuna_protocol::assert_error_codes;

    fn runtime_variants() -> Vec<RuntimeError> {
        vec![
            RuntimeError::DiscoveryExhausted {
                server: "AutomationStudio".into(),
                attempts: 5,
            },
            RuntimeError::NotReady {
                state: RunState::Running,
            },
            RuntimeError::SubmissionStep {
                step: "ChooseDesignID",
                status_code: -2,
                error: "invalid design ID".into(),
            },
            RuntimeError::ConcurrentRunConflict,
            RuntimeError::RunFailed {
                status: "Experiment error".into(),
            },
            RuntimeError::NoActiveRun,
        ]
    }

    #[test]
    fn runtime_error_codes_valid() {
        assert_error_codes(&runtime_variants(), "RUNTIME_");
    }

    #[test]
    fn wrapped_errors_keep_their_layer_code() {
        let transport = RuntimeError::from(TransportError::ConnectionClosed);
        assert_eq!(transport.code(), "TRANSPORT_CONNECTION_CLOSED");

        let protocol = RuntimeError::from(ProtocolError::malformed_prompt("race"));
        assert_eq!(protocol.code(), "PROTOCOL_MALFORMED_PROMPT");
        assert!(protocol.is_recoverable());
    }

    #[test]
    fn runtime_variants_unrecoverable() {
        for err in runtime_variants() {
            assert!(!err.is_recoverable(), "{}", err.code());
        }
    }

    #[test]
    fn rejection_detection() {
        assert!(RuntimeError::ConcurrentRunConflict.is_rejected_submission());
        assert!(RuntimeError::NotReady {
            state: RunState::Paused
        }
        .is_rejected_submission());
        assert!(!RuntimeError::NoActiveRun.is_rejected_submission());
    }
}
