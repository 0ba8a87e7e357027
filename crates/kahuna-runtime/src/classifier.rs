//! Free-text status classification.
//!
//! One classification is one or two vendor queries: always `GetStatus`,
//! plus `GetActivePrompt` when the status text makes the prompt load-
//! bearing (`"Experiment running"` distinguishes three states by
//! prompt) or diagnostic (`"Experiment paused"`).
//!
//! Unknown status text is a hard error carrying the verbatim string;
//! the classifier never guesses.

use crate::error::RuntimeError;
use crate::poller::{PromptInspector, StatusPoller};
use crate::record::ObservationLog;
use crate::studio::StudioClient;
use kahuna_protocol::endpoints::{prompt_text, status_text};
use kahuna_protocol::{ActivePrompt, ProtocolError, PromptPayload, RunState};
use std::sync::Arc;
use tracing::warn;

/// One classified observation of the instrument.
#[derive(Debug, Clone)]
pub struct PollResult {
    /// The classified state. Classification itself only yields
    /// observable states; the wait loop substitutes the
    /// [`RunState::Timeout`] sentinel on deadline.
    pub state: RunState,
    /// The verbatim status text that produced it.
    pub status: String,
    /// The waiting prompt, when one was seen this cycle.
    pub prompt: Option<PromptPayload>,
}

/// Classifies vendor status text into [`RunState`]s.
pub struct StateClassifier {
    poller: StatusPoller,
    inspector: PromptInspector,
    record: Arc<ObservationLog>,
}

impl StateClassifier {
    /// Creates a classifier over a connected studio.
    #[must_use]
    pub fn new(studio: StudioClient, record: Arc<ObservationLog>) -> Self {
        Self {
            poller: StatusPoller::new(studio.clone()),
            inspector: PromptInspector::new(studio),
            record,
        }
    }

    /// One classification cycle.
    ///
    /// # Errors
    ///
    /// Propagates transport and vendor failures, and returns
    /// [`ProtocolError::UnclassifiedStatus`] for status text outside
    /// the known set. While `Running`, a malformed waiting prompt also
    /// propagates; while `Paused`, it degrades to a warning because the
    /// prompt there is diagnostic only.
    pub async fn classify(&self) -> Result<PollResult, RuntimeError> {
        let env = self.poller.poll().await?;
        let status = env.content;

        match status.as_str() {
            status_text::RUNNING => match self.inspector.inspect().await? {
                ActivePrompt::Waiting(prompt) => {
                    self.record_prompt(&prompt);
                    let state = if prompt.message.starts_with(prompt_text::NO_MORE_TIPS_PREFIX) {
                        RunState::OutOfTips
                    } else {
                        RunState::ActivePrompt
                    };
                    Ok(PollResult {
                        state,
                        status,
                        prompt: Some(prompt),
                    })
                }
                ActivePrompt::Idle => Ok(PollResult {
                    state: RunState::Running,
                    status,
                    prompt: None,
                }),
            },
            status_text::COMPLETED | status_text::NO_EXPERIMENT => {
                self.record_status(&status, env.status_code);
                Ok(PollResult {
                    state: RunState::Stopped,
                    status,
                    prompt: None,
                })
            }
            status_text::PAUSED => {
                self.record_status(&status, env.status_code);
                let prompt = self.inspect_diagnostic().await?;
                Ok(PollResult {
                    state: RunState::Paused,
                    status,
                    prompt,
                })
            }
            status_text::ABORTED => {
                self.record_status(&status, env.status_code);
                Ok(PollResult {
                    state: RunState::Aborted,
                    status,
                    prompt: None,
                })
            }
            status_text::ERROR => {
                self.record_status(&status, env.status_code);
                Ok(PollResult {
                    state: RunState::Error,
                    status,
                    prompt: None,
                })
            }
            other => {
                self.record_status(other, env.status_code);
                Err(ProtocolError::UnclassifiedStatus {
                    status: other.to_string(),
                }
                .into())
            }
        }
    }

    /// Prompt query on the `Paused` branch. A torn-down prompt here is
    /// a race, not a fault.
    async fn inspect_diagnostic(&self) -> Result<Option<PromptPayload>, RuntimeError> {
        match self.inspector.inspect().await {
            Ok(ActivePrompt::Waiting(prompt)) => {
                self.record_prompt(&prompt);
                Ok(Some(prompt))
            }
            Ok(ActivePrompt::Idle) => Ok(None),
            Err(RuntimeError::Protocol(ProtocolError::MalformedPrompt { message })) => {
                warn!(%message, "undecodable prompt while paused; continuing without it");
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    fn record_status(&self, status: &str, status_code: i64) {
        self.record
            .observe(&format!("STATUS {status} (code {status_code})"));
    }

    fn record_prompt(&self, prompt: &PromptPayload) {
        self.record.observe(&format!(
            "PROMPT [{}] {}",
            prompt.title.as_deref().unwrap_or("untitled"),
            prompt.message
        ));
    }
}
