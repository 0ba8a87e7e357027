//! Active-prompt payloads.
//!
//! The `GetActivePrompt` query answers with an envelope whose
//! `StatusCode` distinguishes "a prompt is waiting" (0) from "no prompt"
//! (1). When a prompt is waiting, the envelope's `Content` is a second,
//! nested JSON document carrying the prompt's message, title, and
//! options. Decoding is strict: a payload with neither of the documented
//! message keys is a [`ProtocolError::MalformedPrompt`], never a guess.

use crate::envelope::StatusEnvelope;
use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const PROMPT_WAITING: i64 = 0;
const NO_PROMPT: i64 = 1;

/// Decoded nested prompt document.
///
/// # Message resolution
///
/// The primary message is the `InformationMessage` field if present,
/// else the `value` field; absence of both is a decode error.
///
/// # Example
///
/// ```
/// use kahuna_protocol::PromptPayload;
///
/// let payload = PromptPayload::decode(
///     r#"{"InformationMessage":"Paused by user","Title":"Experiment Paused","Option":["OK"]}"#,
/// )
/// .unwrap();
/// assert_eq!(payload.message, "Paused by user");
/// assert_eq!(payload.title.as_deref(), Some("experiment paused"));
/// assert!(payload.offers_option("OK"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPayload {
    /// The resolved prompt message.
    pub message: String,
    /// Prompt dialog title, lowercased at decode; policy matching is
    /// always on the lowercase form.
    pub title: Option<String>,
    /// The input options the dialog offers.
    pub options: Vec<String>,
}

impl PromptPayload {
    /// Decodes the nested prompt JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedPrompt`] when the text is not a
    /// JSON object or neither `InformationMessage` nor `value` is
    /// present as a string.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let doc: Value = serde_json::from_str(raw)
            .map_err(|e| ProtocolError::malformed_prompt(e.to_string()))?;

        let obj = doc
            .as_object()
            .ok_or_else(|| ProtocolError::malformed_prompt("prompt content is not an object"))?;

        let message = obj
            .get("InformationMessage")
            .and_then(Value::as_str)
            .or_else(|| obj.get("value").and_then(Value::as_str))
            .ok_or_else(|| {
                ProtocolError::malformed_prompt(
                    "neither 'InformationMessage' nor 'value' present",
                )
            })?
            .to_string();

        let title = obj
            .get("Title")
            .and_then(Value::as_str)
            .map(str::to_lowercase);

        let options = obj
            .get("Option")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            message,
            title,
            options,
        })
    }

    /// Returns `true` if the dialog offers the given input option.
    #[must_use]
    pub fn offers_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// Returns `true` if the lowercased title contains the fragment.
    #[must_use]
    pub fn title_contains(&self, fragment: &str) -> bool {
        self.title.as_deref().is_some_and(|t| t.contains(fragment))
    }

    /// The first sentence of the message, for compact operator reports.
    #[must_use]
    pub fn message_summary(&self) -> &str {
        self.message.split('.').next().unwrap_or(&self.message)
    }
}

/// Outcome of an active-prompt query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivePrompt {
    /// A prompt is waiting for user input.
    Waiting(PromptPayload),
    /// No prompt is waiting.
    Idle,
}

impl ActivePrompt {
    /// Interprets a `GetActivePrompt` envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedPrompt`] for an undocumented
    /// status code or an undecodable nested payload.
    pub fn from_envelope(env: &StatusEnvelope) -> Result<Self, ProtocolError> {
        match env.status_code {
            PROMPT_WAITING => Ok(Self::Waiting(PromptPayload::decode(&env.content)?)),
            NO_PROMPT => Ok(Self::Idle),
            other => Err(ProtocolError::malformed_prompt(format!(
                "unexpected prompt status code {other}"
            ))),
        }
    }

    /// Returns the payload if a prompt is waiting.
    #[must_use]
    pub fn payload(&self) -> Option<&PromptPayload> {
        match self {
            Self::Waiting(p) => Some(p),
            Self::Idle => None,
        }
    }

    /// Returns `true` if a prompt is waiting.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting(_))
    }
}
