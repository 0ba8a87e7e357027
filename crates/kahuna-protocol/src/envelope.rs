//! The vendor `ReturnValue` envelope.
//!
//! Every RPC against the automation services answers with a JSON text of
//! the shape `{"Status": "...", "Content": "...", "Error": "...",
//! "StatusCode": n}`. [`StatusEnvelope`] is the validated decode of that
//! text; [`StatusEnvelope::check`] enforces the one envelope invariant
//! callers must respect: a negative `StatusCode` means the call failed
//! and `Content` must not be trusted.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};

/// Coarse success flag inside the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeStatus {
    /// The vendor reports the call as succeeded.
    Success,
    /// The vendor reports the call as failed.
    Failure,
}

/// Decoded `ReturnValue` envelope.
///
/// # Example
///
/// ```
/// use kahuna_protocol::StatusEnvelope;
///
/// let raw = r#"{"Status":"Success","Content":"Experiment running","Error":"","StatusCode":0}"#;
/// let env = StatusEnvelope::parse(raw).unwrap();
/// assert_eq!(env.content, "Experiment running");
/// assert!(env.check().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusEnvelope {
    /// Coarse success flag.
    pub status: EnvelopeStatus,
    /// Free-text payload. For prompt queries this is itself a JSON
    /// document requiring a second parse.
    pub content: String,
    /// Error description; meaningful when `status_code` is negative.
    #[serde(default)]
    pub error: String,
    /// Vendor status code. Negative means execution-layer failure;
    /// non-negative codes are endpoint-specific (e.g. the prompt query
    /// uses 0 = prompt waiting, 1 = no prompt).
    pub status_code: i64,
}

impl StatusEnvelope {
    /// Decodes a raw `ReturnValue` JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedEnvelope`] if the text is not
    /// valid JSON or lacks required fields.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw).map_err(|e| ProtocolError::malformed_envelope(e.to_string()))
    }

    /// Enforces the negative-status-code invariant.
    ///
    /// Must be called before trusting [`StatusEnvelope::content`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::VendorFailure`] carrying the code and the
    /// vendor's error text when `status_code < 0`.
    pub fn check(&self) -> Result<(), ProtocolError> {
        if self.status_code < 0 {
            return Err(ProtocolError::VendorFailure {
                status_code: self.status_code,
                error: self.error.clone(),
            });
        }
        Ok(())
    }

    /// Parses and checks in one step, yielding the trusted envelope.
    ///
    /// # Errors
    ///
    /// Propagates either the decode or the vendor-failure error.
    pub fn parse_checked(raw: &str) -> Result<Self, ProtocolError> {
        let env = Self::parse(raw)?;
        env.check()?;
        Ok(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nominal_status_response() {
        let raw = r#"{"Status":"Success","Content":"Experiment running","Error":"","StatusCode":0}"#;
        let env = StatusEnvelope::parse(raw).unwrap();
        assert_eq!(env.status, EnvelopeStatus::Success);
        assert_eq!(env.content, "Experiment running");
        assert_eq!(env.status_code, 0);
        assert!(env.check().is_ok());
    }

    #[test]
    fn parses_no_prompt_response() {
        let raw = r#"{"Status":"Success","Content":"No prompts are waiting for user input.","Error":"","StatusCode":1}"#;
        let env = StatusEnvelope::parse_checked(raw).unwrap();
        assert_eq!(env.status_code, 1);
    }

    #[test]
    fn negative_status_code_fails_check() {
        let raw = r#"{"Status":"Failure","Content":"","Error":"invalid design ID","StatusCode":-2}"#;
        let env = StatusEnvelope::parse(raw).unwrap();
        let err = env.check().unwrap_err();
        match err {
            ProtocolError::VendorFailure { status_code, error } => {
                assert_eq!(status_code, -2);
                assert_eq!(error, "invalid design ID");
            }
            other => panic!("expected VendorFailure, got {other:?}"),
        }
    }

    #[test]
    fn missing_error_field_defaults_empty() {
        let raw = r#"{"Status":"Success","Content":"Experiment completed","StatusCode":0}"#;
        let env = StatusEnvelope::parse(raw).unwrap();
        assert!(env.error.is_empty());
    }

    #[test]
    fn bad_json_is_malformed_envelope() {
        let err = StatusEnvelope::parse("not json").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedEnvelope { .. }));
    }

    #[test]
    fn unknown_status_word_is_malformed_envelope() {
        let raw = r#"{"Status":"Maybe","Content":"","Error":"","StatusCode":0}"#;
        let err = StatusEnvelope::parse(raw).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedEnvelope { .. }));
    }
}
