//! Unified error interface and protocol-level errors.
//!
//! Every error enum in the kahuna workspace implements [`ErrorCode`]:
//! a stable machine-readable code plus a recoverability flag for retry
//! policy. The decode errors for the vendor wire format live here too.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`ProtocolError::MalformedEnvelope`] | `PROTOCOL_MALFORMED_ENVELOPE` | No |
//! | [`ProtocolError::MalformedPrompt`] | `PROTOCOL_MALFORMED_PROMPT` | Yes |
//! | [`ProtocolError::UnclassifiedStatus`] | `PROTOCOL_UNCLASSIFIED_STATUS` | No |
//! | [`ProtocolError::VendorFailure`] | `PROTOCOL_VENDOR_FAILURE` | No |
//!
//! `MalformedPrompt` is the one recoverable decode error: an active-prompt
//! payload missing its message keys reflects a transient race in the vendor
//! UI and is safe to retry on the next poll cycle.

use thiserror::Error;

/// Unified error code interface.
///
/// # Code Format
///
/// - UPPER_SNAKE_CASE, prefixed with the owning layer (`PROTOCOL_`,
///   `TRANSPORT_`, `RUNTIME_`)
/// - Stable once defined (treated as API contract)
///
/// # Recoverability
///
/// An error is recoverable when retrying the operation may succeed
/// without code or configuration changes: transient vendor races,
/// connection hiccups. Precondition violations and unknown vendor
/// states are not.
pub trait ErrorCode {
    /// Returns the machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying the failed operation may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Decode-layer error for the vendor wire format.
///
/// These errors mark data-integrity boundaries: a payload that does not
/// look like what the vendor documents is surfaced verbatim, never
/// coerced into a known shape.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    /// The outer `ReturnValue` envelope was not valid JSON or was
    /// missing required fields.
    #[error("malformed status envelope: {message}")]
    MalformedEnvelope {
        /// Decode failure detail.
        message: String,
    },

    /// The nested prompt payload could not be decoded, or carried
    /// neither an `InformationMessage` nor a `value` key.
    ///
    /// Reflects a transient vendor race (prompt torn down between the
    /// status query and the prompt query); safe to retry next cycle.
    #[error("malformed prompt payload: {message}")]
    MalformedPrompt {
        /// Decode failure detail.
        message: String,
    },

    /// The status query returned text outside the known set.
    ///
    /// Unknown vendor strings must never be silently mapped to a known
    /// state; the raw text is carried for diagnosis.
    #[error("unclassified vendor status: {status:?}")]
    UnclassifiedStatus {
        /// The verbatim status text.
        status: String,
    },

    /// The envelope reported a negative status code.
    ///
    /// A negative code is an execution-layer failure; `Content` must not
    /// be trusted once this is raised.
    #[error("vendor call failed (status code {status_code}): {error}")]
    VendorFailure {
        /// The negative vendor status code.
        status_code: i64,
        /// The vendor's error description.
        error: String,
    },
}

impl ProtocolError {
    /// Creates a malformed-envelope error.
    pub fn malformed_envelope(message: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            message: message.into(),
        }
    }

    /// Creates a malformed-prompt error.
    pub fn malformed_prompt(message: impl Into<String>) -> Self {
        Self::MalformedPrompt {
            message: message.into(),
        }
    }
}

impl ErrorCode for ProtocolError {
    fn code(&self) -> &'static str {
        match self {
            Self::MalformedEnvelope { .. } => "PROTOCOL_MALFORMED_ENVELOPE",
            Self::MalformedPrompt { .. } => "PROTOCOL_MALFORMED_PROMPT",
            Self::UnclassifiedStatus { .. } => "PROTOCOL_UNCLASSIFIED_STATUS",
            Self::VendorFailure { .. } => "PROTOCOL_VENDOR_FAILURE",
        }
    }

    fn is_recoverable(&self) -> bool {
        // Only the prompt race is worth retrying; everything else needs
        // a human or a code change.
        matches!(self, Self::MalformedPrompt { .. })
    }
}

/// Validates that an error code follows workspace conventions:
/// non-empty, UPPER_SNAKE_CASE, and carrying the expected prefix.
///
/// # Panics
///
/// Panics with a descriptive message if validation fails.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates all variants of an error enum at once.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<ProtocolError> {
        vec![
            ProtocolError::malformed_envelope("bad json"),
            ProtocolError::malformed_prompt("no message key"),
            ProtocolError::UnclassifiedStatus {
                status: "Experiment frobnicated".into(),
            },
            ProtocolError::VendorFailure {
                status_code: -3,
                error: "invalid design id".into(),
            },
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "PROTOCOL_");
    }

    #[test]
    fn only_malformed_prompt_is_recoverable() {
        for err in all_variants() {
            let expected = matches!(err, ProtocolError::MalformedPrompt { .. });
            assert_eq!(err.is_recoverable(), expected, "{}", err.code());
        }
    }

    #[test]
    fn unclassified_status_carries_verbatim_text() {
        let err = ProtocolError::UnclassifiedStatus {
            status: "Experiment frobnicated".into(),
        };
        assert!(err.to_string().contains("Experiment frobnicated"));
    }

    #[test]
    fn is_upper_snake_case_rules() {
        assert!(is_upper_snake_case("PROTOCOL_VENDOR_FAILURE"));
        assert!(!is_upper_snake_case(""));
        assert!(!is_upper_snake_case("Protocol_Error"));
        assert!(!is_upper_snake_case("_LEADING"));
        assert!(!is_upper_snake_case("DOUBLE__UNDER"));
    }
}
