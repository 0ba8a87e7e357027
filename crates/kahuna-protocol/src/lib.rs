//! Wire types for the Big Kahuna automation services.
//!
//! This crate is the SDK layer of the kahuna workspace: the types that
//! describe what the vendor services say, independent of how we talk to
//! them or what we do about it.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  kahuna-protocol : RunState, StatusEnvelope, PromptPayload  │  ◄── HERE
//! │                    vendor endpoint/status literals          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  kahuna-client   : Discovery + RpcClient traits, transport  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  kahuna-runtime  : poller, classifier, wait loop,           │
//! │                    run controller, session manager          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # The vendor interface, in short
//!
//! The automation service exposes no enumerated state machine. Every call
//! answers with a `ReturnValue` JSON envelope (`{Status, Content, Error,
//! StatusCode}`), and the experiment state must be *inferred* from the
//! free-text `Content` of a status query plus a secondary active-prompt
//! query whose `Content` is itself a JSON document requiring a second
//! parse. The types here make both decode steps explicit and validated:
//!
//! - [`StatusEnvelope`]: the outer envelope, with [`StatusEnvelope::check`]
//!   enforcing the "negative status code means failure" invariant.
//! - [`ActivePrompt`] / [`PromptPayload`]: the nested prompt document,
//!   failing with [`ProtocolError::MalformedPrompt`] instead of guessing
//!   when expected keys are absent.
//! - [`RunState`]: the closed application-level state enumeration.
//! - [`endpoints`]: every service, operation, and status literal the
//!   vendor is known to emit, in one place.

pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod prompt;
pub mod state;

pub use envelope::{EnvelopeStatus, StatusEnvelope};
pub use error::{assert_error_code, assert_error_codes, ErrorCode, ProtocolError};
pub use prompt::{ActivePrompt, PromptPayload};
pub use state::RunState;
