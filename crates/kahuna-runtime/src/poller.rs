//! Checked status and prompt queries.
//!
//! Thin layers over [`StudioClient`] that enforce the envelope
//! invariant before anyone looks at content: a negative status code
//! surfaces as [`kahuna_protocol::ProtocolError::VendorFailure`], never
//! as data.

use crate::error::RuntimeError;
use crate::studio::StudioClient;
use kahuna_protocol::{ActivePrompt, StatusEnvelope};

/// Polls the free-text run status.
pub struct StatusPoller {
    studio: StudioClient,
}

impl StatusPoller {
    /// Creates a poller over a connected studio.
    #[must_use]
    pub fn new(studio: StudioClient) -> Self {
        Self { studio }
    }

    /// One status query, checked.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] on transport failure, a malformed
    /// envelope, or a negative status code.
    pub async fn poll(&self) -> Result<StatusEnvelope, RuntimeError> {
        let env = self.studio.status().await?;
        env.check()?;
        Ok(env)
    }
}

/// Queries and decodes the active prompt.
pub struct PromptInspector {
    studio: StudioClient,
}

impl PromptInspector {
    /// Creates an inspector over a connected studio.
    #[must_use]
    pub fn new(studio: StudioClient) -> Self {
        Self { studio }
    }

    /// One prompt query, checked and decoded.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] on transport failure, a vendor failure,
    /// or an undecodable nested payload.
    pub async fn inspect(&self) -> Result<ActivePrompt, RuntimeError> {
        let env = self.studio.active_prompt().await?;
        env.check()?;
        Ok(ActivePrompt::from_envelope(&env)?)
    }
}
