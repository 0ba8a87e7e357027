//! Transport layer errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`TransportError::Discovery`] | `TRANSPORT_DISCOVERY` | Yes |
//! | [`TransportError::Connection`] | `TRANSPORT_CONNECTION` | Yes |
//! | [`TransportError::ConnectionClosed`] | `TRANSPORT_CONNECTION_CLOSED` | Yes |
//! | [`TransportError::Call`] | `TRANSPORT_CALL` | No |
//!
//! Discovery and connection failures are retryable at the discovery
//! layer (bounded attempts), never mid-poll. `ConnectionClosed` is kept
//! distinct because the vendor's shutdown acknowledgment is known to
//! spuriously close the connection; the session manager swallows exactly
//! that kind during teardown and nothing else.

use kahuna_protocol::ErrorCode;
use thiserror::Error;

/// Failure in the discovery/RPC transport.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Named-service discovery failed (server not found, timeout).
    #[error("discovery of server '{server}' failed: {message}")]
    Discovery {
        /// The server name being discovered.
        server: String,
        /// Transport failure detail.
        message: String,
    },

    /// The connection dropped or could not be established.
    #[error("connection error: {0}")]
    Connection(String),

    /// The peer closed the connection.
    ///
    /// Distinct from [`TransportError::Connection`] so the shutdown
    /// sequence can swallow the vendor's spurious close on its shutdown
    /// acknowledgment while still propagating real failures.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// A specific RPC call failed at the transport level.
    #[error("call {service}.{operation} failed: {message}")]
    Call {
        /// RPC feature name.
        service: String,
        /// Operation name.
        operation: String,
        /// Transport failure detail.
        message: String,
    },
}

impl TransportError {
    /// Creates a discovery error.
    pub fn discovery(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Discovery {
            server: server.into(),
            message: message.into(),
        }
    }

    /// Creates a call error.
    pub fn call(
        service: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Call {
            service: service.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for the peer-closed kind the shutdown sequence
    /// is allowed to swallow.
    #[must_use]
    pub fn is_connection_closed(&self) -> bool {
        matches!(self, Self::ConnectionClosed)
    }
}

impl ErrorCode for TransportError {
    fn code(&self) -> &'static str {
        match self {
            Self::Discovery { .. } => "TRANSPORT_DISCOVERY",
            Self::Connection(_) => "TRANSPORT_CONNECTION",
            Self::ConnectionClosed => "TRANSPORT_CONNECTION_CLOSED",
            Self::Call { .. } => "TRANSPORT_CALL",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Call { .. })
    }
}
