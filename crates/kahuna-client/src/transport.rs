//! Discovery and RPC client traits.
//!
//! These two traits are the seam between the runtime and the vendor's
//! discovery protocol. Both are object-safe; the runtime holds clients
//! as `Arc<dyn RpcClient>` so a session can cache and later close every
//! handle it discovered.

use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A connected client for one discovered server.
///
/// Calls name an RPC feature (service) and an operation on it, with
/// positional JSON arguments, and yield the raw `ReturnValue` JSON text.
/// Interpretation of that text belongs to `kahuna-protocol`; the
/// transport stays payload-agnostic.
///
/// A single call makes a single attempt; retry cadence is owned by the
/// caller's polling loop, never the transport.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Issues one RPC call and returns the raw `ReturnValue` text.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on connection or call failure.
    async fn call(
        &self,
        service: &str,
        operation: &str,
        args: &[Value],
    ) -> Result<String, TransportError>;

    /// Closes the underlying connection.
    ///
    /// Idempotent: closing an already-closed client succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if teardown fails.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Named-service discovery over the local transport.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Locates the named server and returns a connected client.
    ///
    /// One invocation is one discovery attempt bounded by `timeout`;
    /// bounded retry loops live in the session layer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Discovery`] when the server cannot be
    /// found within the timeout.
    async fn discover(
        &self,
        server_name: &str,
        timeout: Duration,
    ) -> Result<Arc<dyn RpcClient>, TransportError>;
}
