//! Session lifecycle: find or start the vendor application, hand out
//! clients, tear everything down.
//!
//! Discovery of the vendor's servers is flaky enough to deserve a
//! bounded retry, and the application itself may need to be launched
//! via the remote launcher before its main server exists at all. The
//! launcher's acknowledgment code distinguishes the two: `0` means the
//! application was actually started (cold start) and needs a settle
//! delay plus an extended discovery timeout before its services
//! register; `1` means it was already up.

use crate::config::KahunaConfig;
use crate::error::RuntimeError;
use crate::studio::StudioClient;
use kahuna_client::{Discovery, RpcClient, TransportError};
use kahuna_protocol::endpoints::{op, server, service};
use kahuna_protocol::StatusEnvelope;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// An established connection to the launcher and the studio.
///
/// Owns the discovered client handles; at most one session should hold
/// the instrument. Consumed by [`RunSession::shutdown`].
pub struct RunSession {
    id: Uuid,
    launcher: Arc<dyn RpcClient>,
    studio: Arc<dyn RpcClient>,
    config: KahunaConfig,
}

impl RunSession {
    /// Finds or starts the vendor application and connects to it.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::DiscoveryExhausted`] when either server
    /// stays undiscoverable, and propagates launcher failures.
    pub async fn connect(
        discovery: &dyn Discovery,
        config: KahunaConfig,
    ) -> Result<Self, RuntimeError> {
        let launcher = discover_with_retry(
            discovery,
            server::AUTOMATION_REMOTE,
            config.discovery_timeout(),
            config.max_discovery_attempts,
        )
        .await?;

        let raw = launcher
            .call(service::AUTOMATION_STUDIO_REMOTE, op::START, &[])
            .await?;
        let ack = StatusEnvelope::parse(&raw)?;
        ack.check()?;

        let studio_timeout = if ack.status_code == 0 {
            // Cold start. Discovering during vendor startup is known to
            // fail, so settle first, then allow the long registration.
            info!(
                settle_s = config.startup_settle_s,
                "vendor application starting; waiting for it to settle"
            );
            sleep(config.startup_settle()).await;
            config.startup_timeout()
        } else {
            debug!("vendor application already running");
            config.discovery_timeout()
        };

        let studio = discover_with_retry(
            discovery,
            server::AUTOMATION_STUDIO,
            studio_timeout,
            config.max_discovery_attempts,
        )
        .await?;

        let session = Self {
            id: Uuid::new_v4(),
            launcher,
            studio,
            config,
        };
        info!(session = %session.id, "session established");
        Ok(session)
    }

    /// The session identifier, for log correlation.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The resolved configuration this session runs under.
    #[must_use]
    pub fn config(&self) -> &KahunaConfig {
        &self.config
    }

    /// A typed client for the studio server.
    #[must_use]
    pub fn studio(&self) -> StudioClient {
        StudioClient::new(Arc::clone(&self.studio))
    }

    /// Tears the session down: aborts any in-flight run, asks the
    /// application to shut down, closes both handles, then settles.
    ///
    /// An abort rejection is expected when no run is active and only
    /// warns. The vendor's shutdown acknowledgment sometimes drops the
    /// connection instead of answering; exactly that failure is
    /// swallowed. Everything else propagates, after both cached
    /// handles have been closed.
    ///
    /// # Errors
    ///
    /// Propagates close and non-quirk shutdown failures.
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        let result = shutdown_calls(&self.studio()).await;

        // Handles close no matter how the teardown calls went.
        self.studio.close().await?;
        self.launcher.close().await?;
        result?;

        info!(session = %self.id, "session closed; settling");
        sleep(self.config.shutdown_settle()).await;
        Ok(())
    }
}

async fn shutdown_calls(studio: &StudioClient) -> Result<(), RuntimeError> {
    match studio.abort_run().await?.check() {
        Ok(()) => {}
        // Rejected when no run is active; not a teardown failure.
        Err(error) => warn!(%error, "abort rejected during shutdown"),
    }

    match studio.shutdown().await {
        Ok(ack) => ack.check()?,
        Err(RuntimeError::Transport(e)) if e.is_connection_closed() => {
            debug!("shutdown dropped the connection; treating as acknowledged");
        }
        Err(other) => return Err(other),
    }
    Ok(())
}

async fn discover_with_retry(
    discovery: &dyn Discovery,
    server_name: &str,
    timeout: Duration,
    max_attempts: u32,
) -> Result<Arc<dyn RpcClient>, RuntimeError> {
    for attempt in 1..=max_attempts {
        match discovery.discover(server_name, timeout).await {
            Ok(client) => {
                debug!(server = server_name, attempt, "discovered");
                return Ok(client);
            }
            Err(error) => {
                warn!(server = server_name, attempt, %error, "discovery attempt failed");
            }
        }
    }
    Err(RuntimeError::DiscoveryExhausted {
        server: server_name.to_string(),
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kahuna_client::testing::{ok_envelope, ScriptedDiscovery};

    fn test_config() -> KahunaConfig {
        KahunaConfig::default()
    }

    fn launcher_ack(discovery: &ScriptedDiscovery, status_code: i64) {
        let launcher = discovery.serve(server::AUTOMATION_REMOTE);
        launcher.respond_ok(
            service::AUTOMATION_STUDIO_REMOTE,
            op::START,
            &ok_envelope("", status_code),
        );
    }

    #[tokio::test(start_paused = true)]
    async fn warm_start_uses_short_discovery_timeout() {
        let discovery = ScriptedDiscovery::new();
        launcher_ack(&discovery, 1);
        discovery.serve(server::AUTOMATION_STUDIO);

        let session = RunSession::connect(&discovery, test_config()).await.unwrap();
        assert_eq!(session.config().discovery_timeout_s, 5);

        let attempts = discovery.attempts();
        let studio_attempt = attempts
            .iter()
            .find(|a| a.server == server::AUTOMATION_STUDIO)
            .unwrap();
        assert_eq!(studio_attempt.timeout, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn cold_start_settles_then_extends_timeout() {
        let discovery = ScriptedDiscovery::new();
        launcher_ack(&discovery, 0);
        discovery.serve(server::AUTOMATION_STUDIO);

        let before = tokio::time::Instant::now();
        RunSession::connect(&discovery, test_config()).await.unwrap();
        assert!(tokio::time::Instant::now() - before >= Duration::from_secs(20));

        let attempts = discovery.attempts();
        let studio_attempt = attempts
            .iter()
            .find(|a| a.server == server::AUTOMATION_STUDIO)
            .unwrap();
        assert_eq!(studio_attempt.timeout, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn discovery_retries_then_succeeds() {
        let discovery = ScriptedDiscovery::new();
        launcher_ack(&discovery, 1);
        discovery.serve(server::AUTOMATION_STUDIO);
        discovery.fail_first(server::AUTOMATION_STUDIO, 3);

        RunSession::connect(&discovery, test_config()).await.unwrap();
        assert_eq!(discovery.attempt_count(server::AUTOMATION_STUDIO), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn discovery_exhaustion_is_bounded() {
        let discovery = ScriptedDiscovery::new();
        launcher_ack(&discovery, 1);
        discovery.serve(server::AUTOMATION_STUDIO);
        discovery.fail_first(server::AUTOMATION_STUDIO, 99);

        // `.err()` first: a connected session has no Debug to unwrap on.
        let err = RunSession::connect(&discovery, test_config())
            .await
            .err()
            .unwrap();
        match err {
            RuntimeError::DiscoveryExhausted { server, attempts } => {
                assert_eq!(server, server::AUTOMATION_STUDIO);
                assert_eq!(attempts, 5);
            }
            other => panic!("expected DiscoveryExhausted, got {other:?}"),
        }
        assert_eq!(discovery.attempt_count(server::AUTOMATION_STUDIO), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn launcher_failure_propagates() {
        let discovery = ScriptedDiscovery::new();
        let launcher = discovery.serve(server::AUTOMATION_REMOTE);
        launcher.respond_ok(
            service::AUTOMATION_STUDIO_REMOTE,
            op::START,
            &kahuna_client::testing::err_envelope("launcher fault", -1),
        );

        let err = RunSession::connect(&discovery, test_config())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RuntimeError::Protocol(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_swallows_only_connection_closed() {
        let discovery = ScriptedDiscovery::new();
        launcher_ack(&discovery, 1);
        let studio = discovery.serve(server::AUTOMATION_STUDIO);
        studio.respond_ok(service::RUN, op::ABORT, &ok_envelope("", 0));
        studio.respond_err(
            service::AUTOMATION_STUDIO,
            op::SHUTDOWN,
            TransportError::ConnectionClosed,
        );

        let session = RunSession::connect(&discovery, test_config()).await.unwrap();
        session.shutdown().await.unwrap();
        assert!(studio.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_propagates_other_transport_errors() {
        let discovery = ScriptedDiscovery::new();
        launcher_ack(&discovery, 1);
        let studio = discovery.serve(server::AUTOMATION_STUDIO);
        studio.respond_ok(service::RUN, op::ABORT, &ok_envelope("", 0));
        studio.respond_err(
            service::AUTOMATION_STUDIO,
            op::SHUTDOWN,
            TransportError::Connection("reset by peer".into()),
        );

        let session = RunSession::connect(&discovery, test_config()).await.unwrap();
        let err = session.shutdown().await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Transport(TransportError::Connection(_))
        ));
        // The cached handle is not leaked by the failure.
        assert!(studio.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn abort_rejection_does_not_fail_shutdown() {
        let discovery = ScriptedDiscovery::new();
        launcher_ack(&discovery, 1);
        let studio = discovery.serve(server::AUTOMATION_STUDIO);
        studio.respond_ok(
            service::RUN,
            op::ABORT,
            &kahuna_client::testing::err_envelope("no experiment running", -1),
        );
        studio.respond_ok(service::AUTOMATION_STUDIO, op::SHUTDOWN, &ok_envelope("", 0));

        let session = RunSession::connect(&discovery, test_config()).await.unwrap();
        session.shutdown().await.unwrap();

        assert_eq!(studio.call_count(service::AUTOMATION_STUDIO, op::SHUTDOWN), 1);
        assert!(studio.is_closed());
    }
}
