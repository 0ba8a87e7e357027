//! Typed facade over the vendor RPC surface.
//!
//! One method per vendor operation, each naming its feature and
//! operation from [`kahuna_protocol::endpoints`] and decoding the outer
//! `ReturnValue` envelope. Whether an envelope's content can be trusted
//! is the caller's concern ([`StatusEnvelope::check`]); the facade only
//! guarantees the call reached the vendor and came back parseable.

use crate::error::RuntimeError;
use crate::progress::ExperimentProgress;
use kahuna_client::RpcClient;
use kahuna_protocol::endpoints::{op, service};
use kahuna_protocol::StatusEnvelope;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

/// A connected AutomationStudio client with typed operations.
#[derive(Clone)]
pub struct StudioClient {
    client: Arc<dyn RpcClient>,
}

impl StudioClient {
    /// Wraps a discovered client.
    #[must_use]
    pub fn new(client: Arc<dyn RpcClient>) -> Self {
        Self { client }
    }

    async fn call(
        &self,
        feature: &str,
        operation: &str,
        args: &[Value],
    ) -> Result<StatusEnvelope, RuntimeError> {
        let raw = self.client.call(feature, operation, args).await?;
        Ok(StatusEnvelope::parse(&raw)?)
    }

    /// Queries the free-text run status.
    pub async fn status(&self) -> Result<StatusEnvelope, RuntimeError> {
        self.call(service::EXPERIMENT_STATUS, op::GET_STATUS, &[])
            .await
    }

    /// Queries the active prompt, if any. The envelope's content is the
    /// nested prompt document; decoding belongs to the inspector.
    pub async fn active_prompt(&self) -> Result<StatusEnvelope, RuntimeError> {
        self.call(service::EXPERIMENT_STATUS, op::GET_ACTIVE_PROMPT, &[])
            .await
    }

    /// Queries map-level experiment progress.
    pub async fn experiment_status(&self) -> Result<ExperimentProgress, RuntimeError> {
        let raw = self
            .client
            .call(service::EXPERIMENT_STATUS, op::GET_EXPERIMENT_STATUS, &[])
            .await?;
        Ok(ExperimentProgress::decode(&raw)?)
    }

    /// Selects the library design to run.
    pub async fn choose_design(&self, design_id: i64) -> Result<StatusEnvelope, RuntimeError> {
        self.call(service::EXPERIMENT, op::CHOOSE_DESIGN_ID, &[json!(design_id)])
            .await
    }

    /// Uploads the prompts file.
    pub async fn set_prompts(&self, path: &Path) -> Result<StatusEnvelope, RuntimeError> {
        self.call(service::EXPERIMENT, op::SET_PROMPTS, &[path_arg(path)])
            .await
    }

    /// Uploads the chemical manager file.
    pub async fn set_chemical_manager(&self, path: &Path) -> Result<StatusEnvelope, RuntimeError> {
        self.call(
            service::EXPERIMENT,
            op::SET_CHEMICAL_MANAGER,
            &[path_arg(path)],
        )
        .await
    }

    /// Uploads the tip management file.
    pub async fn set_tip_management(&self, path: &Path) -> Result<StatusEnvelope, RuntimeError> {
        self.call(
            service::EXPERIMENT,
            op::SET_TIP_MANAGEMENT,
            &[path_arg(path)],
        )
        .await
    }

    /// Starts the configured run.
    pub async fn start_run(&self) -> Result<StatusEnvelope, RuntimeError> {
        self.call(service::RUN, op::START, &[]).await
    }

    /// Aborts the current run.
    pub async fn abort_run(&self) -> Result<StatusEnvelope, RuntimeError> {
        self.call(service::RUN, op::ABORT, &[]).await
    }

    /// Answers a waiting prompt with one of its input options.
    pub async fn set_input(&self, option: &str) -> Result<StatusEnvelope, RuntimeError> {
        self.call(service::EXPERIMENT_STATUS, op::SET_INPUT, &[json!(option)])
            .await
    }

    /// Requests application shutdown. Known to sometimes drop the
    /// connection instead of answering; the session layer decides what
    /// to swallow.
    pub async fn shutdown(&self) -> Result<StatusEnvelope, RuntimeError> {
        self.call(service::AUTOMATION_STUDIO, op::SHUTDOWN, &[])
            .await
    }
}

fn path_arg(path: &Path) -> Value {
    json!(path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kahuna_client::testing::{ok_envelope, ScriptedClient};

    #[tokio::test]
    async fn calls_name_the_documented_endpoints() {
        let scripted = Arc::new(ScriptedClient::new("AutomationStudio"));
        scripted.respond_ok(
            service::EXPERIMENT,
            op::CHOOSE_DESIGN_ID,
            &ok_envelope("", 0),
        );
        scripted.respond_ok(service::EXPERIMENT, op::SET_PROMPTS, &ok_envelope("", 0));

        let studio = StudioClient::new(Arc::clone(&scripted) as Arc<dyn RpcClient>);
        studio.choose_design(42).await.unwrap();
        studio.set_prompts(Path::new("/runs/prompts.csv")).await.unwrap();

        let calls = scripted.calls();
        assert_eq!(calls[0].operation, op::CHOOSE_DESIGN_ID);
        assert_eq!(calls[0].args, vec![json!(42)]);
        assert_eq!(calls[1].operation, op::SET_PROMPTS);
        assert_eq!(calls[1].args, vec![json!("/runs/prompts.csv")]);
    }

    #[tokio::test]
    async fn envelope_is_parsed_not_checked() {
        let scripted = Arc::new(ScriptedClient::new("AutomationStudio"));
        scripted.respond_ok(
            service::RUN,
            op::START,
            &kahuna_client::testing::err_envelope("no design chosen", -1),
        );

        let studio = StudioClient::new(scripted as Arc<dyn RpcClient>);
        // The facade hands back the failed envelope; rejecting it is the
        // submission sequence's job.
        let env = studio.start_run().await.unwrap();
        assert_eq!(env.status_code, -1);
        assert!(env.check().is_err());
    }
}
