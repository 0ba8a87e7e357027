//! The wait-for-change loop.
//!
//! The single suspension point of the runtime: everything that blocks
//! on the instrument funnels through [`wait_for_change`], so cadence
//! and deadline behavior live in exactly one place.

use crate::classifier::{PollResult, StateClassifier};
use crate::error::RuntimeError;
use kahuna_protocol::RunState;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Polls until the classified state differs from `expected` or the
/// deadline passes.
///
/// The first classification happens immediately; a state already
/// different from `expected` returns without sleeping. On deadline the
/// result carries the [`RunState::Timeout`] sentinel with the last
/// status text and no prompt; it describes this wait, never the
/// instrument.
///
/// # Errors
///
/// Propagates any classification failure mid-wait.
pub async fn wait_for_change(
    classifier: &StateClassifier,
    expected: RunState,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<PollResult, RuntimeError> {
    let deadline = Instant::now() + timeout;

    let mut last = classifier.classify().await?;
    if last.state != expected {
        return Ok(last);
    }

    while Instant::now() < deadline {
        sleep(poll_interval).await;
        last = classifier.classify().await?;
        if last.state != expected {
            return Ok(last);
        }
    }

    Ok(PollResult {
        state: RunState::Timeout,
        status: last.status,
        prompt: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ObservationLog;
    use crate::studio::StudioClient;
    use kahuna_client::testing::{ok_envelope, ScriptedClient};
    use kahuna_client::RpcClient;
    use kahuna_protocol::endpoints::{op, service, status_text};
    use std::sync::Arc;

    fn classifier_over(statuses: &[&str]) -> (StateClassifier, Arc<ScriptedClient>) {
        let scripted = Arc::new(ScriptedClient::new("AutomationStudio"));
        let envelopes: Vec<String> = statuses.iter().map(|s| ok_envelope(s, 0)).collect();
        scripted.respond_seq(
            service::EXPERIMENT_STATUS,
            op::GET_STATUS,
            envelopes.iter().map(String::as_str),
        );
        scripted.respond_ok(
            service::EXPERIMENT_STATUS,
            op::GET_ACTIVE_PROMPT,
            &ok_envelope("No prompts are waiting for user input.", 1),
        );
        let classifier = StateClassifier::new(
            StudioClient::new(Arc::clone(&scripted) as Arc<dyn RpcClient>),
            Arc::new(ObservationLog::new()),
        );
        (classifier, scripted)
    }

    #[tokio::test(start_paused = true)]
    async fn differing_state_returns_without_sleeping() {
        let (classifier, _) = classifier_over(&[status_text::RUNNING]);
        let before = Instant::now();

        let result = wait_for_change(
            &classifier,
            RunState::Stopped,
            Duration::from_secs(120),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

        assert_eq!(result.state, RunState::Running);
        // Paused time only advances across sleeps; none may have run.
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn change_mid_wait_is_returned() {
        let (classifier, _) = classifier_over(&[
            status_text::RUNNING,
            status_text::RUNNING,
            status_text::COMPLETED,
        ]);

        let result = wait_for_change(
            &classifier,
            RunState::Running,
            Duration::from_secs(120),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

        assert_eq!(result.state, RunState::Stopped);
        assert_eq!(result.status, status_text::COMPLETED);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_yields_timeout_sentinel() {
        let (classifier, scripted) = classifier_over(&[status_text::RUNNING]);
        let before = Instant::now();

        let result = wait_for_change(
            &classifier,
            RunState::Running,
            Duration::from_secs(3),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

        assert_eq!(result.state, RunState::Timeout);
        assert!(!result.state.is_observable());
        assert_eq!(result.status, status_text::RUNNING);
        assert_eq!(result.prompt, None);
        assert!(Instant::now() - before >= Duration::from_secs(3));
        // Immediate poll plus one per interval.
        assert_eq!(
            scripted.call_count(service::EXPERIMENT_STATUS, op::GET_STATUS),
            4
        );
    }

    #[tokio::test(start_paused = true)]
    async fn classification_failure_propagates_mid_wait() {
        let (classifier, scripted) = classifier_over(&[status_text::RUNNING]);
        scripted.respond_ok(
            service::EXPERIMENT_STATUS,
            op::GET_STATUS,
            &ok_envelope("Unheard-of status", 0),
        );

        let err = wait_for_change(
            &classifier,
            RunState::Running,
            Duration::from_secs(30),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RuntimeError::Protocol(_)));
    }
}
