//! The run controller: ordered submission and the drive loop.
//!
//! A run is submitted with a strictly ordered sequence of vendor calls,
//! then driven by reacting to classified state observations until a
//! terminal state. The loop never sleeps on its own; all suspension
//! goes through [`wait_for_change`].

mod context;
mod policy;

pub use context::{PauseAccounting, RunContext};
pub use policy::{interpret_prompt, is_problem_pause, pause_recovery, PauseRecovery, PromptDisposition};

use crate::classifier::{PollResult, StateClassifier};
use crate::error::RuntimeError;
use crate::record::ObservationLog;
use crate::session::RunSession;
use crate::studio::StudioClient;
use crate::wait::wait_for_change;
use kahuna_protocol::endpoints::{op, prompt_text};
use kahuna_protocol::{PromptPayload, RunState, StatusEnvelope};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Per-iteration wait of the drive loop. Short by design: each tick is
/// a chance to refresh progress tracking even when nothing changes.
const STEP_WAIT: Duration = Duration::from_secs(1);

/// Everything a run needs up front.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// The library design to run.
    pub design_id: i64,
    /// Path to the prompts file, as the vendor host sees it.
    pub prompts_file: PathBuf,
    /// Path to the chemical manager file.
    pub chemical_file: PathBuf,
    /// Optional tip management file.
    pub tip_file: Option<PathBuf>,
    /// When set, a pause dialog ends the drive and hands its message to
    /// the caller instead of being auto-acknowledged.
    pub pause_on_prompt: bool,
}

impl RunRequest {
    /// Creates a request with the mandatory inputs.
    #[must_use]
    pub fn new(
        design_id: i64,
        prompts_file: impl Into<PathBuf>,
        chemical_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            design_id,
            prompts_file: prompts_file.into(),
            chemical_file: chemical_file.into(),
            tip_file: None,
            pause_on_prompt: false,
        }
    }

    /// Adds a tip management file.
    #[must_use]
    pub fn with_tip_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.tip_file = Some(path.into());
        self
    }

    /// Ends the drive at the first pause dialog instead of
    /// acknowledging it.
    #[must_use]
    pub fn pause_on_prompt(mut self, pause: bool) -> Self {
        self.pause_on_prompt = pause;
        self
    }
}

/// How a submitted run left the `Stopped` state.
#[derive(Debug)]
pub enum RunStartResult {
    /// The run started; the first non-stopped observation is carried so
    /// the drive loop can react to it immediately.
    Started(PollResult),
    /// The run never left `Stopped` within the submit timeout.
    TimedOut {
        /// The last status text observed while waiting.
        last_status: String,
    },
}

/// Terminal disposition of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The experiment ran to completion.
    Completed,
    /// The run was aborted, by the instrument or by escalation.
    Aborted,
    /// The instrument is out of tips; physical intervention needed.
    OutOfTips,
    /// The run never started (rejected submission or start timeout).
    NoGo,
    /// A pause dialog ended the drive under `pause_on_prompt`; the run
    /// is still alive and [`RunController::resume`] continues it.
    PausedForCaller,
}

/// What the caller gets back from a drive.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Terminal disposition.
    pub outcome: RunOutcome,
    /// The last raw status text (or rejection detail for `NoGo`).
    pub final_status: String,
    /// How many pause prompts the run saw.
    pub pause_count: u32,
    /// The pause dialog's message, for `PausedForCaller`.
    pub paused_message: Option<String>,
}

enum Step {
    Continue,
    Finish(RunReport),
}

/// Drives experiments on an established session.
pub struct RunController {
    session: RunSession,
    studio: StudioClient,
    classifier: StateClassifier,
    record: Arc<ObservationLog>,
    ctx: Option<RunContext>,
}

impl RunController {
    /// Creates a controller over a connected session.
    #[must_use]
    pub fn new(session: RunSession) -> Self {
        let studio = session.studio();
        let record = Arc::new(ObservationLog::new());
        let classifier = StateClassifier::new(studio.clone(), Arc::clone(&record));
        Self {
            session,
            studio,
            classifier,
            record,
            ctx: None,
        }
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &RunSession {
        &self.session
    }

    /// Submits a run: precondition check, the ordered submission
    /// sequence, then waiting for the instrument to leave `Stopped`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotReady`] when the instrument is not
    /// idle and [`RuntimeError::SubmissionStep`] for the first rejected
    /// step; later steps are not attempted.
    pub async fn submit_run(&mut self, request: &RunRequest) -> Result<RunStartResult, RuntimeError> {
        let before = self.classifier.classify().await?;
        if before.state != RunState::Stopped {
            return Err(RuntimeError::NotReady {
                state: before.state,
            });
        }

        check_step(
            op::CHOOSE_DESIGN_ID,
            self.studio.choose_design(request.design_id).await?,
        )?;
        check_step(
            op::SET_PROMPTS,
            self.studio.set_prompts(&request.prompts_file).await?,
        )?;
        check_step(
            op::SET_CHEMICAL_MANAGER,
            self.studio.set_chemical_manager(&request.chemical_file).await?,
        )?;
        if let Some(tip_file) = &request.tip_file {
            check_step(
                op::SET_TIP_MANAGEMENT,
                self.studio.set_tip_management(tip_file).await?,
            )?;
        }
        check_step(op::START, self.studio.start_run().await?)?;

        self.open_record(request);
        self.record.mark("STARTED");
        info!(design_id = request.design_id, "run submitted");

        let first = wait_for_change(
            &self.classifier,
            RunState::Stopped,
            self.session.config().submit_timeout(),
            self.session.config().poll_interval(),
        )
        .await?;

        if first.state == RunState::Timeout {
            warn!(
                last_status = %first.status,
                "run never left the stopped state within the submit timeout"
            );
            self.record.close();
            return Ok(RunStartResult::TimedOut {
                last_status: first.status,
            });
        }

        let mut ctx = RunContext::new(request.design_id, RunState::Stopped);
        ctx.observe(first.state);
        self.ctx = Some(ctx);
        Ok(RunStartResult::Started(first))
    }

    /// Drives a started run to a terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NoActiveRun`] without a submitted run;
    /// otherwise propagates classification and answering failures, and
    /// [`RuntimeError::RunFailed`] when the instrument reports an
    /// experiment error.
    pub async fn drive_to_completion(
        &mut self,
        start: PollResult,
        pause_on_prompt: bool,
    ) -> Result<RunReport, RuntimeError> {
        let mut ctx = self.ctx.take().ok_or(RuntimeError::NoActiveRun)?;
        let result = self.drive_inner(&mut ctx, start, pause_on_prompt).await;
        match &result {
            Ok(report) if report.outcome == RunOutcome::PausedForCaller => {
                // Run still alive; keep the context for resume().
                self.ctx = Some(ctx);
            }
            _ => self.record.close(),
        }
        result
    }

    /// Submits and drives in one call.
    ///
    /// A run that never starts is not an error here: rejected
    /// submissions and start timeouts come back as [`RunOutcome::NoGo`]
    /// with the rejection detail in `final_status`.
    ///
    /// # Errors
    ///
    /// Propagates everything [`RunController::submit_run`] and
    /// [`RunController::drive_to_completion`] raise, except rejected
    /// submissions.
    pub async fn run(&mut self, request: &RunRequest) -> Result<RunReport, RuntimeError> {
        match self.submit_run(request).await {
            Ok(RunStartResult::Started(first)) => {
                self.drive_to_completion(first, request.pause_on_prompt).await
            }
            Ok(RunStartResult::TimedOut { last_status }) => Ok(RunReport {
                outcome: RunOutcome::NoGo,
                final_status: last_status,
                pause_count: 0,
                paused_message: None,
            }),
            Err(err) if err.is_rejected_submission() => {
                warn!(%err, "run rejected before start");
                Ok(RunReport {
                    outcome: RunOutcome::NoGo,
                    final_status: err.to_string(),
                    pause_count: 0,
                    paused_message: None,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Continues a run that ended with [`RunOutcome::PausedForCaller`]:
    /// re-acknowledges the pause dialog and drives on.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NoActiveRun`] when there is nothing to
    /// continue.
    pub async fn resume(&mut self, pause_on_prompt: bool) -> Result<RunReport, RuntimeError> {
        if self.ctx.is_none() {
            return Err(RuntimeError::NoActiveRun);
        }
        self.record.mark("BACK IN CONTROL");

        let observed = self.classifier.classify().await?;
        if let Some(prompt) = observed.prompt.as_ref() {
            self.answer(prompt, prompt_text::OPTION_OK).await?;
        }

        let poll = self.classifier.classify().await?;
        if let Some(ctx) = self.ctx.as_mut() {
            ctx.observe(poll.state);
        }
        self.drive_to_completion(poll, pause_on_prompt).await
    }

    /// Tears down the controller and its session.
    ///
    /// # Errors
    ///
    /// Propagates session teardown failures.
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        self.record.close();
        self.session.shutdown().await
    }

    async fn drive_inner(
        &self,
        ctx: &mut RunContext,
        start: PollResult,
        pause_on_prompt: bool,
    ) -> Result<RunReport, RuntimeError> {
        let interval = self.session.config().poll_interval();
        let mut poll = start;

        loop {
            if let Step::Finish(report) = self.dispatch(ctx, &poll, pause_on_prompt).await? {
                return Ok(report);
            }

            // A stuck problem pause has to keep feeding the escalation
            // counter, so Paused is re-handled every cycle rather than
            // only on transitions.
            poll = if ctx.last_state == RunState::Paused {
                sleep(interval).await;
                self.classifier.classify().await?
            } else {
                loop {
                    let next =
                        wait_for_change(&self.classifier, ctx.last_state, STEP_WAIT, interval)
                            .await?;
                    if next.state != RunState::Timeout {
                        break next;
                    }
                    self.track_progress(ctx).await;
                }
            };
            ctx.observe(poll.state);
        }
    }

    async fn dispatch(
        &self,
        ctx: &mut RunContext,
        poll: &PollResult,
        pause_on_prompt: bool,
    ) -> Result<Step, RuntimeError> {
        match poll.state {
            RunState::Running => {
                if ctx.consecutive_problems > 0 {
                    info!("experiment resumed after problem pauses");
                    self.record.mark("RESUMED AFTER PROMPT");
                }
                ctx.consecutive_problems = 0;
                self.track_progress(ctx).await;
                Ok(Step::Continue)
            }
            RunState::Stopped => {
                let outcome = if ctx.was_aborted {
                    RunOutcome::Aborted
                } else {
                    RunOutcome::Completed
                };
                info!(?outcome, pause_count = ctx.pauses.count, "run finished");
                Ok(Step::Finish(self.report(ctx, poll, outcome, None)))
            }
            RunState::Aborted => {
                ctx.was_aborted = true;
                warn!("experiment aborted; letting the instrument settle");
                sleep(self.session.config().abort_settle()).await;
                Ok(Step::Finish(self.report(ctx, poll, RunOutcome::Aborted, None)))
            }
            RunState::Error => Err(RuntimeError::RunFailed {
                status: poll.status.clone(),
            }),
            RunState::OutOfTips => {
                error!("instrument is out of tips; halting until someone reloads");
                Ok(Step::Finish(self.report(ctx, poll, RunOutcome::OutOfTips, None)))
            }
            RunState::ActivePrompt => {
                let Some(prompt) = poll.prompt.as_ref() else {
                    warn!("active-prompt state without a payload; waiting");
                    return Ok(Step::Continue);
                };
                self.handle_prompt(ctx, poll, prompt, pause_on_prompt).await
            }
            RunState::Paused => {
                self.handle_pause(ctx, poll.prompt.as_ref()).await?;
                Ok(Step::Continue)
            }
            // Filtered out by the drive loop.
            RunState::Timeout => Ok(Step::Continue),
        }
    }

    async fn handle_prompt(
        &self,
        ctx: &mut RunContext,
        poll: &PollResult,
        prompt: &PromptPayload,
        pause_on_prompt: bool,
    ) -> Result<Step, RuntimeError> {
        match interpret_prompt(prompt, pause_on_prompt) {
            PromptDisposition::AcknowledgePause => {
                ctx.pauses.record_pause(Instant::now());
                debug!(pause_count = ctx.pauses.count, "acknowledging pause dialog");
                self.answer(prompt, prompt_text::OPTION_OK).await?;
                Ok(Step::Continue)
            }
            PromptDisposition::ReportPause { message } => {
                ctx.pauses.record_pause(Instant::now());
                info!(%message, "pausing for the caller");
                Ok(Step::Finish(self.report(
                    ctx,
                    poll,
                    RunOutcome::PausedForCaller,
                    Some(message),
                )))
            }
            PromptDisposition::DeclineHardwareReset => {
                self.answer(prompt, prompt_text::OPTION_NO).await?;
                Ok(Step::Continue)
            }
            PromptDisposition::ConcurrentConflict => Err(RuntimeError::ConcurrentRunConflict),
            PromptDisposition::Unhandled => {
                warn!(message = %prompt.message, "prompt needs operator input");
                Ok(Step::Continue)
            }
        }
    }

    async fn handle_pause(
        &self,
        ctx: &mut RunContext,
        prompt: Option<&PromptPayload>,
    ) -> Result<(), RuntimeError> {
        if !is_problem_pause(prompt) {
            debug!("paused without a problem prompt; waiting for the operator");
            return Ok(());
        }

        ctx.consecutive_problems += 1;
        let option = match pause_recovery(
            ctx.consecutive_problems,
            self.session.config().problem_threshold,
        ) {
            PauseRecovery::Repeat => prompt_text::OPTION_REPEAT_ACTION,
            PauseRecovery::Abort => {
                warn!(
                    problems = ctx.consecutive_problems,
                    "too many consecutive problems; aborting the run"
                );
                prompt_text::OPTION_ABORT
            }
        };
        if let Some(prompt) = prompt {
            self.answer(prompt, option).await?;
        }
        Ok(())
    }

    /// Answers a prompt via `SetInput`, but only with an option the
    /// dialog actually offers; unknown options stay with the vendor UI.
    async fn answer(&self, prompt: &PromptPayload, option: &str) -> Result<(), RuntimeError> {
        if !prompt.offers_option(option) {
            warn!(option, "prompt does not offer this option; leaving it alone");
            return Ok(());
        }
        let ack = self.studio.set_input(option).await?;
        ack.check()?;
        self.record.observe(&format!("ANSWER {option}"));
        Ok(())
    }

    async fn track_progress(&self, ctx: &mut RunContext) {
        if !self.record.is_open() {
            return;
        }
        match self.studio.experiment_status().await {
            Ok(status) => {
                if let Some(map) = status.progress {
                    if map.map > ctx.last_map {
                        ctx.last_map = map.map;
                        self.record.observe(&format!(
                            "MAP {} of {}: {}",
                            map.map, map.total_maps, map.description
                        ));
                    }
                }
            }
            Err(error) => debug!(%error, "progress query failed"),
        }
    }

    fn report(
        &self,
        ctx: &RunContext,
        poll: &PollResult,
        outcome: RunOutcome,
        paused_message: Option<String>,
    ) -> RunReport {
        RunReport {
            outcome,
            final_status: poll.status.clone(),
            pause_count: ctx.pauses.count,
            paused_message,
        }
    }

    fn open_record(&self, request: &RunRequest) {
        let record_config = &self.session.config().record;
        if !record_config.enabled {
            return;
        }
        let dir = record_config
            .dir
            .clone()
            .or_else(|| request.prompts_file.parent().map(Path::to_path_buf));
        let Some(dir) = dir else {
            warn!("no directory for the observation log; continuing unrecorded");
            return;
        };
        match self.record.open(&dir) {
            Ok(path) => info!(path = %path.display(), "observation log opened"),
            Err(error) => {
                warn!(%error, "could not open the observation log; continuing unrecorded");
            }
        }
    }
}

fn check_step(step: &'static str, env: StatusEnvelope) -> Result<(), RuntimeError> {
    if env.status_code < 0 {
        return Err(RuntimeError::SubmissionStep {
            step,
            status_code: env.status_code,
            error: env.error,
        });
    }
    Ok(())
}
