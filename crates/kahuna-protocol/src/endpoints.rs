//! Vendor service, operation, and status literals.
//!
//! Everything the driver sends to or pattern-matches against the vendor
//! services is collected here, so the exact wire spellings live in one
//! place. The names follow the vendor's own casing.

/// Discoverable server names on the local discovery protocol.
pub mod server {
    /// The main execution service.
    pub const AUTOMATION_STUDIO: &str = "AutomationStudio";
    /// The remote launcher that can start the execution service.
    pub const AUTOMATION_REMOTE: &str = "AutomationRemote";
}

/// RPC feature (service) names exposed by the discovered servers.
pub mod service {
    /// Run setup: design selection and input file registration.
    pub const EXPERIMENT: &str = "ExperimentService";
    /// Status, active-prompt, and prompt-input endpoints.
    pub const EXPERIMENT_STATUS: &str = "ExperimentStatusService";
    /// Run start/abort.
    pub const RUN: &str = "RunService";
    /// Application-level commands on the execution service.
    pub const AUTOMATION_STUDIO: &str = "AutomationStudio";
    /// Launcher feature on the remote launcher server.
    pub const AUTOMATION_STUDIO_REMOTE: &str = "AutomationStudioRemote";
}

/// Operation names, by owning service.
pub mod op {
    /// `ExperimentService.ChooseDesignID(id)`
    pub const CHOOSE_DESIGN_ID: &str = "ChooseDesignID";
    /// `ExperimentService.SetPrompts(path)`
    pub const SET_PROMPTS: &str = "SetPrompts";
    /// `ExperimentService.SetChemicalManager(path)`
    pub const SET_CHEMICAL_MANAGER: &str = "SetChemicalManager";
    /// `ExperimentService.SetTipManagement(path)`
    pub const SET_TIP_MANAGEMENT: &str = "SetTipManagement";
    /// `RunService.Start()`
    pub const START: &str = "Start";
    /// `RunService.Abort()`
    pub const ABORT: &str = "Abort";
    /// `ExperimentStatusService.GetStatus()`
    pub const GET_STATUS: &str = "GetStatus";
    /// `ExperimentStatusService.GetActivePrompt()`
    pub const GET_ACTIVE_PROMPT: &str = "GetActivePrompt";
    /// `ExperimentStatusService.GetExperimentStatus()`
    pub const GET_EXPERIMENT_STATUS: &str = "GetExperimentStatus";
    /// `ExperimentStatusService.SetInput(option)`
    pub const SET_INPUT: &str = "SetInput";
    /// `AutomationStudio.Shutdown()`
    pub const SHUTDOWN: &str = "Shutdown";
}

/// The complete set of status strings the execution service is known to
/// emit from `GetStatus`. Any other text is an unclassified status and
/// must be surfaced verbatim, never coerced.
pub mod status_text {
    /// An experiment is executing.
    pub const RUNNING: &str = "Experiment running";
    /// The experiment finished normally.
    pub const COMPLETED: &str = "Experiment completed";
    /// No experiment has been started.
    pub const NO_EXPERIMENT: &str = "No experiment running";
    /// The experiment is paused.
    pub const PAUSED: &str = "Experiment paused";
    /// The experiment was aborted.
    pub const ABORTED: &str = "Experiment aborted";
    /// The experiment hit an error.
    pub const ERROR: &str = "Experiment error";

    /// All known status literals, for table-driven tests.
    pub const ALL: [&str; 6] = [RUNNING, COMPLETED, NO_EXPERIMENT, PAUSED, ABORTED, ERROR];
}

/// Prompt message and title fragments the run policy matches on.
pub mod prompt_text {
    /// Case-sensitive prefix of the out-of-tips prompt message.
    pub const NO_MORE_TIPS_PREFIX: &str = "No more tips";
    /// Lowercased title fragment of the pause-confirmation prompt.
    pub const TITLE_PAUSED: &str = "paused";
    /// Lowercased title fragment of the hardware-reset prompt.
    pub const TITLE_RESET_HARDWARE: &str = "reset hardware";
    /// Lowercased title fragment of the concurrent-run conflict prompt.
    pub const TITLE_EXPERIMENT_IN_PROGRESS: &str = "experiment in progress";

    /// Acknowledgment options the policy answers with.
    pub const OPTION_OK: &str = "OK";
    /// Declines a hardware reset.
    pub const OPTION_NO: &str = "No";
    /// Retries the failed action after a problem pause.
    pub const OPTION_REPEAT_ACTION: &str = "Repeat Action";
    /// Aborts the run after repeated problem pauses.
    pub const OPTION_ABORT: &str = "Abort";
}
