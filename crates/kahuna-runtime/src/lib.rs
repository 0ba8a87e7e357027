//! Run-state polling and run control for the Big Kahuna instrument.
//!
//! The instrument's vendor application exposes run control as RPC
//! services that answer free-text status strings; this crate turns that
//! surface into a typed state machine and drives experiments through
//! it: find or start the application, submit a run in the vendor's
//! required order, then poll, classify, and react until the run reaches
//! a terminal state.
//!
//! # Architecture
//!
//! ```text
//!   RunController ── submit_run / drive_to_completion / resume
//!        │
//!        ├── wait_for_change ──► StateClassifier ──► PollResult
//!        │                            │
//!        │                  StatusPoller + PromptInspector
//!        │                            │
//!   RunSession ───────────────► StudioClient ──► dyn RpcClient
//!   (discovery, launcher,
//!    shutdown quirk)
//! ```
//!
//! Everything below the classifier is one vendor query; everything
//! above it is policy. The only place the runtime sleeps is the
//! wait-for-change loop (and the documented settle delays), so cadence
//! is testable with paused time.
//!
//! # Example
//!
//! ```no_run
//! use kahuna_client::testing::ScriptedDiscovery;
//! use kahuna_runtime::{KahunaConfig, RunController, RunRequest, RunSession};
//!
//! # async fn demo() -> Result<(), kahuna_runtime::RuntimeError> {
//! let discovery = ScriptedDiscovery::new();
//! let session = RunSession::connect(&discovery, KahunaConfig::default()).await?;
//! let mut controller = RunController::new(session);
//!
//! let request = RunRequest::new(42, "C:/runs/prompts.csv", "C:/runs/chem.csv");
//! let report = controller.run(&request).await?;
//! println!("{:?} after {} pauses", report.outcome, report.pause_count);
//!
//! controller.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod controller;
pub mod error;
pub mod poller;
pub mod progress;
pub mod record;
pub mod session;
pub mod studio;
pub mod wait;

pub use classifier::{PollResult, StateClassifier};
pub use config::{ConfigError, ConfigLoader, KahunaConfig, RecordConfig};
pub use controller::{
    RunController, RunOutcome, RunReport, RunRequest, RunStartResult,
};
pub use error::RuntimeError;
pub use poller::{PromptInspector, StatusPoller};
pub use progress::{ExperimentProgress, MapProgress};
pub use record::ObservationLog;
pub use session::RunSession;
pub use studio::StudioClient;
pub use wait::wait_for_change;
