//! Drives one experiment against a scripted vendor, start to finish.
//!
//! Run with `cargo run -p kahuna-runtime --example scripted_run`.
//! `RUST_LOG=debug` shows the classification traffic.

use kahuna_client::testing::{ok_envelope, ScriptedDiscovery};
use kahuna_protocol::endpoints::{op, server, service, status_text};
use kahuna_runtime::{KahunaConfig, RunController, RunRequest, RunSession, RuntimeError};
use tracing_subscriber::EnvFilter;

fn script_vendor(discovery: &ScriptedDiscovery) {
    let launcher = discovery.serve(server::AUTOMATION_REMOTE);
    launcher.respond_ok(
        service::AUTOMATION_STUDIO_REMOTE,
        op::START,
        &ok_envelope("", 1),
    );

    let studio = discovery.serve(server::AUTOMATION_STUDIO);
    for operation in [op::CHOOSE_DESIGN_ID, op::SET_PROMPTS, op::SET_CHEMICAL_MANAGER] {
        studio.respond_ok(service::EXPERIMENT, operation, &ok_envelope("", 0));
    }
    studio.respond_ok(service::RUN, op::START, &ok_envelope("", 0));
    studio.respond_ok(service::RUN, op::ABORT, &ok_envelope("", 0));
    studio.respond_ok(service::AUTOMATION_STUDIO, op::SHUTDOWN, &ok_envelope("", 0));

    let statuses = [
        status_text::NO_EXPERIMENT,
        status_text::RUNNING,
        status_text::RUNNING,
        status_text::COMPLETED,
    ];
    for text in statuses {
        studio.respond_ok(
            service::EXPERIMENT_STATUS,
            op::GET_STATUS,
            &ok_envelope(text, 0),
        );
    }
    studio.respond_ok(
        service::EXPERIMENT_STATUS,
        op::GET_ACTIVE_PROMPT,
        &ok_envelope("No prompts are waiting for user input.", 1),
    );
}

#[tokio::main]
async fn main() -> Result<(), RuntimeError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let discovery = ScriptedDiscovery::new();
    script_vendor(&discovery);

    let mut config = KahunaConfig::default();
    config.poll_interval_ms = 100;
    config.shutdown_settle_s = 1;

    let session = RunSession::connect(&discovery, config).await?;
    let mut controller = RunController::new(session);

    let request = RunRequest::new(42, "C:/runs/prompts.csv", "C:/runs/chem.csv");
    let report = controller.run(&request).await?;
    println!(
        "run finished: {:?} (final status {:?}, {} pauses)",
        report.outcome, report.final_status, report.pause_count
    );

    controller.shutdown().await?;
    Ok(())
}
