//! Run orchestration: opt-out check, state load, dedup, build, send, mark.
//!
//! One run walks a straight line: `Disabled` exits before any I/O;
//! `AlreadyReported` exits after the state load with no network traffic and
//! no file mutation; otherwise the report is built, a single delivery is
//! attempted, and the family is marked reported.

use tracing::{debug, info};
use uuid::Uuid;

use beacon_core::config::RunConfig;
use beacon_core::error::{BeaconError, Result};
use beacon_core::state::StateStore;

use crate::builder::build_report;
use crate::models::TelemetryMessage;
use crate::transport::TelemetryTransport;

/// Terminal state of one agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Opt-out was set; nothing was read, written, or sent.
    Disabled,
    /// This product family was already reported from this host.
    AlreadyReported,
    /// A report was built and one delivery was attempted.
    Reported { delivered: bool },
}

/// Execute one telemetry run.
///
/// The reported marker is written after the send attempt regardless of its
/// outcome: a failed delivery is not retried on later invocations. That
/// keeps the promise at "at most one attempt per product per host" and rules
/// out duplicate-send storms.
pub async fn run(config: &RunConfig) -> Result<RunOutcome> {
    // Opt-out short-circuits before any state-file I/O.
    if config.disabled {
        info!("telemetry disabled, skipping run");
        return Ok(RunOutcome::Disabled);
    }

    config.validate()?;

    let mut state = StateStore::load_or_init(&config.state_path, config.instance_id.as_deref())?;

    if state.is_reported(&config.product.family) {
        debug!(
            family = %config.product.family,
            "product already reported from this host, nothing to do"
        );
        return Ok(RunOutcome::AlreadyReported);
    }

    let instance_id = Uuid::parse_str(state.instance_id())
        .map_err(|e| BeaconError::State(format!("persisted instance id is not a UUID: {e}")))?;

    let report = build_report(&config.product, instance_id, config.wire_format);
    let message = TelemetryMessage::single(report);

    let transport = TelemetryTransport::new(config.endpoint.clone(), config.timeout)?;
    let outcome = transport.send(&message, config.wire_format).await?;

    state.mark_reported(&config.product.family)?;
    info!(
        family = %config.product.family,
        delivered = outcome.delivered(),
        "telemetry run complete"
    );

    Ok(RunOutcome::Reported {
        delivered: outcome.delivered(),
    })
}
