//! Report delivery — one HTTP POST, bounded timeout, fire-and-forget.
//!
//! Exactly one attempt per run: no retry, no backoff. A failed attempt is
//! logged and folded into the [`SendOutcome`]; the caller still writes its
//! reported marker, trading a possibly lost report for the guarantee that a
//! host never spams the endpoint.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};

use beacon_core::config::WireFormat;
use beacon_core::error::{BeaconError, Result};

use crate::models::TelemetryMessage;

/// Outcome of the single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Server answered 2xx.
    Delivered,
    /// Server answered with the given non-2xx status.
    Rejected(u16),
    /// Connect error or timeout before any status was received.
    Failed,
}

impl SendOutcome {
    pub fn delivered(self) -> bool {
        matches!(self, SendOutcome::Delivered)
    }
}

/// Sends telemetry messages to a configured endpoint.
///
/// Fire-and-forget: transport-level failures are logged via `tracing::warn`
/// but never returned as errors. Telemetry must not affect the host product.
pub struct TelemetryTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl TelemetryTransport {
    /// Create a transport with a bounded total request timeout.
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BeaconError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { endpoint, client })
    }

    /// Deliver one message. Exactly one attempt.
    ///
    /// Serialization failure is returned as an error — the body is fully
    /// self-controlled, so that would be a bug, not a runtime condition.
    /// Everything transport-level lands in the outcome. The response body is
    /// ignored; only the status code is kept for diagnostics.
    pub async fn send(&self, message: &TelemetryMessage, format: WireFormat) -> Result<SendOutcome> {
        let body = message.encode(format)?;
        tracing::debug!(%body, endpoint = %self.endpoint, "sending telemetry report");

        let result = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header("Auth-Status", "0")
            .body(body)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    tracing::debug!(status = %status, "telemetry report submitted");
                    Ok(SendOutcome::Delivered)
                } else {
                    tracing::warn!(status = %status, "telemetry report rejected by server");
                    Ok(SendOutcome::Rejected(status.as_u16()))
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to submit telemetry report");
                Ok(SendOutcome::Failed)
            }
        }
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
