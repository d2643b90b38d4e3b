//! Beacon Telemetry — builds and delivers the one-per-product host report.
//!
//! The orchestrator in [`runner`] guarantees at most one delivery attempt
//! per product family per host, tracked by `beacon-core`'s state store.
//! Delivery itself is fire-and-forget: tried once, logged, never retried.

pub mod builder;
pub mod models;
pub mod runner;
pub mod transport;

pub use models::{TelemetryMessage, TelemetryMetric, TelemetryReport};
pub use runner::{run, RunOutcome};
pub use transport::{SendOutcome, TelemetryTransport};
