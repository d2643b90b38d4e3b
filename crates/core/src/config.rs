//! Run configuration for one telemetry invocation.
//!
//! Everything a run needs is passed in explicitly as a [`RunConfig`] — the
//! orchestrator never reads flags or environment variables itself, which
//! keeps it testable without touching process state.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BeaconError, Result};

/// Default collection endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8081/v1/telemetry/GenericReport";

/// Default on-disk state file location.
pub const DEFAULT_STATE_PATH: &str = "/var/lib/beacon/state";

/// Default bound on the whole delivery attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Wire dialect for the outbound report.
///
/// Field names, id encoding, and metric key names differ between deployment
/// targets; which dialect a host speaks is a configuration choice, not
/// negotiated. The names below are wire contract — never rename them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// `time`/`productFamily` field names, base64-encoded UUIDs, and
    /// `version`/`osName`/`hwArch` metric keys. Used by Docker deployments.
    #[default]
    Generic,
    /// `createTime`/`product_family` field names, plain UUID strings, and
    /// `pillar_version`/`OS`/`deployment` metric keys. Used by OS packages.
    Package,
}

impl WireFormat {
    /// Parse a dialect name as supplied on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "generic" => Some(Self::Generic),
            "package" => Some(Self::Package),
            _ => None,
        }
    }

    /// The canonical dialect name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Package => "package",
        }
    }
}

/// Product metadata attached to a report as metrics.
///
/// All values are free-form strings and are sent as supplied; content policy
/// (e.g. which families are known) is the server's concern.
#[derive(Debug, Clone)]
pub struct ProductInfo {
    pub family: String,
    pub version: String,
    pub os_name: String,
    /// Hardware architecture or deployment method, depending on the dialect.
    pub deployment: String,
}

/// Configuration for one agent run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub product: ProductInfo,
    /// Externally supplied instance id; resolved from the host when absent.
    pub instance_id: Option<String>,
    pub state_path: PathBuf,
    pub endpoint: String,
    pub timeout: Duration,
    pub wire_format: WireFormat,
    /// Opt-out signal; checked before any file or network I/O.
    pub disabled: bool,
}

impl RunConfig {
    /// Reject configurations with empty required fields.
    ///
    /// The CLI already enforces required flags; this is the check library
    /// callers get.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("product family", &self.product.family),
            ("product version", &self.product.version),
            ("os name", &self.product.os_name),
            ("deployment", &self.product.deployment),
            ("endpoint", &self.endpoint),
        ] {
            if value.trim().is_empty() {
                return Err(BeaconError::Config(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }
}
