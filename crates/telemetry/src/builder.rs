//! Report assembly — fresh report id, UTC capture time, and metrics in the
//! dialect's fixed key order.

use chrono::Utc;
use uuid::Uuid;

use beacon_core::config::{ProductInfo, WireFormat};

use crate::models::{TelemetryMetric, TelemetryReport};

/// Metric key names per dialect, in wire order: version, OS, deployment.
fn metric_keys(format: WireFormat) -> [&'static str; 3] {
    match format {
        WireFormat::Generic => ["version", "osName", "hwArch"],
        WireFormat::Package => ["pillar_version", "OS", "deployment"],
    }
}

/// Build the single report for this run.
///
/// The report id is always freshly generated and distinct from the instance
/// id. Metadata values are taken as supplied — whether a family or version
/// is sensible is the server's concern, not the agent's.
pub fn build_report(
    product: &ProductInfo,
    instance_id: Uuid,
    format: WireFormat,
) -> TelemetryReport {
    let [version_key, os_key, deployment_key] = metric_keys(format);
    TelemetryReport {
        id: Uuid::new_v4(),
        create_time: Utc::now(),
        instance_id,
        product_family: product.family.clone(),
        metrics: vec![
            TelemetryMetric::new(version_key, product.version.clone()),
            TelemetryMetric::new(os_key, product.os_name.clone()),
            TelemetryMetric::new(deployment_key, product.deployment.clone()),
        ],
    }
}
