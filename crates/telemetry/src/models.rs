//! Telemetry report model and wire encoding.
//!
//! The in-memory report is dialect-neutral; [`TelemetryMessage::encode`]
//! maps it onto one of the two wire shapes. Field names, id encoding, and
//! metric keys are wire contract per dialect — see
//! [`beacon_core::config::WireFormat`].

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use beacon_core::config::WireFormat;
use beacon_core::error::{BeaconError, Result};

/// One key/value metric attached to a report.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TelemetryMetric {
    pub key: String,
    pub value: String,
}

impl TelemetryMetric {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One telemetry event: identity plus metrics, timestamped.
///
/// Owned by the run that builds it and discarded after the delivery attempt;
/// only the state-store marker persists.
#[derive(Debug, Clone)]
pub struct TelemetryReport {
    /// Fresh per-report id, never persisted.
    pub id: Uuid,
    /// Capture instant, UTC.
    pub create_time: DateTime<Utc>,
    /// The persisted host identifier.
    pub instance_id: Uuid,
    pub product_family: String,
    /// Order round-trips on the wire even though it carries no meaning.
    pub metrics: Vec<TelemetryMetric>,
}

/// Message envelope. The wire format supports batching but this agent always
/// sends exactly one report.
#[derive(Debug, Clone)]
pub struct TelemetryMessage {
    pub reports: Vec<TelemetryReport>,
}

impl TelemetryMessage {
    pub fn single(report: TelemetryReport) -> Self {
        Self {
            reports: vec![report],
        }
    }

    /// Serialize to the compact JSON POST body for the given dialect.
    pub fn encode(&self, format: WireFormat) -> Result<String> {
        let encoded = match format {
            WireFormat::Generic => serde_json::to_string(&GenericMessage {
                reports: self.reports.iter().map(GenericReport::from).collect(),
            }),
            WireFormat::Package => serde_json::to_string(&PackageMessage {
                reports: self.reports.iter().map(PackageReport::from).collect(),
            }),
        };
        encoded.map_err(|e| BeaconError::Serialization(e.to_string()))
    }
}

/// RFC 3339 with nanosecond precision, `Z` suffix.
fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[derive(Serialize)]
struct GenericMessage<'a> {
    reports: Vec<GenericReport<'a>>,
}

/// Generic dialect: UUIDs go out as standard base64 of their 16 raw bytes.
#[derive(Serialize)]
struct GenericReport<'a> {
    id: String,
    time: String,
    #[serde(rename = "instanceId")]
    instance_id: String,
    #[serde(rename = "productFamily")]
    product_family: &'a str,
    metrics: &'a [TelemetryMetric],
}

impl<'a> From<&'a TelemetryReport> for GenericReport<'a> {
    fn from(report: &'a TelemetryReport) -> Self {
        Self {
            id: BASE64.encode(report.id.as_bytes()),
            time: format_time(&report.create_time),
            instance_id: BASE64.encode(report.instance_id.as_bytes()),
            product_family: &report.product_family,
            metrics: &report.metrics,
        }
    }
}

#[derive(Serialize)]
struct PackageMessage<'a> {
    reports: Vec<PackageReport<'a>>,
}

/// Package dialect: plain hyphenated UUID strings, snake_case family field.
#[derive(Serialize)]
struct PackageReport<'a> {
    id: String,
    #[serde(rename = "createTime")]
    create_time: String,
    #[serde(rename = "instanceId")]
    instance_id: String,
    product_family: &'a str,
    metrics: &'a [TelemetryMetric],
}

impl<'a> From<&'a TelemetryReport> for PackageReport<'a> {
    fn from(report: &'a TelemetryReport) -> Self {
        Self {
            id: report.id.to_string(),
            create_time: format_time(&report.create_time),
            instance_id: report.instance_id.to_string(),
            product_family: &report.product_family,
            metrics: &report.metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_report() -> TelemetryReport {
        TelemetryReport {
            id: Uuid::parse_str("11111111-2222-3333-4444-555555555555").unwrap(),
            create_time: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
            instance_id: Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap(),
            product_family: "postgres".to_string(),
            metrics: vec![
                TelemetryMetric::new("version", "16.1"),
                TelemetryMetric::new("osName", "Ubuntu 22.04"),
                TelemetryMetric::new("hwArch", "x86_64"),
            ],
        }
    }

    #[test]
    fn generic_encoding_field_names() {
        let json = TelemetryMessage::single(sample_report())
            .encode(WireFormat::Generic)
            .unwrap();
        assert!(json.contains("\"reports\":["));
        assert!(json.contains("\"time\":\"2026-01-15T12:00:00.000000000Z\""));
        assert!(json.contains("\"productFamily\":\"postgres\""));
        assert!(!json.contains("createTime"));
        assert!(!json.contains("product_family"));
    }

    #[test]
    fn generic_encoding_base64_ids() {
        let report = sample_report();
        let json = TelemetryMessage::single(report.clone())
            .encode(WireFormat::Generic)
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let wire = &parsed["reports"][0];

        let id_bytes = BASE64.decode(wire["id"].as_str().unwrap()).unwrap();
        assert_eq!(id_bytes, report.id.as_bytes());

        let instance_bytes = BASE64.decode(wire["instanceId"].as_str().unwrap()).unwrap();
        assert_eq!(instance_bytes, report.instance_id.as_bytes());
    }

    #[test]
    fn package_encoding_field_names() {
        let json = TelemetryMessage::single(sample_report())
            .encode(WireFormat::Package)
            .unwrap();
        assert!(json.contains("\"createTime\":\"2026-01-15T12:00:00.000000000Z\""));
        assert!(json.contains("\"product_family\":\"postgres\""));
        assert!(json.contains("\"instanceId\":\"123e4567-e89b-12d3-a456-426614174000\""));
        assert!(!json.contains("\"time\":"));
        assert!(!json.contains("productFamily"));
    }

    #[test]
    fn package_encoding_uuid_strings() {
        let json = TelemetryMessage::single(sample_report())
            .encode(WireFormat::Package)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let wire = &parsed["reports"][0];
        assert_eq!(
            wire["id"].as_str().unwrap(),
            "11111111-2222-3333-4444-555555555555"
        );
    }

    #[test]
    fn metric_order_round_trips() {
        for format in [WireFormat::Generic, WireFormat::Package] {
            let json = TelemetryMessage::single(sample_report())
                .encode(format)
                .unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
            let metrics = parsed["reports"][0]["metrics"].as_array().unwrap();
            assert_eq!(metrics.len(), 3);
            assert_eq!(metrics[0]["key"], "version");
            assert_eq!(metrics[0]["value"], "16.1");
            assert_eq!(metrics[1]["key"], "osName");
            assert_eq!(metrics[2]["key"], "hwArch");
        }
    }

    #[test]
    fn message_wraps_exactly_one_report() {
        let json = TelemetryMessage::single(sample_report())
            .encode(WireFormat::Generic)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["reports"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn encoding_is_compact() {
        let json = TelemetryMessage::single(sample_report())
            .encode(WireFormat::Generic)
            .unwrap();
        assert!(!json.contains('\n'));
        assert!(!json.contains(": "));
    }

    #[test]
    fn timestamp_carries_nanosecond_precision() {
        let mut report = sample_report();
        report.create_time = DateTime::from_timestamp(1_768_478_400, 123_456_789).unwrap();
        let json = TelemetryMessage::single(report)
            .encode(WireFormat::Generic)
            .unwrap();
        assert!(json.contains(".123456789Z"));
    }
}
