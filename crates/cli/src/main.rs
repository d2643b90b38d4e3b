use std::path::PathBuf;
use std::time::Duration;

use beacon_core::config::{
    ProductInfo, RunConfig, WireFormat, DEFAULT_ENDPOINT, DEFAULT_STATE_PATH,
};
use beacon_telemetry::runner::{self, RunOutcome};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Environment variable that disables telemetry entirely when set truthy.
const OPTOUT_ENV: &str = "BEACON_TELEMETRY_OPTOUT";

#[derive(Parser)]
#[command(name = "beacon", about = "One-shot product telemetry reporter", version)]
struct Cli {
    /// Product family to report
    #[arg(short = 'f', long)]
    product_family: String,

    /// Product version
    #[arg(short = 'v', long)]
    product_version: String,

    /// Operating system name
    #[arg(short = 'o', long)]
    os_name: String,

    /// Hardware architecture or deployment method
    #[arg(short = 'a', long)]
    hw_architecture: String,

    /// Instance ID (resolved from the host or generated when omitted)
    #[arg(short = 'i', long)]
    instance_id: Option<String>,

    /// State file path
    #[arg(long, default_value = DEFAULT_STATE_PATH)]
    state_file: PathBuf,

    /// Telemetry API endpoint
    #[arg(short = 'd', long, default_value = DEFAULT_ENDPOINT)]
    telemetry_api: String,

    /// Total send timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Wire dialect: generic or package
    #[arg(long, default_value = "generic")]
    wire_format: String,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<RunConfig> {
        let wire_format = WireFormat::from_name(&self.wire_format).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown wire format: {} (expected generic or package)",
                self.wire_format
            )
        })?;

        Ok(RunConfig {
            product: ProductInfo {
                family: self.product_family,
                version: self.product_version,
                os_name: self.os_name,
                deployment: self.hw_architecture,
            },
            instance_id: self.instance_id,
            state_path: self.state_file,
            endpoint: self.telemetry_api,
            timeout: Duration::from_secs(self.timeout_secs),
            wire_format,
            disabled: false,
        })
    }
}

/// True when the opt-out environment variable is set to a truthy value.
fn telemetry_opted_out() -> bool {
    match std::env::var(OPTOUT_ENV) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        ),
        Err(_) => false,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // The opt-out wins before argument parsing and before any file I/O.
    if telemetry_opted_out() {
        tracing::info!("{OPTOUT_ENV} is set, telemetry disabled");
        return Ok(());
    }

    let config = Cli::parse().into_config()?;

    match runner::run(&config).await? {
        RunOutcome::Disabled => tracing::info!("telemetry disabled, nothing sent"),
        RunOutcome::AlreadyReported => {
            tracing::info!("product already reported from this host, nothing to do")
        }
        RunOutcome::Reported { delivered: true } => {
            tracing::info!("telemetry report delivered")
        }
        RunOutcome::Reported { delivered: false } => {
            // Best effort by design: the exit code stays zero.
            tracing::warn!("telemetry report could not be delivered, will not retry")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 9] = [
        "beacon",
        "--product-family",
        "postgres",
        "--product-version",
        "16.1",
        "--os-name",
        "Ubuntu 22.04",
        "--hw-architecture",
        "x86_64",
    ];

    #[test]
    fn cli_parse_required_flags() {
        let cli = Cli::parse_from(REQUIRED);
        assert_eq!(cli.product_family, "postgres");
        assert_eq!(cli.product_version, "16.1");
        assert_eq!(cli.os_name, "Ubuntu 22.04");
        assert_eq!(cli.hw_architecture, "x86_64");
    }

    #[test]
    fn cli_parse_defaults() {
        let cli = Cli::parse_from(REQUIRED);
        assert!(cli.instance_id.is_none());
        assert_eq!(cli.state_file, PathBuf::from(DEFAULT_STATE_PATH));
        assert_eq!(cli.telemetry_api, DEFAULT_ENDPOINT);
        assert_eq!(cli.timeout_secs, 30);
        assert_eq!(cli.wire_format, "generic");
    }

    #[test]
    fn cli_parse_short_flags() {
        let cli = Cli::parse_from([
            "beacon", "-f", "mysql", "-v", "8.4", "-o", "Debian 12", "-a", "DOCKER", "-i",
            "123e4567-e89b-12d3-a456-426614174000", "-d", "https://telemetry.example.com/v1",
        ]);
        assert_eq!(cli.product_family, "mysql");
        assert_eq!(
            cli.instance_id.as_deref(),
            Some("123e4567-e89b-12d3-a456-426614174000")
        );
        assert_eq!(cli.telemetry_api, "https://telemetry.example.com/v1");
    }

    #[test]
    fn cli_missing_required_flag_is_an_error() {
        let result = Cli::try_parse_from(["beacon", "--product-version", "1.0"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_missing_all_flags_is_an_error() {
        assert!(Cli::try_parse_from(["beacon"]).is_err());
    }

    #[test]
    fn into_config_maps_fields() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--state-file", "/tmp/beacon-state", "--timeout-secs", "10"]);
        let config = Cli::parse_from(args).into_config().unwrap();

        assert_eq!(config.product.family, "postgres");
        assert_eq!(config.product.deployment, "x86_64");
        assert_eq!(config.state_path, PathBuf::from("/tmp/beacon-state"));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.wire_format, WireFormat::Generic);
        assert!(!config.disabled);
        config.validate().expect("parsed config should validate");
    }

    #[test]
    fn into_config_parses_package_dialect() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--wire-format", "package"]);
        let config = Cli::parse_from(args).into_config().unwrap();
        assert_eq!(config.wire_format, WireFormat::Package);
    }

    #[test]
    fn into_config_rejects_unknown_dialect() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--wire-format", "xml"]);
        let err = Cli::parse_from(args).into_config().unwrap_err();
        assert!(err.to_string().contains("unknown wire format"));
    }

    #[test]
    fn optout_env_truthy_values() {
        // Serialized through one test to avoid racing on the process env.
        for value in ["1", "true", "TRUE", " yes "] {
            std::env::set_var(OPTOUT_ENV, value);
            assert!(telemetry_opted_out(), "{value:?} should opt out");
        }
        for value in ["0", "false", "no", ""] {
            std::env::set_var(OPTOUT_ENV, value);
            assert!(!telemetry_opted_out(), "{value:?} should not opt out");
        }
        std::env::remove_var(OPTOUT_ENV);
        assert!(!telemetry_opted_out());
    }
}
