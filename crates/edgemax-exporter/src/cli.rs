//! Clap derive structures for the `edgemax-exporter` binary.

use std::path::PathBuf;

use clap::Parser;
use secrecy::SecretString;

use edgemax_config::Overrides;

/// edgemax-exporter -- Prometheus exporter for EdgeMAX appliances
#[derive(Debug, Parser)]
#[command(
    name = "edgemax-exporter",
    version,
    about = "Export EdgeMAX appliance statistics to Prometheus",
    long_about = "Logs in to an EdgeMAX appliance, subscribes to its stats websocket\n\
        and serves system, DPI and interface counters as Prometheus gauges.\n\n\
        Settings come from the config file, EDGEMAX_* environment variables\n\
        and the flags below, later sources winning."
)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, short = 'c', env = "EDGEMAX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Appliance URL, e.g. https://192.168.1.1
    #[arg(long, short = 'a', env = "EDGEMAX_ADDRESS")]
    pub address: Option<String>,

    /// Login username
    #[arg(long, short = 'u', env = "EDGEMAX_USERNAME")]
    pub username: Option<String>,

    /// Login password
    #[arg(long, env = "EDGEMAX_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "EDGEMAX_INSECURE")]
    pub insecure: bool,

    /// CA certificate (PEM) to trust for the appliance
    #[arg(long, env = "EDGEMAX_CA_CERT")]
    pub ca_cert: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, env = "EDGEMAX_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Seconds between session heartbeats
    #[arg(long, env = "EDGEMAX_HEARTBEAT_INTERVAL")]
    pub heartbeat_interval: Option<u64>,

    /// Address to serve metrics on, e.g. :9132
    #[arg(long, short = 'l', env = "EDGEMAX_LISTEN_ADDRESS")]
    pub listen_address: Option<String>,

    /// Path under which to expose metrics
    #[arg(long, env = "EDGEMAX_TELEMETRY_PATH")]
    pub telemetry_path: Option<String>,

    /// Metric name prefix
    #[arg(long, env = "EDGEMAX_NAMESPACE")]
    pub namespace: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Flag values as config overrides.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            address: self.address.clone(),
            username: self.username.clone(),
            password: self.password.clone().map(SecretString::from),
            insecure: self.insecure,
            ca_cert: self.ca_cert.clone(),
            timeout: self.timeout,
            heartbeat_interval: self.heartbeat_interval,
            listen_address: self.listen_address.clone(),
            telemetry_path: self.telemetry_path.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_become_overrides() {
        let cli = Cli::parse_from([
            "edgemax-exporter",
            "--address",
            "https://10.0.0.1",
            "-k",
            "--timeout",
            "3",
            "-vv",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.address.as_deref(), Some("https://10.0.0.1"));
        assert!(overrides.insecure);
        assert_eq!(overrides.timeout, Some(3));
        assert!(overrides.username.is_none());
        assert_eq!(cli.verbose, 2);
    }
}
