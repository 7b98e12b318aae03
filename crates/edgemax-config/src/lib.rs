//! Configuration for the EdgeMAX exporter.
//!
//! TOML file + environment loading via figment, command-line overrides,
//! credential resolution, and translation into `edgemax_api` transport and
//! stream settings. The binary adds clap parsing on top.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use edgemax_api::{StreamConfig, TlsMode, TransportConfig};

/// Prefix of the environment variables merged over the config file.
pub const ENV_PREFIX: &str = "EDGEMAX_";

/// Environment variable consulted for the device password.
pub const PASSWORD_ENV: &str = "EDGEMAX_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {field} configured for the device")]
    NoCredentials { field: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// The appliance to stream from.
    #[serde(default)]
    pub device: DeviceConfig,

    /// The metrics endpoint.
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Appliance base URL (e.g., "https://192.168.1.1").
    pub address: Option<String>,

    pub username: Option<String>,

    /// Password (plaintext; prefer `EDGEMAX_PASSWORD`).
    pub password: Option<String>,

    /// Skip certificate verification.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between keep-alive heartbeats.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: None,
            username: None,
            password: None,
            insecure: false,
            ca_cert: None,
            timeout: default_timeout(),
            heartbeat_interval: default_heartbeat_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebConfig {
    /// Address for the metrics listener. A bare `:port` binds all interfaces.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    #[serde(default = "default_telemetry_path")]
    pub telemetry_path: String,

    /// Prefix for every exported metric name.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            telemetry_path: default_telemetry_path(),
            namespace: default_namespace(),
        }
    }
}

fn default_timeout() -> u64 {
    5
}
fn default_heartbeat_interval() -> u64 {
    10
}
fn default_listen_address() -> String {
    "0.0.0.0:9132".into()
}
fn default_telemetry_path() -> String {
    "/metrics".into()
}
fn default_namespace() -> String {
    "edgemax".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "edgemax-exporter", "edgemax-exporter").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("edgemax-exporter");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from `path` (or the platform default) plus environment.
///
/// A missing file is not an error; defaults and environment still apply.
/// Environment keys use `EDGEMAX_` and `__` for nesting, e.g.
/// `EDGEMAX_DEVICE__ADDRESS`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_with_env(path, Env::prefixed(ENV_PREFIX))
}

/// [`load_config`] with a caller-supplied environment layer.
pub fn load_config_with_env(path: Option<&Path>, env: Env) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(env.split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Overrides ───────────────────────────────────────────────────────

/// Values supplied on the command line. `None` leaves the loaded value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub address: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub insecure: bool,
    pub ca_cert: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub heartbeat_interval: Option<u64>,
    pub listen_address: Option<String>,
    pub telemetry_path: Option<String>,
    pub namespace: Option<String>,
}

// ── Resolution ──────────────────────────────────────────────────────

/// Fully validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub address: Url,
    pub username: String,
    pub password: SecretString,
    pub transport: TransportConfig,
    pub stream: StreamConfig,
    pub listen_address: SocketAddr,
    pub telemetry_path: String,
    pub namespace: String,
}

/// Merge `overrides` over `config` and validate the result.
///
/// Password order: override, then `EDGEMAX_PASSWORD`, then the file.
pub fn resolve(config: &Config, overrides: Overrides) -> Result<Settings, ConfigError> {
    let env_password = std::env::var(PASSWORD_ENV).ok().map(SecretString::from);
    resolve_with_env_password(config, overrides, env_password)
}

/// [`resolve`] with the `EDGEMAX_PASSWORD` value supplied by the caller.
pub fn resolve_with_env_password(
    config: &Config,
    overrides: Overrides,
    env_password: Option<SecretString>,
) -> Result<Settings, ConfigError> {
    let device = &config.device;
    let web = &config.web;

    let raw_address = overrides
        .address
        .or_else(|| device.address.clone())
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| ConfigError::NoCredentials {
            field: "address".into(),
        })?;
    let address = parse_address(&raw_address)?;

    let username = overrides
        .username
        .or_else(|| device.username.clone())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ConfigError::NoCredentials {
            field: "username".into(),
        })?;

    let password = overrides
        .password
        .or(env_password)
        .or_else(|| device.password.clone().map(SecretString::from))
        .ok_or_else(|| ConfigError::NoCredentials {
            field: "password".into(),
        })?;

    let timeout = overrides.timeout.unwrap_or(device.timeout);
    if timeout == 0 {
        return Err(ConfigError::validation("timeout", "must be greater than 0"));
    }

    let heartbeat = overrides
        .heartbeat_interval
        .unwrap_or(device.heartbeat_interval);
    if heartbeat == 0 {
        return Err(ConfigError::validation(
            "heartbeat_interval",
            "must be greater than 0",
        ));
    }

    let tls = if overrides.insecure || device.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ca) = overrides.ca_cert.or_else(|| device.ca_cert.clone()) {
        TlsMode::CustomCa(ca)
    } else {
        TlsMode::System
    };

    let listen_raw = overrides
        .listen_address
        .unwrap_or_else(|| web.listen_address.clone());
    let listen_address = parse_listen_address(&listen_raw)?;

    let telemetry_path = overrides
        .telemetry_path
        .unwrap_or_else(|| web.telemetry_path.clone());
    if !telemetry_path.starts_with('/') || telemetry_path.len() < 2 {
        return Err(ConfigError::validation(
            "telemetry_path",
            format!("expected an absolute path other than '/', got '{telemetry_path}'"),
        ));
    }

    let namespace = overrides.namespace.unwrap_or_else(|| web.namespace.clone());
    if !is_metric_namespace(&namespace) {
        return Err(ConfigError::validation(
            "namespace",
            format!("'{namespace}' is not a valid metric name prefix"),
        ));
    }

    Ok(Settings {
        address,
        username,
        password,
        transport: TransportConfig {
            tls,
            timeout: Duration::from_secs(timeout),
            cookie_jar: None,
        },
        stream: StreamConfig {
            heartbeat_interval: Duration::from_secs(heartbeat),
            ..StreamConfig::default()
        },
        listen_address,
        telemetry_path,
        namespace,
    })
}

fn parse_address(raw: &str) -> Result<Url, ConfigError> {
    let url: Url = raw
        .parse()
        .map_err(|e| ConfigError::validation("address", format!("invalid URL '{raw}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::validation(
            "address",
            format!("expected an http or https URL, got '{raw}'"),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::validation(
            "address",
            format!("missing host in '{raw}'"),
        ));
    }
    Ok(url)
}

fn parse_listen_address(raw: &str) -> Result<SocketAddr, ConfigError> {
    let full = if raw.starts_with(':') {
        format!("0.0.0.0{raw}")
    } else {
        raw.to_owned()
    };
    full.parse().map_err(|e| {
        ConfigError::validation("listen_address", format!("invalid socket address '{raw}': {e}"))
    })
}

fn is_metric_namespace(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn listen_address_accepts_bare_port() {
        let addr = parse_listen_address(":9132").unwrap();
        assert_eq!(addr, "0.0.0.0:9132".parse().unwrap());
        assert!(parse_listen_address("localhost").is_err());
    }

    #[test]
    fn address_requires_http_scheme_and_host() {
        assert!(parse_address("https://192.168.1.1").is_ok());
        assert!(parse_address("ftp://192.168.1.1").is_err());
        assert!(parse_address("192.168.1.1").is_err());
    }

    #[test]
    fn namespace_must_be_metric_safe() {
        assert!(is_metric_namespace("edgemax"));
        assert!(is_metric_namespace("_edge_2"));
        assert!(!is_metric_namespace(""));
        assert!(!is_metric_namespace("2edge"));
        assert!(!is_metric_namespace("edge-max"));
    }
}
