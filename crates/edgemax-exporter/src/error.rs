//! Exporter error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use edgemax_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const CONFIG: i32 = 2;
    pub const CONNECTION: i32 = 3;
    pub const STREAM_ENDED: i32 = 4;
    pub const SERVER: i32 = 5;
}

#[derive(Debug, Error, Diagnostic)]
pub enum ExporterError {
    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(edgemax::config),
        help(
            "Set the device address and credentials with --address, --username and\n\
             --password (or EDGEMAX_* environment variables), or in the config file."
        )
    )]
    Config(#[from] ConfigError),

    #[error("Invalid TLS settings")]
    #[diagnostic(
        code(edgemax::tls),
        help("Check that --ca-cert points to a readable PEM file, or use --insecure.")
    )]
    Tls {
        #[source]
        source: edgemax_api::Error,
    },

    // ── Device ───────────────────────────────────────────────────────
    #[error("Could not log in to {url}")]
    #[diagnostic(
        code(edgemax::login_failed),
        help(
            "Check that the appliance is reachable at {url}.\n\
             Factory certificates are self-signed: try --insecure."
        )
    )]
    Login {
        url: String,
        #[source]
        source: edgemax_api::Error,
    },

    #[error("Could not open the stats stream on {url}")]
    #[diagnostic(
        code(edgemax::stream_failed),
        help("The session may have been rejected; verify the username and password.")
    )]
    Stream {
        url: String,
        #[source]
        source: edgemax_api::Error,
    },

    #[error("The stats stream ended")]
    #[diagnostic(
        code(edgemax::stream_ended),
        help("The appliance closed the connection. Restart the exporter to reconnect.")
    )]
    StreamEnded,

    // ── Metrics endpoint ─────────────────────────────────────────────
    #[error("Could not listen on {addr}")]
    #[diagnostic(code(edgemax::bind))]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Metrics server failed")]
    #[diagnostic(code(edgemax::server))]
    Server(#[source] std::io::Error),
}

impl ExporterError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Tls { .. } => exit_code::CONFIG,
            Self::Login { .. } | Self::Stream { .. } => exit_code::CONNECTION,
            Self::StreamEnded => exit_code::STREAM_ENDED,
            Self::Bind { .. } | Self::Server(_) => exit_code::SERVER,
        }
    }

    /// Classify a failure to build or log in with the client.
    pub fn from_login(url: &str, source: edgemax_api::Error) -> Self {
        match source {
            edgemax_api::Error::Tls(_) => Self::Tls { source },
            source => Self::Login {
                url: url.to_owned(),
                source,
            },
        }
    }

    /// Classify a failure to open the subscription.
    pub fn from_stream(url: &str, source: edgemax_api::Error) -> Self {
        match source {
            edgemax_api::Error::Tls(_) => Self::Tls { source },
            source => Self::Stream {
                url: url.to_owned(),
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_category() {
        let config = ExporterError::Config(ConfigError::NoCredentials {
            field: "address".into(),
        });
        assert_eq!(config.exit_code(), exit_code::CONFIG);

        let tls = ExporterError::from_login("https://x", edgemax_api::Error::Tls("bad".into()));
        assert!(matches!(tls, ExporterError::Tls { .. }));
        assert_eq!(tls.exit_code(), exit_code::CONFIG);

        let stream = ExporterError::from_stream(
            "https://x",
            edgemax_api::Error::WebSocketConnect("refused".into()),
        );
        assert_eq!(stream.exit_code(), exit_code::CONNECTION);

        assert_eq!(ExporterError::StreamEnded.exit_code(), exit_code::STREAM_ENDED);
    }
}
