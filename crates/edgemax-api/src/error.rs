use thiserror::Error;

/// Top-level error type for the `edgemax-api` crate.
///
/// Covers session setup, the stats websocket, the hybrid frame codec and
/// the string-encoded counters inside stat payloads.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base address cannot be turned into a websocket endpoint.
    #[error("Cannot derive stream URL from {url}")]
    StreamUrl { url: String },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// Sending on an established WebSocket failed.
    #[error("WebSocket send failed: {0}")]
    WebSocketSend(String),

    // ── Codec ───────────────────────────────────────────────────────
    /// A framed message did not split into `<length>\n<body>`.
    #[error("incorrect number of elements in websocket message: {parts}")]
    Frame { parts: usize },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Stat values ─────────────────────────────────────────────────
    /// A counter or gauge field was absent from the payload.
    #[error("stat field '{field}' is missing")]
    MissingStatValue { field: &'static str },

    /// A counter or gauge field was not a decimal number.
    #[error("stat field '{field}' is not a number: {value:?}")]
    InvalidStatValue { field: &'static str, value: String },
}
