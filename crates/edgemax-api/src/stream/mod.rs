//! Stats websocket subscription.
//!
//! [`EdgeMaxClient::stats`] dials the device's stats websocket, sends the
//! topic subscription, then runs two background tasks until stopped:
//!
//! - the read loop, which decodes each message and forwards typed stats to
//!   the caller's channels;
//! - the keep-alive loop, which pings the heartbeat endpoint so the session
//!   does not expire.
//!
//! Both tasks share one [`CancellationToken`]. A read failure cancels it,
//! which also ends the keep-alive loop. There is no reconnection: once the
//! subscription ends, a new login and a new `stats` call are needed.
//!
//! # Example
//!
//! ```rust,ignore
//! use edgemax_api::{EdgeMaxClient, StatSinks, StreamConfig, TransportConfig};
//! use tokio::sync::mpsc;
//!
//! let client = EdgeMaxClient::new("https://192.168.1.1", &TransportConfig::default())?;
//! client.login("ubnt", &password).await?;
//!
//! let (system_tx, mut system_rx) = mpsc::channel(1);
//! let (dpi_tx, dpi_rx) = mpsc::channel(1);
//! let (ifaces_tx, ifaces_rx) = mpsc::channel(1);
//! let sinks = StatSinks { system: system_tx, dpi: dpi_tx, interfaces: ifaces_tx };
//!
//! let handle = client.stats(sinks, &StreamConfig::default()).await?;
//! while let Some(stat) = system_rx.recv().await {
//!     println!("cpu: {:?}", stat.cpu_percent());
//! }
//! handle.stop().await;
//! ```

mod keepalive;
mod read;

use std::fmt::Display;
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

pub use read::StatEnvelope;

use crate::client::{DEFAULT_SESSION_COOKIE, EdgeMaxClient};
use crate::codec::{ConnectRequest, Topic, encode_frame};
use crate::error::Error;
use crate::stat::{DPI_TOPIC, DpiStat, INTERFACES_TOPIC, InterfacesStat, SYSTEM_TOPIC, SystemStat};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

// ── StreamConfig ─────────────────────────────────────────────────────

/// Settings for a stats subscription.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Websocket path on the device. Default: `/ws/stats`.
    pub stream_path: String,

    /// Topics named in the subscribe request.
    pub topics: Vec<String>,

    /// Delay between heartbeat requests. Default: 10s.
    pub heartbeat_interval: Duration,

    /// Cookie whose value is sent as `SESSION_ID`. Default: `PHPSESSID`.
    pub session_cookie: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            stream_path: "/ws/stats".into(),
            topics: vec![
                SYSTEM_TOPIC.into(),
                DPI_TOPIC.into(),
                INTERFACES_TOPIC.into(),
            ],
            heartbeat_interval: Duration::from_secs(10),
            session_cookie: DEFAULT_SESSION_COOKIE.into(),
        }
    }
}

// ── StatSinks ────────────────────────────────────────────────────────

/// Caller-owned output channels, one per recognized topic.
///
/// Sends block while a channel is full, so a slow consumer slows the read
/// loop down. Consumers must keep draining for the life of the
/// subscription.
#[derive(Debug, Clone)]
pub struct StatSinks {
    pub system: mpsc::Sender<SystemStat>,
    pub dpi: mpsc::Sender<DpiStat>,
    pub interfaces: mpsc::Sender<InterfacesStat>,
}

// ── StatsHandle ──────────────────────────────────────────────────────

/// Handle to a running stats subscription.
///
/// Dropping the handle signals both tasks to stop but does not wait for
/// them; call [`stop`](Self::stop) for an orderly shutdown.
pub struct StatsHandle {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl StatsHandle {
    /// Spawn the read and keep-alive loops over an established stream.
    pub(crate) fn spawn<S>(
        client: EdgeMaxClient,
        stream: S,
        sinks: StatSinks,
        config: &StreamConfig,
    ) -> Self
    where
        S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin + Send + 'static,
    {
        let cancel = CancellationToken::new();

        let reader = tokio::spawn(read::read_loop(stream, sinks, cancel.clone()));
        let keeper = tokio::spawn(keepalive::keep_alive(
            client,
            config.heartbeat_interval,
            cancel.clone(),
        ));

        Self {
            cancel,
            tasks: vec![reader, keeper],
        }
    }

    /// Stop the subscription and wait until both loops have exited.
    ///
    /// Once this returns, nothing more is sent on the output channels and
    /// no further heartbeat requests are made.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!(error = %e, "stats task did not exit cleanly");
            }
        }
        debug!("stats subscription stopped");
    }

    /// Resolves once the subscription has been told to stop, either by
    /// [`stop`](Self::stop) or by a fatal read error.
    pub async fn stopped(&self) {
        self.cancel.cancelled().await;
    }

    /// Whether the subscription has been told to stop.
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for StatsHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Client entry point ───────────────────────────────────────────────

impl EdgeMaxClient {
    /// Open the stats websocket and stream typed stats into `sinks`.
    ///
    /// Requires a prior successful [`login`](Self::login). Connection
    /// failures are returned here; nothing is retried.
    pub async fn stats(&self, sinks: StatSinks, config: &StreamConfig) -> Result<StatsHandle, Error> {
        let mut ws = self.dial(config).await?;

        let session_id = self.cookie_value(&config.session_cookie).unwrap_or_else(|| {
            warn!(cookie = %config.session_cookie, "no session cookie, subscribing without one");
            String::new()
        });
        subscribe(&mut ws, &config.topics, session_id).await?;

        Ok(StatsHandle::spawn(self.clone(), ws, sinks, config))
    }

    /// Connect the stats websocket, reusing the session's TLS settings.
    async fn dial(&self, config: &StreamConfig) -> Result<WsStream, Error> {
        let url = stream_url(self.base_url(), &config.stream_path)?;
        info!(url = %url, "connecting to stats websocket");

        let uri: tungstenite::http::Uri = url
            .as_str()
            .parse()
            .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

        let mut request = ClientRequestBuilder::new(uri).with_header("Origin", origin(self.base_url()));
        if let Some(cookie) = self.cookie_header() {
            request = request.with_header("Cookie", cookie);
        }

        let connector = self.transport().websocket_connector()?;
        // No permessage-deflate offer: tungstenite cannot inflate compressed frames.
        let (ws, _response) =
            tokio_tungstenite::connect_async_tls_with_config(request, None, false, Some(connector))
                .await
                .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        info!("stats websocket connected");
        Ok(ws)
    }
}

/// Send the one-shot subscribe request. No acknowledgement is awaited.
async fn subscribe<W>(ws: &mut W, topics: &[String], session_id: String) -> Result<(), Error>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let request = ConnectRequest {
        subscribe: Some(topics.iter().map(Topic::new).collect()),
        unsubscribe: None,
        session_id,
    };
    let frame = encode_frame(&request)?;
    debug!(topics = ?topics, "subscribing to stats topics");

    ws.send(Message::text(frame))
        .await
        .map_err(|e| Error::WebSocketSend(e.to_string()))
}

// ── URL helpers ──────────────────────────────────────────────────────

/// Websocket URL: the base URL with a `wss` scheme and the stream path.
fn stream_url(base: &Url, path: &str) -> Result<Url, Error> {
    let mut url = base.clone();
    url.set_scheme("wss").map_err(|()| Error::StreamUrl {
        url: base.to_string(),
    })?;
    url.set_path(path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// `Origin` header value: scheme and host (with any explicit port).
fn origin(base: &Url) -> String {
    let host = base.host_str().unwrap_or_default();
    match base.port() {
        Some(port) => format!("{}://{host}:{port}", base.scheme()),
        None => format!("{}://{host}", base.scheme()),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
