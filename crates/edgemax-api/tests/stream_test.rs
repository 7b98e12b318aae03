#![allow(clippy::unwrap_used)]
// Integration tests for the stats websocket against a local TLS listener.

use std::net::TcpListener;
use std::sync::Arc;

use reqwest::cookie::Jar;
use rustls_pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{
    self,
    handshake::server::{Request, Response},
};

use edgemax_api::{EdgeMaxClient, StatSinks, StreamConfig, TlsMode, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

/// What the device saw in the websocket upgrade request.
#[derive(Debug)]
struct Upgrade {
    path: String,
    origin: Option<String>,
    cookie: Option<String>,
    extensions: Option<String>,
}

impl Upgrade {
    fn from_request(req: &Request) -> Self {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        Self {
            path: req.uri().path().to_owned(),
            origin: header("origin"),
            cookie: header("cookie"),
            extensions: header("sec-websocket-extensions"),
        }
    }
}

fn self_signed_config() -> Arc<rustls::ServerConfig> {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_owned()]).unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der()));

    let config =
        rustls::ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(vec![cert.cert.der().clone()], key)
            .unwrap();
    Arc::new(config)
}

/// Accept one TLS websocket connection, record its upgrade request and
/// return the first text message (the subscribe frame).
fn accept_one(listener: &TcpListener, config: Arc<rustls::ServerConfig>) -> (Upgrade, String) {
    let (tcp, _) = listener.accept().unwrap();
    let tls = rustls::StreamOwned::new(rustls::ServerConnection::new(config).unwrap(), tcp);

    let (seen_tx, seen_rx) = std::sync::mpsc::channel();
    let mut ws = tungstenite::accept_hdr(tls, move |req: &Request, resp: Response| {
        seen_tx.send(Upgrade::from_request(req)).unwrap();
        Ok(resp)
    })
    .unwrap();

    let frame = ws.read().unwrap().into_text().unwrap().as_str().to_owned();
    (seen_rx.recv().unwrap(), frame)
}

fn sinks() -> (
    StatSinks,
    (
        mpsc::Receiver<edgemax_api::SystemStat>,
        mpsc::Receiver<edgemax_api::DpiStat>,
        mpsc::Receiver<edgemax_api::InterfacesStat>,
    ),
) {
    let (system, system_rx) = mpsc::channel(1);
    let (dpi, dpi_rx) = mpsc::channel(1);
    let (interfaces, interfaces_rx) = mpsc::channel(1);
    let sinks = StatSinks {
        system,
        dpi,
        interfaces,
    };
    (sinks, (system_rx, dpi_rx, interfaces_rx))
}

// ── Upgrade request tests ───────────────────────────────────────────

#[tokio::test]
async fn test_stats_upgrade_sends_origin_cookie_and_path() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let config = self_signed_config();
    let device = tokio::task::spawn_blocking(move || accept_one(&listener, config));

    let base = format!("https://{addr}");
    let jar = Arc::new(Jar::default());
    jar.add_cookie_str("PHPSESSID=abc123; Path=/", &base.parse().unwrap());
    let transport = TransportConfig {
        tls: TlsMode::DangerAcceptInvalid,
        cookie_jar: Some(jar),
        ..TransportConfig::default()
    };
    let client = EdgeMaxClient::new(&base, &transport).unwrap();

    let (sinks, _receivers) = sinks();
    let handle = client.stats(sinks, &StreamConfig::default()).await.unwrap();
    let (upgrade, frame) = device.await.unwrap();
    handle.stop().await;

    assert_eq!(upgrade.path, "/ws/stats");
    assert_eq!(upgrade.origin.as_deref(), Some(base.as_str()));
    let cookie = upgrade.cookie.unwrap_or_default();
    assert!(cookie.contains("PHPSESSID=abc123"), "cookie header: {cookie}");
    assert!(
        upgrade.extensions.is_none(),
        "unexpected extension offer: {:?}",
        upgrade.extensions
    );
    assert!(frame.contains(r#""SESSION_ID":"abc123""#), "subscribe frame: {frame}");
}

#[tokio::test]
async fn test_stats_upgrade_without_session_has_no_cookie() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let config = self_signed_config();
    let device = tokio::task::spawn_blocking(move || accept_one(&listener, config));

    let transport = TransportConfig {
        tls: TlsMode::DangerAcceptInvalid,
        ..TransportConfig::default()
    };
    let client = EdgeMaxClient::new(&format!("https://{addr}/"), &transport).unwrap();

    let (sinks, _receivers) = sinks();
    let handle = client.stats(sinks, &StreamConfig::default()).await.unwrap();
    let (upgrade, frame) = device.await.unwrap();
    handle.stop().await;

    assert_eq!(upgrade.path, "/ws/stats");
    assert!(upgrade.cookie.is_none(), "cookie header: {:?}", upgrade.cookie);
    assert!(frame.contains(r#""SESSION_ID":"""#), "subscribe frame: {frame}");
}
