// EdgeMAX session client
//
// Wraps `reqwest::Client` with the cookie jar that carries the session
// established by `login`. The same jar feeds the heartbeat requests and
// the `SESSION_ID` of the websocket subscription.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Name of the session cookie set by the device on login.
pub const DEFAULT_SESSION_COOKIE: &str = "PHPSESSID";

const HEARTBEAT_PATH: &str = "/api/edge/heartbeat.json";

/// Client for one EdgeMAX device.
///
/// [`login`](Self::login) must be called and succeed before
/// [`stats`](Self::stats) or any other privileged call. This is a
/// documented precondition; nothing in the type system enforces it.
///
/// Cheap to clone: clones share the HTTP connection pool and cookie jar.
#[derive(Debug, Clone)]
pub struct EdgeMaxClient {
    http: reqwest::Client,
    base_url: Url,
    transport: TransportConfig,
    cookie_jar: Arc<Jar>,
}

impl EdgeMaxClient {
    /// Create a client for the device at `address`.
    ///
    /// Trailing slashes are stripped. If the transport config has no
    /// cookie jar, a fresh one is created (session auth needs it).
    pub fn new(address: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(address.trim_end_matches('/'))?;

        let transport = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = transport
            .cookie_jar
            .clone()
            .unwrap_or_else(|| Arc::new(Jar::default()));
        let http = transport.build_client()?;

        Ok(Self {
            http,
            base_url,
            transport,
            cookie_jar,
        })
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The transport settings the client was built from.
    pub fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    /// Authenticate against the device with username and password.
    ///
    /// Posts a form to the base URL; the device answers by setting the
    /// session cookie, which lands in the client's jar.
    ///
    /// The device reports no explicit login failure: a rejected login looks
    /// just like an accepted one until the first privileged call fails. Only
    /// transport errors surface here.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        debug!("logging in at {}", self.base_url);

        let resp = self
            .http
            .post(self.base_url.clone())
            .form(&[
                ("username", username),
                ("password", password.expose_secret()),
            ])
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() && !status.is_redirection() {
            // Not fatal: the status is not a reliable signal on this device.
            warn!(%status, "login returned unexpected HTTP status");
        }

        debug!("login request complete");
        Ok(())
    }

    /// Value of the named session cookie, read from the jar right now.
    pub fn cookie_value(&self, name: &str) -> Option<String> {
        let header = self.cookie_jar.cookies(&self.base_url)?;
        let header = header.to_str().ok()?;
        header.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_owned())
        })
    }

    /// The `PHPSESSID` session token, if login has set one.
    pub fn session_id(&self) -> Option<String> {
        self.cookie_value(DEFAULT_SESSION_COOKIE)
    }

    /// The full `Cookie` header for the device, for the websocket upgrade.
    pub fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookie_jar.cookies(&self.base_url)?;
        cookies.to_str().ok().map(String::from)
    }

    /// Build the heartbeat URL with the given cache-busting value.
    pub(crate) fn heartbeat_url(&self, cache_buster: i64) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{HEARTBEAT_PATH}?_={cache_buster}"))?)
    }

    /// Send one heartbeat request to keep the session alive.
    pub async fn heartbeat(&self, cache_buster: i64) -> Result<(), Error> {
        let url = self.heartbeat_url(cache_buster)?;
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "heartbeat returned unexpected HTTP status");
        }
        Ok(())
    }
}
