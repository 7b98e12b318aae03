//! Hybrid frame codec for the EdgeMAX stats websocket.
//!
//! Outbound control messages are always framed as
//! `"<decimal-length>\n<json-body>"`. Inbound messages arrive either framed
//! the same way or as a bare JSON object, sometimes on the same connection,
//! so [`decode_frame`] accepts both.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A named telemetry stream, as it appears in subscribe requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Subscription control message sent right after the websocket opens.
///
/// `None` lists serialize as `null`, which is what the appliance expects
/// for an absent subscribe or unsubscribe set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    #[serde(rename = "SUBSCRIBE")]
    pub subscribe: Option<Vec<Topic>>,
    #[serde(rename = "UNSUBSCRIBE")]
    pub unsubscribe: Option<Vec<Topic>>,
    #[serde(rename = "SESSION_ID")]
    pub session_id: String,
}

/// Serialize `message` and prefix it with its byte length and a newline.
pub fn encode_frame<T: Serialize>(message: &T) -> Result<String, Error> {
    let body = serde_json::to_string(message)?;
    Ok(format!("{}\n{body}", body.len()))
}

/// Decode one inbound message, framed or bare.
///
/// Returns `Ok(None)` for a framed message with an empty body, which the
/// appliance sends as a keep-alive. The length prefix is not checked
/// against the body.
pub fn decode_frame<T: DeserializeOwned>(data: &[u8]) -> Result<Option<T>, Error> {
    if data.first() == Some(&b'{') {
        return Ok(Some(serde_json::from_slice(data)?));
    }

    let parts: Vec<&[u8]> = data.splitn(2, |&b| b == b'\n').collect();
    let [_, body] = parts.as_slice() else {
        return Err(Error::Frame { parts: parts.len() });
    };

    if body.is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_slice(body)?))
}
