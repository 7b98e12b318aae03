// Read loop: websocket messages → topic envelope → typed stat channels.

use std::collections::HashMap;

use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::StatSinks;
use crate::codec::decode_frame;
use crate::stat::{DPI_TOPIC, INTERFACES_TOPIC, SYSTEM_TOPIC};

/// One decoded inbound message: topic name → undecoded payload.
pub type StatEnvelope = HashMap<String, serde_json::Value>;

/// Read until the stream fails or `cancel` fires.
///
/// Any read failure, close frame or end of stream cancels the shared token
/// so the keep-alive loop exits too.
pub(super) async fn read_loop<S>(mut stream: S, sinks: StatSinks, cancel: CancellationToken)
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("read loop cancelled");
                return;
            }
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => dispatch(text.as_bytes(), &sinks, &cancel).await,
            Some(Ok(Message::Binary(data))) => dispatch(&data, &sinks, &cancel).await,
            Some(Ok(Message::Close(frame))) => {
                if let Some(ref cf) = frame {
                    info!(code = %cf.code, reason = %cf.reason, "stats websocket closed by device");
                } else {
                    info!("stats websocket closed by device");
                }
                break;
            }
            Some(Ok(_)) => {
                // Ping, Pong, raw Frame: tungstenite answers pings itself
                trace!("stats websocket control frame");
            }
            Some(Err(e)) => {
                error!(error = %e, "stats websocket read failed");
                break;
            }
            None => {
                warn!("stats websocket stream ended");
                break;
            }
        }
    }

    cancel.cancel();
}

/// Decode one message and route each recognized topic to its channel.
async fn dispatch(data: &[u8], sinks: &StatSinks, cancel: &CancellationToken) {
    let envelope = match decode_frame::<StatEnvelope>(data) {
        Ok(Some(envelope)) => envelope,
        Ok(None) => {
            trace!("empty stats frame");
            return;
        }
        Err(e) => {
            warn!(error = %e, "failed to decode stats message");
            return;
        }
    };

    for (topic, payload) in envelope {
        match topic.as_str() {
            SYSTEM_TOPIC => forward(&topic, payload, &sinks.system, cancel).await,
            DPI_TOPIC => forward(&topic, payload, &sinks.dpi, cancel).await,
            INTERFACES_TOPIC => forward(&topic, payload, &sinks.interfaces, cancel).await,
            _ => trace!(topic = %topic, "skipping unrecognized topic"),
        }
    }
}

/// Decode a topic payload and send it, waiting for channel capacity.
///
/// A payload that fails to decode is dropped. The wait for capacity gives
/// way to cancellation, so a stalled consumer cannot hold up shutdown.
async fn forward<T: DeserializeOwned>(
    topic: &str,
    payload: serde_json::Value,
    tx: &mpsc::Sender<T>,
    cancel: &CancellationToken,
) {
    let stat = match serde_json::from_value::<T>(payload) {
        Ok(stat) => stat,
        Err(e) => {
            warn!(topic, error = %e, "failed to decode stat payload");
            return;
        }
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => {}
        result = tx.send(stat) => {
            if result.is_err() {
                warn!(topic, "stat receiver closed, dropping stat");
            }
        }
    }
}
