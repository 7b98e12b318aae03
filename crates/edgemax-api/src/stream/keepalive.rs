// Keep-alive loop: periodic heartbeat requests while streaming.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::EdgeMaxClient;

/// Send a heartbeat every `interval` until `cancel` fires.
///
/// Request failures are logged and never end the loop. Cancellation wins
/// over both the in-flight request and the wait, including on the first
/// iteration.
pub(super) async fn keep_alive(
    client: EdgeMaxClient,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut last = 0_i64;

    loop {
        let cache_buster = next_cache_buster(&mut last);

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = client.heartbeat(cache_buster) => {
                if let Err(e) = result {
                    warn!(error = %e, "heartbeat request failed");
                }
            }
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }

    debug!("keep-alive loop exiting");
}

/// Current time in nanoseconds, bumped if needed so that consecutive
/// values are strictly increasing.
fn next_cache_buster(last: &mut i64) -> i64 {
    let now = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(*last);
    let next = now.max(last.saturating_add(1));
    *last = next;
    next
}
