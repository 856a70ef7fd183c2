use std::time::Duration;

use engine_logging::{flow_debug, flow_warn};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{FetchError, RelayFetcher, RelayPool};

/// Tries every relay once, in random order, until one returns a body.
///
/// Cancellation ends the walk at once. Otherwise the error of the last relay
/// tried is reported inside [`FetchError::AllProxiesExhausted`].
pub async fn fetch_via_relays(
    fetcher: &dyn RelayFetcher,
    relays: &RelayPool,
    target: &str,
    token: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Value, FetchError> {
    let mut last = None;

    for (index, url) in relays.attempt_order(target).into_iter().enumerate() {
        match fetcher.fetch_json(&url, token, timeout, cancel).await {
            Ok(body) => {
                flow_debug!("Relay attempt {} succeeded for {}", index + 1, target);
                return Ok(body);
            }
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => {
                flow_warn!("Relay attempt {} failed for {}: {}", index + 1, target, err);
                last = Some(Box::new(err));
            }
        }
    }

    Err(FetchError::AllProxiesExhausted { last })
}
