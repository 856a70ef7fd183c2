use std::future::Future;
use std::time::Duration;

use engine_logging::flow_warn;
use tokio_util::sync::CancellationToken;

use crate::FetchError;

/// Bounded attempts with linear backoff: `step`, `2 * step`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub step: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            step,
        }
    }

    /// Wait after the `attempt`-th failure (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.step * attempt
    }
}

/// Runs `op` until it succeeds or `policy.max_attempts` tries have failed.
///
/// Cancellation is returned as-is and never consumes an attempt; the backoff
/// sleeps end early with [`FetchError::Cancelled`] when `cancel` fires.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    description: &str,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => err,
        };

        flow_warn!(
            "Attempt {}/{} failed ({}): {}",
            attempt,
            attempts,
            description,
            err
        );
        if attempt >= attempts {
            return Err(FetchError::RetriesExhausted {
                attempts,
                last: Box::new(err),
            });
        }
        pause(policy.delay_after(attempt), cancel).await?;
        attempt += 1;
    }
}

/// Sleeps for `delay` unless `cancel` fires first.
pub(crate) async fn pause(delay: Duration, cancel: &CancellationToken) -> Result<(), FetchError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
