use thiserror::Error;

/// Outcome classes of a fetch, from a single request up to the retry layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Superseded or the session was reset. Never shown to the user.
    #[error("cancelled")]
    Cancelled,
    /// The per-request deadline fired before a response arrived.
    /// Cancellation class: it aborts failover and retries like [`FetchError::Cancelled`].
    #[error("request deadline elapsed")]
    DeadlineElapsed,
    #[error("http status {status}")]
    HttpStatus { status: u16 },
    /// Connect timeout reported by the HTTP client.
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("all relays failed: {}", describe_last(.last))]
    AllProxiesExhausted { last: Option<Box<FetchError>> },
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<FetchError> },
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            FetchError::Cancelled | FetchError::DeadlineElapsed => true,
            FetchError::AllProxiesExhausted { last: Some(last) } => last.is_cancelled(),
            FetchError::RetriesExhausted { last, .. } => last.is_cancelled(),
            _ => false,
        }
    }
}

fn describe_last(last: &Option<Box<FetchError>>) -> String {
    match last {
        Some(err) => err.to_string(),
        None => "no proxies available".to_string(),
    }
}
