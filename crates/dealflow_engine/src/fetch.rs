use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::FetchError;

const REQUESTED_WITH: &str = "X-Requested-With";

/// One timed, cancellable GET through an already relay-wrapped URL.
#[async_trait::async_trait]
pub trait RelayFetcher: Send + Sync {
    /// Returns the parsed JSON body; an empty body yields `Value::Null`.
    ///
    /// Must resolve to [`FetchError::Cancelled`] promptly once `cancel` fires,
    /// and to [`FetchError::DeadlineElapsed`] when `timeout` elapses first.
    async fn fetch_json(
        &self,
        url: &str,
        token: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Value, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(connect_timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        Ok(Self { client })
    }

    async fn get_json(&self, url: &str, token: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .header(REQUESTED_WITH, "XMLHttpRequest")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        decode_json(&body)
    }
}

#[async_trait::async_trait]
impl RelayFetcher for ReqwestFetcher {
    async fn fetch_json(
        &self,
        url: &str,
        token: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Value, FetchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = tokio::time::timeout(timeout, self.get_json(url, token)) => {
                result.unwrap_or(Err(FetchError::DeadlineElapsed))
            }
        }
    }
}

pub(crate) fn decode_json(body: &[u8]) -> Result<Value, FetchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|err| FetchError::Decode(err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout;
    }
    FetchError::Transport(err.to_string())
}
