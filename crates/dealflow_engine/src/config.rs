use std::time::Duration;

use crate::RetryPolicy;

/// Public CORS relays the client rotates through.
pub const DEFAULT_RELAYS: [&str; 4] = [
    "https://corsproxy.io/?",
    "https://api.codetabs.com/v1/proxy/?quest=",
    "https://cors-anywhere.herokuapp.com/",
    "https://thingproxy.freeboard.io/fetch/",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub relays: Vec<String>,
    pub api_scheme: String,
    /// Deals requested per page.
    pub page_size: u32,
    /// Per relay attempt of a deals page.
    pub page_timeout: Duration,
    /// Per relay attempt of a task fetch.
    pub task_timeout: Duration,
    pub connect_timeout: Duration,
    /// Courtesy pause after every successful job.
    pub job_delay: Duration,
    pub page_attempts: u32,
    pub page_backoff_step: Duration,
    pub queue_backoff_step: Duration,
    /// Consecutive failures before the queue abandons its head job.
    pub max_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            relays: DEFAULT_RELAYS.iter().map(|r| r.to_string()).collect(),
            api_scheme: "https".to_string(),
            page_size: 2,
            page_timeout: Duration::from_secs(15),
            task_timeout: Duration::from_secs(20),
            connect_timeout: Duration::from_secs(10),
            job_delay: Duration::from_millis(1000),
            page_attempts: 3,
            page_backoff_step: Duration::from_millis(1000),
            queue_backoff_step: Duration::from_millis(2000),
            max_retries: dealflow_core::DEFAULT_MAX_RETRIES,
        }
    }
}

impl EngineConfig {
    pub fn page_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.page_attempts, self.page_backoff_step)
    }

    /// Queue backoff after the `retry_count`-th consecutive failure.
    pub fn queue_backoff(&self, retry_count: u32) -> Duration {
        self.queue_backoff_step * retry_count
    }
}
