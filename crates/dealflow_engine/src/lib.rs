//! Dealflow engine: relay-routed fetching, retries and the job sequencer.
mod api;
mod config;
mod engine;
mod failover;
mod fetch;
mod relay;
mod retry;
mod sequencer;
mod types;

pub use api::{decode_deals_page, decode_tasks, CrmApi, DealsPage};
pub use config::{EngineConfig, DEFAULT_RELAYS};
pub use engine::{ChannelUiSink, EngineHandle, UiSink};
pub use failover::fetch_via_relays;
pub use fetch::{RelayFetcher, ReqwestFetcher};
pub use relay::{RelayPool, RelayTemplate};
pub use retry::{with_retry, RetryPolicy};
pub use sequencer::Sequencer;
pub use types::FetchError;
