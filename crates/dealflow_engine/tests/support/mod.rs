#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use dealflow_core::UiEvent;
use dealflow_engine::{EngineConfig, FetchError, RelayFetcher, UiSink};
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

pub const RELAY: &str = "https://relay.test/?url=";
pub const DOMAIN: &str = "acme.example";

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// Single relay, millisecond delays.
pub fn fast_config() -> EngineConfig {
    EngineConfig {
        relays: vec![RELAY.to_string()],
        page_timeout: Duration::from_secs(2),
        task_timeout: Duration::from_secs(2),
        job_delay: Duration::from_millis(1),
        page_attempts: 3,
        page_backoff_step: Duration::from_millis(1),
        queue_backoff_step: Duration::from_millis(1),
        ..EngineConfig::default()
    }
}

pub fn leads_url(page: u32) -> String {
    format!("https://{DOMAIN}/api/v4/leads?page={page}&limit=2")
}

pub fn tasks_url(deal_id: u64) -> String {
    format!("https://{DOMAIN}/api/v4/tasks?filter[entity_id]={deal_id}&filter[entity_type]=lead")
}

pub fn leads_page(ids: &[u64], has_next: bool) -> Value {
    let leads: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "id": id, "name": format!("Deal {id}") }))
        .collect();
    let mut body = json!({ "_embedded": { "leads": leads }, "_links": {} });
    if has_next {
        body["_links"]["next"] = json!({ "href": "next" });
    }
    body
}

pub fn tasks_body(texts: &[&str]) -> Value {
    let tasks: Vec<Value> = texts.iter().map(|t| json!({ "text": t })).collect();
    json!({ "_embedded": { "tasks": tasks } })
}

/// Answers by target URL (relay prefix stripped). The last scripted answer
/// for a target repeats forever.
#[derive(Default)]
pub struct ScriptedFetcher {
    answers: Mutex<HashMap<String, VecDeque<Result<Value, FetchError>>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(&self, target: String, answer: Result<Value, FetchError>) {
        self.answers
            .lock()
            .unwrap()
            .entry(target)
            .or_default()
            .push_back(answer);
    }

    pub fn replace(&self, target: String, answer: Result<Value, FetchError>) {
        self.answers
            .lock()
            .unwrap()
            .insert(target, VecDeque::from([answer]));
    }

    /// Holds requests for `target` until the returned handle is notified.
    pub fn gate(&self, target: String) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(target, notify.clone());
        notify
    }

    pub fn calls_to(&self, target: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == target)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_answer(&self, target: &str) -> Result<Value, FetchError> {
        let mut answers = self.answers.lock().unwrap();
        match answers.get_mut(target) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or(Err(FetchError::HttpStatus { status: 404 })),
            None => Err(FetchError::HttpStatus { status: 404 }),
        }
    }
}

#[async_trait::async_trait]
impl RelayFetcher for ScriptedFetcher {
    async fn fetch_json(
        &self,
        url: &str,
        _token: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Value, FetchError> {
        let encoded = url.strip_prefix(RELAY).expect("relay prefix");
        let target = percent_decode_str(encoded)
            .decode_utf8()
            .expect("utf8 target")
            .into_owned();
        self.calls.lock().unwrap().push(target.clone());

        let gate = self.gates.lock().unwrap().get(&target).cloned();
        if let Some(gate) = gate {
            tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(timeout) => return Err(FetchError::DeadlineElapsed),
                _ = gate.notified() => {}
            }
        }
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        self.next_answer(&target)
    }
}

/// Records every event and lets tests wait for a particular one.
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<UiEvent>,
    seen: Mutex<Vec<UiEvent>>,
}

pub struct EventStream {
    rx: mpsc::UnboundedReceiver<UiEvent>,
}

impl RecordingSink {
    pub fn new() -> (Arc<Self>, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                tx,
                seen: Mutex::new(Vec::new()),
            }),
            EventStream { rx },
        )
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.seen.lock().unwrap().clone()
    }
}

impl UiSink for RecordingSink {
    fn emit(&self, event: UiEvent) {
        self.seen.lock().unwrap().push(event.clone());
        let _ = self.tx.send(event);
    }
}

impl EventStream {
    /// Waits (up to 5s) for an event matching `pred`; returns it.
    pub async fn wait_for(&mut self, pred: impl Fn(&UiEvent) -> bool) -> UiEvent {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(event) = self.rx.recv().await {
                if pred(&event) {
                    return event;
                }
            }
            panic!("event stream closed");
        })
        .await;
        waited.expect("timed out waiting for event")
    }

    pub async fn wait_idle(&mut self) {
        self.wait_for(|e| *e == UiEvent::Loading(false)).await;
    }
}
