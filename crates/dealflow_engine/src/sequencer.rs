use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Local;
use dealflow_core::{
    update, Credential, DealId, Effect, FailureDecision, Job, Msg, SessionState, UiEvent,
};
use engine_logging::{flow_debug, flow_error, flow_info, flow_warn};
use tokio_util::sync::CancellationToken;

use crate::api::{decode_deals_page, decode_tasks, CrmApi};
use crate::engine::UiSink;
use crate::failover::fetch_via_relays;
use crate::retry::{pause, with_retry};
use crate::{EngineConfig, FetchError, RelayFetcher, RelayPool};

/// Cancellation handles owned by the sequencer.
struct CancelSlots {
    /// Fires on session reset; parent of every token handed out below.
    session: CancellationToken,
    /// The one task fetch allowed to be in flight, tagged by issue number.
    tasks: Option<(u64, CancellationToken)>,
    issued: u64,
}

/// Drains the session's job queue one job at a time.
pub struct Sequencer {
    state: Mutex<SessionState>,
    slots: Mutex<CancelSlots>,
    fetcher: Arc<dyn RelayFetcher>,
    sink: Arc<dyn UiSink>,
    relays: RelayPool,
    api: CrmApi,
    config: EngineConfig,
}

impl Sequencer {
    pub fn new(
        config: EngineConfig,
        fetcher: Arc<dyn RelayFetcher>,
        sink: Arc<dyn UiSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SessionState::with_max_retries(config.max_retries)),
            slots: Mutex::new(CancelSlots {
                session: CancellationToken::new(),
                tasks: None,
                issued: 0,
            }),
            fetcher,
            sink,
            relays: RelayPool::new(config.relays.iter().cloned()),
            api: CrmApi::new(config.api_scheme.clone(), config.page_size),
            config,
        })
    }

    /// Snapshot of the session, for hosts and tests.
    pub fn snapshot(&self) -> SessionState {
        self.lock_state().clone()
    }

    /// Applies a UI action and runs the resulting effects.
    ///
    /// Must be called from within a tokio runtime: draining is spawned.
    pub fn dispatch(self: &Arc<Self>, msg: Msg) {
        let effects = {
            let mut guard = self.lock_state();
            let state = std::mem::take(&mut *guard);
            let (state, effects) = update(state, msg);
            *guard = state;
            effects
        };

        for effect in effects {
            match effect {
                Effect::ResetSession => self.reset_cancellation(),
                Effect::ProcessQueue => {
                    tokio::spawn(Arc::clone(self).process_queue());
                }
                Effect::Emit(event) => self.sink.emit(event),
            }
        }
    }

    /// Drains the queue until it is empty or the session stops.
    ///
    /// A no-op while another drain is running or a job is in flight. A drain
    /// whose session was reset underneath it exits without touching state.
    pub async fn process_queue(self: Arc<Self>) {
        let generation = {
            let mut state = self.lock_state();
            if !state.begin_drain() {
                return;
            }
            state.generation()
        };
        let session = self.session_token();

        loop {
            let (job, retry_count) = {
                let mut state = self.lock_state();
                if state.generation() != generation {
                    return;
                }
                match state.start_next_job() {
                    Some(job) => (job, state.retry_count()),
                    None => break,
                }
            };

            flow_info!("Running {} (retry_count={})", job, retry_count);
            let result = self.run_job(&job, generation, &session).await;

            let delay = {
                let mut state = self.lock_state();
                if state.generation() != generation {
                    return;
                }
                match result {
                    Ok(events) => {
                        state.complete_head();
                        drop(state);
                        self.emit_all(events);
                        self.config.job_delay
                    }
                    Err(err) => {
                        let cancelled = err.is_cancelled();
                        if !cancelled {
                            flow_warn!("{} failed: {}", job, err);
                        }
                        match state.record_failure() {
                            FailureDecision::Retry { retry_count } => {
                                self.config.queue_backoff(retry_count)
                            }
                            FailureDecision::Abandon { job } => {
                                flow_error!(
                                    "Abandoning {} after {} failures: {}",
                                    job,
                                    state.max_retries(),
                                    err
                                );
                                let events = state.abandon(&job, &err.to_string(), cancelled);
                                drop(state);
                                self.emit_all(events);
                                std::time::Duration::ZERO
                            }
                        }
                    }
                }
            };

            if pause(delay, &session).await.is_err() {
                flow_debug!("Drain of generation {} cancelled", generation);
                return;
            }
        }

        let events = {
            let mut state = self.lock_state();
            if state.generation() != generation {
                return;
            }
            state.finish_drain()
        };
        self.emit_all(events);
    }

    async fn run_job(
        &self,
        job: &Job,
        generation: u64,
        session: &CancellationToken,
    ) -> Result<Vec<UiEvent>, FetchError> {
        match job {
            Job::DealsPage { credential, page } => {
                self.run_deals_page(credential, *page, generation, session)
                    .await
            }
            Job::TasksForDeal {
                credential,
                deal_id,
            } => {
                self.run_tasks(credential, *deal_id, generation, session)
                    .await
            }
        }
    }

    async fn run_deals_page(
        &self,
        credential: &Credential,
        page: u32,
        generation: u64,
        session: &CancellationToken,
    ) -> Result<Vec<UiEvent>, FetchError> {
        let target = self.api.leads_url(&credential.domain, page);
        let description = format!("deals page {page}");

        let fetcher = self.fetcher.as_ref();
        let relays = &self.relays;
        let (target_ref, token, timeout) = (
            target.as_str(),
            credential.token.as_str(),
            self.config.page_timeout,
        );
        let body = with_retry(self.config.page_retry(), session, &description, move || {
            fetch_via_relays(fetcher, relays, target_ref, token, timeout, session)
        })
        .await?;
        let page_data = decode_deals_page(body)?;

        let mut state = self.lock_state();
        if state.generation() != generation {
            return Ok(Vec::new());
        }
        Ok(state.apply_deals_page(page_data.deals, page_data.has_next))
    }

    async fn run_tasks(
        &self,
        credential: &Credential,
        deal_id: DealId,
        generation: u64,
        session: &CancellationToken,
    ) -> Result<Vec<UiEvent>, FetchError> {
        let listed = self.lock_state().has_deal(deal_id);
        if !listed {
            flow_debug!("Skipping tasks for deal {} not in the list", deal_id);
            return Ok(Vec::new());
        }
        self.sink.emit(UiEvent::TasksLoading { deal_id });

        let (ticket, cancel) = self.replace_task_token(session);
        let target = self.api.tasks_url(&credential.domain, deal_id);
        let result = fetch_via_relays(
            self.fetcher.as_ref(),
            &self.relays,
            &target,
            &credential.token,
            self.config.task_timeout,
            &cancel,
        )
        .await;
        self.release_task_token(ticket);
        if matches!(result, Err(FetchError::DeadlineElapsed)) {
            flow_warn!("Tasks for deal {} timed out", deal_id);
        }

        let state = self.lock_state();
        if state.generation() != generation || !state.is_expanded(deal_id) {
            // Another panel was opened (or the session reset) meanwhile.
            flow_debug!("Dropping task result for deal {}", deal_id);
            return Ok(Vec::new());
        }
        let tasks = decode_tasks(result?)?;
        Ok(state.apply_tasks(deal_id, &tasks, &Local::now()))
    }

    /// Cancels the previous task fetch, if any, and installs a fresh token.
    fn replace_task_token(&self, session: &CancellationToken) -> (u64, CancellationToken) {
        let mut slots = self.lock_slots();
        if let Some((ticket, previous)) = slots.tasks.take() {
            flow_debug!("Cancelling task fetch #{}", ticket);
            previous.cancel();
        }
        slots.issued += 1;
        let ticket = slots.issued;
        let token = session.child_token();
        slots.tasks = Some((ticket, token.clone()));
        (ticket, token)
    }

    fn release_task_token(&self, ticket: u64) {
        let mut slots = self.lock_slots();
        if slots.tasks.as_ref().is_some_and(|(current, _)| *current == ticket) {
            slots.tasks = None;
        }
    }

    fn reset_cancellation(&self) {
        let mut slots = self.lock_slots();
        if let Some((_, tasks)) = slots.tasks.take() {
            tasks.cancel();
        }
        slots.session.cancel();
        slots.session = CancellationToken::new();
    }

    fn session_token(&self) -> CancellationToken {
        self.lock_slots().session.clone()
    }

    fn emit_all(&self, events: Vec<UiEvent>) {
        for event in events {
            self.sink.emit(event);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_slots(&self) -> MutexGuard<'_, CancelSlots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
