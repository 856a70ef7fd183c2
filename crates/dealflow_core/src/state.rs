use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Local, TimeZone};
use engine_logging::{flow_debug, flow_info};

use crate::view_model::{build_deal_rows, build_task_views};
use crate::{Credential, Deal, DealId, Job, JobKind, Task, UiEvent};

/// Consecutive failures after which the head job is abandoned.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// What the sequencer should do after the head job failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureDecision {
    /// Keep the job at the head and try again after a backoff scaled by `retry_count`.
    Retry { retry_count: u32 },
    /// The job was popped; the retry budget is spent.
    Abandon { job: Job },
}

/// State of one load session.
///
/// Mutated only by [`crate::update`] and by the engine's sequencer, never
/// concurrently: the sequencer runs at most one job at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    generation: u64,
    credential: Option<Credential>,
    deals: Vec<Deal>,
    seen_ids: HashSet<DealId>,
    next_page: u32,
    last_page: bool,
    stopped: bool,
    expanded: Option<DealId>,
    queue: VecDeque<Job>,
    draining: bool,
    busy: bool,
    retry_count: u32,
    max_retries: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::with_max_retries(DEFAULT_MAX_RETRIES)
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            generation: 0,
            credential: None,
            deals: Vec::new(),
            seen_ids: HashSet::new(),
            next_page: 1,
            last_page: false,
            stopped: false,
            expanded: None,
            queue: VecDeque::new(),
            draining: false,
            busy: false,
            retry_count: 0,
            max_retries: max_retries.max(1),
        }
    }

    /// Drops everything accumulated so far and starts a new session.
    ///
    /// Queued jobs are discarded without going through retry accounting.
    pub fn reset(&mut self, credential: Option<Credential>) {
        let generation = self.generation + 1;
        flow_info!(
            "Session reset generation={} discarded_jobs={}",
            generation,
            self.queue.len()
        );
        *self = Self {
            generation,
            credential,
            ..Self::with_max_retries(self.max_retries)
        };
    }

    /// Bumped by every [`SessionState::reset`]; lets async work detect that it outlived its session.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    pub fn is_last_page(&self) -> bool {
        self.last_page
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn expanded(&self) -> Option<DealId> {
        self.expanded
    }

    pub fn set_expanded(&mut self, deal_id: Option<DealId>) {
        self.expanded = deal_id;
    }

    pub fn is_expanded(&self, deal_id: DealId) -> bool {
        self.expanded == Some(deal_id)
    }

    pub fn has_deal(&self, deal_id: DealId) -> bool {
        self.seen_ids.contains(&deal_id)
    }

    pub fn queue(&self) -> &VecDeque<Job> {
        &self.queue
    }

    pub fn is_draining(&self) -> bool {
        self.draining
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn enqueue(&mut self, job: Job) {
        flow_debug!("Enqueue {} (queue_len={})", job, self.queue.len() + 1);
        self.queue.push_back(job);
    }

    /// Claims the drain loop. Returns `false` when a drain is already running
    /// or a job is in flight, in which case the caller must not drain.
    pub fn begin_drain(&mut self) -> bool {
        if self.draining || self.busy {
            return false;
        }
        self.draining = true;
        true
    }

    /// Peeks the head job and marks it busy. `None` ends the drain.
    pub fn start_next_job(&mut self) -> Option<Job> {
        if self.stopped {
            return None;
        }
        let job = self.queue.front().cloned()?;
        self.busy = true;
        Some(job)
    }

    /// Releases the drain loop and reports the end of the loading phase.
    pub fn finish_drain(&mut self) -> Vec<UiEvent> {
        self.draining = false;
        self.busy = false;
        vec![UiEvent::Loading(false)]
    }

    /// Pops the head job after it succeeded.
    pub fn complete_head(&mut self) -> Option<Job> {
        self.busy = false;
        self.retry_count = 0;
        self.queue.pop_front()
    }

    /// Accounts a failure of the head job.
    pub fn record_failure(&mut self) -> FailureDecision {
        self.busy = false;
        self.retry_count += 1;
        if self.retry_count < self.max_retries {
            return FailureDecision::Retry {
                retry_count: self.retry_count,
            };
        }
        self.retry_count = 0;
        match self.queue.pop_front() {
            Some(job) => FailureDecision::Abandon { job },
            // Only reachable if the queue was cleared underneath the job.
            None => FailureDecision::Retry { retry_count: 0 },
        }
    }

    /// UI signals for a job the sequencer gave up on.
    ///
    /// A deals page ends the session with an error message unless the failure
    /// was a cancellation; a task job offers an inline retry for its deal.
    pub fn abandon(&mut self, job: &Job, error: &str, cancelled: bool) -> Vec<UiEvent> {
        match job {
            Job::DealsPage { .. } => {
                self.stopped = true;
                if cancelled {
                    Vec::new()
                } else {
                    vec![UiEvent::error(format!("Error: {error}"))]
                }
            }
            Job::TasksForDeal { deal_id, .. } => {
                if self.has_deal(*deal_id) {
                    vec![UiEvent::TaskRetryOffered { deal_id: *deal_id }]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Applies one successfully fetched deals page.
    pub fn apply_deals_page(&mut self, deals: Vec<Deal>, has_next: bool) -> Vec<UiEvent> {
        if deals.is_empty() {
            return self.mark_last_page();
        }

        let mut events = self.ingest_deals(deals);
        self.next_page += 1;

        if has_next {
            if let Some(credential) = self.credential.clone() {
                self.enqueue(Job::DealsPage {
                    credential,
                    page: self.next_page,
                });
            }
        } else {
            events.extend(self.mark_last_page());
        }
        events
    }

    /// Appends unseen deals in server order and redraws the list if anything was added.
    pub fn ingest_deals(&mut self, deals: Vec<Deal>) -> Vec<UiEvent> {
        let before = self.deals.len();
        for deal in deals {
            if self.seen_ids.insert(deal.id) {
                self.deals.push(deal);
            }
        }
        let added = self.deals.len() - before;
        flow_debug!("Ingested {} new deals (total {})", added, self.deals.len());
        if added == 0 {
            return Vec::new();
        }
        self.rerender()
    }

    fn rerender(&mut self) -> Vec<UiEvent> {
        let expanded = self.expanded.filter(|id| self.seen_ids.contains(id));
        self.expanded = expanded;

        let events = vec![UiEvent::DealsRendered {
            rows: build_deal_rows(&self.deals, &Local),
            expanded,
        }];

        // The redraw empties every task panel; refill the open one.
        if let (Some(deal_id), Some(credential)) = (expanded, self.credential.clone()) {
            self.enqueue(Job::TasksForDeal {
                credential,
                deal_id,
            });
        }
        events
    }

    fn mark_last_page(&mut self) -> Vec<UiEvent> {
        if self.last_page {
            return Vec::new();
        }
        self.last_page = true;
        flow_info!("All deals loaded: {}", self.deals.len());
        vec![UiEvent::info(format!("Loaded {} deals", self.deals.len()))]
    }

    /// Task render data for `deal_id`, or nothing if another panel was opened meanwhile.
    pub fn apply_tasks<Tz: TimeZone>(
        &self,
        deal_id: DealId,
        tasks: &[Task],
        now: &DateTime<Tz>,
    ) -> Vec<UiEvent>
    where
        Tz::Offset: std::fmt::Display,
    {
        if !self.is_expanded(deal_id) {
            flow_debug!("Discarding stale tasks for deal {}", deal_id);
            return Vec::new();
        }
        vec![UiEvent::TasksRendered {
            deal_id,
            tasks: build_task_views(tasks, now),
        }]
    }

    /// Counts of queued jobs by kind, for diagnostics and tests.
    pub fn queued(&self, kind: JobKind) -> usize {
        self.queue.iter().filter(|job| job.kind() == kind).count()
    }
}
