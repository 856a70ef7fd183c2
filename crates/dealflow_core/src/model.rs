use std::fmt;

use serde::Deserialize;

pub type DealId = u64;

/// Bearer token plus the CRM domain it belongs to. Lives for one session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub domain: String,
    pub token: String,
}

impl Credential {
    pub fn new(domain: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            token: token.into(),
        }
    }
}

// The token must never reach the logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("domain", &self.domain)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// One unit of queued fetch work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    DealsPage { credential: Credential, page: u32 },
    TasksForDeal { credential: Credential, deal_id: DealId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    DealsPage,
    TasksForDeal,
}

impl Job {
    pub fn kind(&self) -> JobKind {
        match self {
            Job::DealsPage { .. } => JobKind::DealsPage,
            Job::TasksForDeal { .. } => JobKind::TasksForDeal,
        }
    }

    pub fn credential(&self) -> &Credential {
        match self {
            Job::DealsPage { credential, .. } | Job::TasksForDeal { credential, .. } => credential,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::DealsPage { page, .. } => write!(f, "deals page {page}"),
            Job::TasksForDeal { deal_id, .. } => write!(f, "tasks for deal {deal_id}"),
        }
    }
}

/// A lead as returned by `/api/v4/leads`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Deal {
    pub id: DealId,
    #[serde(default)]
    pub name: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// A task as returned by `/api/v4/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub text: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub complete_till: Option<i64>,
}
