use dealflow_core::{Deal, DealId, Task};
use serde::Deserialize;
use serde_json::Value;

use crate::FetchError;

/// URL layout and payload shapes of the CRM REST API (v4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmApi {
    scheme: String,
    page_size: u32,
}

impl CrmApi {
    pub fn new(scheme: impl Into<String>, page_size: u32) -> Self {
        Self {
            scheme: scheme.into(),
            page_size: page_size.max(1),
        }
    }

    pub fn leads_url(&self, domain: &str, page: u32) -> String {
        format!(
            "{}://{}/api/v4/leads?page={}&limit={}",
            self.scheme, domain, page, self.page_size
        )
    }

    pub fn tasks_url(&self, domain: &str, deal_id: DealId) -> String {
        format!(
            "{}://{}/api/v4/tasks?filter[entity_id]={}&filter[entity_type]=lead",
            self.scheme, domain, deal_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealsPage {
    pub deals: Vec<Deal>,
    pub has_next: bool,
}

#[derive(Debug, Default, Deserialize)]
struct LeadsPayload {
    #[serde(rename = "_embedded", default)]
    embedded: Option<LeadsEmbedded>,
    #[serde(rename = "_links", default)]
    links: Option<PageLinks>,
}

#[derive(Debug, Default, Deserialize)]
struct LeadsEmbedded {
    #[serde(default)]
    leads: Option<Vec<Deal>>,
}

#[derive(Debug, Default, Deserialize)]
struct PageLinks {
    #[serde(default)]
    next: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct TasksPayload {
    #[serde(rename = "_embedded", default)]
    embedded: Option<TasksEmbedded>,
}

#[derive(Debug, Default, Deserialize)]
struct TasksEmbedded {
    #[serde(default)]
    tasks: Option<Vec<Task>>,
}

/// A missing body or embed reads as an empty page.
pub fn decode_deals_page(body: Value) -> Result<DealsPage, FetchError> {
    if body.is_null() {
        return Ok(DealsPage {
            deals: Vec::new(),
            has_next: false,
        });
    }
    let payload: LeadsPayload =
        serde_json::from_value(body).map_err(|err| FetchError::Decode(err.to_string()))?;
    Ok(DealsPage {
        deals: payload
            .embedded
            .and_then(|embedded| embedded.leads)
            .unwrap_or_default(),
        has_next: payload
            .links
            .and_then(|links| links.next)
            .is_some_and(|next| !next.is_null()),
    })
}

/// A missing body or embed reads as no tasks.
pub fn decode_tasks(body: Value) -> Result<Vec<Task>, FetchError> {
    if body.is_null() {
        return Ok(Vec::new());
    }
    let payload: TasksPayload =
        serde_json::from_value(body).map_err(|err| FetchError::Decode(err.to_string()))?;
    Ok(payload
        .embedded
        .and_then(|embedded| embedded.tasks)
        .unwrap_or_default())
}
