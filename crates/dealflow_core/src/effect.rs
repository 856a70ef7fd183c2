use crate::{DealId, DealRow, TaskView};

/// Side effects requested by [`crate::update`]; executed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Cancel the in-flight task fetch and any delay owned by the previous session.
    ResetSession,
    /// Start draining the queue unless a drain is already running.
    ProcessQueue,
    /// Forward to the presentation layer.
    Emit(UiEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Render data and signals for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Full deal list redraw. `expanded` is the panel to keep open.
    DealsRendered {
        rows: Vec<DealRow>,
        expanded: Option<DealId>,
    },
    TasksLoading {
        deal_id: DealId,
    },
    TasksRendered {
        deal_id: DealId,
        tasks: Vec<TaskView>,
    },
    TaskRetryOffered {
        deal_id: DealId,
    },
    Message {
        text: String,
        severity: Severity,
    },
    MessageCleared,
    Loading(bool),
}

impl UiEvent {
    pub fn info(text: impl Into<String>) -> Self {
        UiEvent::Message {
            text: text.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        UiEvent::Message {
            text: text.into(),
            severity: Severity::Error,
        }
    }
}
