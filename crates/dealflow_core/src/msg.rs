use crate::DealId;

/// Inbound actions from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked to (re)load deals for a domain with a bearer token.
    LoadRequested { domain: String, token: String },
    /// User opened a deal panel.
    DealExpanded { deal_id: DealId },
    /// User closed the open deal panel.
    DealCollapsed,
    /// User clicked the inline retry control of a deal's task panel.
    TaskRetryRequested { deal_id: DealId },
}
