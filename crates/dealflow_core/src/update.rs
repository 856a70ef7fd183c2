use engine_logging::flow_info;

use crate::{Credential, Effect, Job, Msg, SessionState, UiEvent};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SessionState, msg: Msg) -> (SessionState, Vec<Effect>) {
    let effects = match msg {
        Msg::LoadRequested { domain, token } => {
            let domain = domain.trim();
            let token = token.trim();
            let credential =
                (!domain.is_empty() && !token.is_empty()).then(|| Credential::new(domain, token));

            // The previous session ends even if the new input is rejected.
            let was_loading = state.is_draining() || state.is_busy();
            state.reset(credential.clone());
            let mut effects = vec![
                Effect::ResetSession,
                Effect::Emit(UiEvent::MessageCleared),
                Effect::Emit(UiEvent::DealsRendered {
                    rows: Vec::new(),
                    expanded: None,
                }),
            ];

            match credential {
                None => {
                    effects.push(Effect::Emit(UiEvent::error("Please fill in all fields")));
                    // The discarded drain exits without reporting the end of loading.
                    if was_loading {
                        effects.push(Effect::Emit(UiEvent::Loading(false)));
                    }
                }
                Some(credential) => {
                    flow_info!("Load requested for domain {}", credential.domain);
                    let page = state.next_page();
                    state.enqueue(Job::DealsPage { credential, page });
                    effects.push(Effect::Emit(UiEvent::Loading(true)));
                    effects.push(Effect::ProcessQueue);
                }
            }
            effects
        }
        Msg::DealExpanded { deal_id } => {
            state.set_expanded(Some(deal_id));
            enqueue_tasks(&mut state, deal_id)
        }
        Msg::DealCollapsed => {
            state.set_expanded(None);
            Vec::new()
        }
        Msg::TaskRetryRequested { deal_id } => enqueue_tasks(&mut state, deal_id),
    };

    (state, effects)
}

fn enqueue_tasks(state: &mut SessionState, deal_id: crate::DealId) -> Vec<Effect> {
    if state.is_stopped() {
        return Vec::new();
    }
    let Some(credential) = state.credential().cloned() else {
        return Vec::new();
    };
    state.enqueue(Job::TasksForDeal {
        credential,
        deal_id,
    });
    vec![Effect::ProcessQueue]
}
