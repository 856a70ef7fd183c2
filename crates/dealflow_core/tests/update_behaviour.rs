use std::sync::Once;

use dealflow_core::{update, Credential, Effect, Job, JobKind, Msg, SessionState, UiEvent};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn load(state: SessionState, domain: &str, token: &str) -> (SessionState, Vec<Effect>) {
    update(
        state,
        Msg::LoadRequested {
            domain: domain.to_string(),
            token: token.to_string(),
        },
    )
}

#[test]
fn load_trims_input_and_queues_first_page() {
    init_logging();
    let (state, effects) = load(SessionState::new(), "  acme.amocrm.ru ", " secret\n");

    assert_eq!(
        state.credential(),
        Some(&Credential::new("acme.amocrm.ru", "secret"))
    );
    assert_eq!(
        state.queue().front(),
        Some(&Job::DealsPage {
            credential: Credential::new("acme.amocrm.ru", "secret"),
            page: 1,
        })
    );
    assert_eq!(
        effects,
        vec![
            Effect::ResetSession,
            Effect::Emit(UiEvent::MessageCleared),
            Effect::Emit(UiEvent::DealsRendered {
                rows: Vec::new(),
                expanded: None,
            }),
            Effect::Emit(UiEvent::Loading(true)),
            Effect::ProcessQueue,
        ]
    );
}

#[test]
fn load_with_blank_fields_reports_error_and_queues_nothing() {
    init_logging();
    let (state, effects) = load(SessionState::new(), "acme.amocrm.ru", "   ");

    assert!(state.queue().is_empty());
    assert!(state.credential().is_none());
    assert!(effects.contains(&Effect::Emit(UiEvent::error("Please fill in all fields"))));
    assert!(!effects.contains(&Effect::ProcessQueue));
}

#[test]
fn reload_discards_previous_session() {
    init_logging();
    let (state, _) = load(SessionState::new(), "a.example", "t1");
    let (mut state, _) = update(state, Msg::DealExpanded { deal_id: 7 });
    state.ingest_deals(vec![dealflow_core::Deal {
        id: 7,
        name: None,
        created_at: None,
    }]);
    let generation = state.generation();

    let (state, effects) = load(state, "b.example", "t2");

    assert_eq!(state.generation(), generation + 1);
    assert!(state.deals().is_empty());
    assert_eq!(state.expanded(), None);
    assert_eq!(state.queue().len(), 1);
    assert_eq!(state.queued(JobKind::TasksForDeal), 0);
    assert_eq!(effects[0], Effect::ResetSession);
}

#[test]
fn expand_sets_panel_and_queues_task_fetch() {
    init_logging();
    let (state, _) = load(SessionState::new(), "a.example", "t");
    let (state, effects) = update(state, Msg::DealExpanded { deal_id: 42 });

    assert_eq!(state.expanded(), Some(42));
    assert_eq!(state.queued(JobKind::TasksForDeal), 1);
    assert_eq!(effects, vec![Effect::ProcessQueue]);
}

#[test]
fn collapse_clears_panel_without_work() {
    init_logging();
    let (state, _) = load(SessionState::new(), "a.example", "t");
    let (state, _) = update(state, Msg::DealExpanded { deal_id: 42 });
    let queued = state.queue().len();

    let (state, effects) = update(state, Msg::DealCollapsed);

    assert_eq!(state.expanded(), None);
    assert_eq!(state.queue().len(), queued);
    assert!(effects.is_empty());
}

#[test]
fn retry_queues_task_fetch_and_forces_drain() {
    init_logging();
    let (state, _) = load(SessionState::new(), "a.example", "t");
    let (state, effects) = update(state, Msg::TaskRetryRequested { deal_id: 3 });

    assert_eq!(
        state.queue().back(),
        Some(&Job::TasksForDeal {
            credential: Credential::new("a.example", "t"),
            deal_id: 3,
        })
    );
    assert_eq!(effects, vec![Effect::ProcessQueue]);
}

#[test]
fn expand_before_any_load_is_ignored() {
    init_logging();
    let (state, effects) = update(SessionState::new(), Msg::DealExpanded { deal_id: 1 });

    assert!(state.queue().is_empty());
    assert!(effects.is_empty());
}

#[test]
fn rejected_reload_during_drain_ends_loading() {
    init_logging();
    let (mut state, _) = load(SessionState::new(), "acme.amocrm.ru", "secret");
    assert!(state.begin_drain());
    assert!(state.start_next_job().is_some());

    let (state, effects) = load(state, " ", "secret");

    assert!(!state.is_draining());
    assert!(!state.is_busy());
    assert_eq!(
        effects.last(),
        Some(&Effect::Emit(UiEvent::Loading(false)))
    );
}

#[test]
fn rejected_load_while_idle_leaves_loading_alone() {
    init_logging();
    let (_, effects) = load(SessionState::new(), "", "");

    assert!(!effects
        .iter()
        .any(|e| matches!(e, Effect::Emit(UiEvent::Loading(_)))));
}

#[test]
fn credential_debug_hides_token() {
    let rendered = format!("{:?}", Credential::new("a.example", "super-secret"));
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("a.example"));
}
