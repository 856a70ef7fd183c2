mod support;

use std::time::{Duration, Instant};

use dealflow_core::{Msg, UiEvent};
use dealflow_engine::EngineHandle;
use support::*;

#[test]
fn handle_runs_a_load_on_its_own_thread() {
    init_logging();
    let fetcher = ScriptedFetcher::new();
    fetcher.answer(leads_url(1), Ok(leads_page(&[11, 12], false)));
    let engine = EngineHandle::with_fetcher(fast_config(), fetcher.clone());

    engine.send(Msg::LoadRequested {
        domain: DOMAIN.to_string(),
        token: "token".to_string(),
    });

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut received = Vec::new();
    while Instant::now() < deadline {
        match engine.recv_timeout(Duration::from_millis(50)) {
            Some(UiEvent::Loading(false)) => break,
            Some(event) => received.push(event),
            None => {}
        }
    }

    assert!(received.contains(&UiEvent::Loading(true)));
    assert!(received.contains(&UiEvent::info("Loaded 2 deals")));
    assert_eq!(fetcher.total_calls(), 1);
}
