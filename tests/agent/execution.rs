use crate::support::{BrokenAction, EchoAction, call};
use enricher::actions::{ActionRegistry, RunContext};
use enricher::agent::{AssistantTurn, ExecutionStage, Outcome, RunState, StateDelta, Turn};
use enricher::observability::{LogObserver, Observer};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn failing_and_succeeding_calls_keep_call_order() {
    let mut registry = ActionRegistry::new();
    registry.register(Box::new(BrokenAction));
    registry.register(Box::new(EchoAction("search")));
    let observer = Arc::new(LogObserver::new());
    let stage = ExecutionStage::new(
        Arc::new(registry),
        observer.clone(),
        2,
        Duration::from_secs(5),
    );

    let turn = AssistantTurn::with_calls(vec![
        call("first", "broken", json!({})),
        call("second", "search", json!({"query": "acme"})),
    ]);
    let ctx = Arc::new(RunContext::new("acme", crate::support::x_schema()));
    let delta = stage.execute(&turn, &ctx).await;

    let mut state = RunState::new("acme", crate::support::x_schema());
    state
        .apply(StateDelta::append(vec![Turn::Assistant(turn)]))
        .unwrap();
    state.apply(delta).unwrap();
    state.conversation().ensure_paired().unwrap();

    let results: Vec<_> = state.conversation().results().collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].call_id, "first");
    assert_eq!(results[0].outcome, Outcome::Failure);
    assert!(results[0].content.contains("upstream returned 503"));
    assert_eq!(results[1].call_id, "second");
    assert_eq!(results[1].outcome, Outcome::Success);
    assert!(results[1].content.starts_with("search results for"));
    assert_eq!(observer.events_recorded(), 2);
    assert_eq!(observer.name(), "log");
}

#[tokio::test]
async fn submit_is_never_executed_as_an_action() {
    let stage = ExecutionStage::new(
        Arc::new(ActionRegistry::new()),
        Arc::new(LogObserver::new()),
        1,
        Duration::from_secs(1),
    );
    let turn = AssistantTurn::with_calls(vec![call("s", "submit", json!({"x": "v"}))]);
    let ctx = Arc::new(RunContext::new("acme", crate::support::x_schema()));
    let delta = stage.execute(&turn, &ctx).await;

    assert!(matches!(
        &delta.turns[0],
        Turn::ActionResult(result)
            if result.outcome == Outcome::Failure && result.content == "Tool not found: submit"
    ));
}
