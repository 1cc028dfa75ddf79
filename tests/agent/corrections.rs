use crate::support::{
    Reply, ScriptedReasoner, accept, call, governor, search_registry, settings, single, x_schema,
};
use enricher::actions::SUBMIT_ACTION;
use enricher::agent::{AssistantTurn, LoopSettings, Outcome, Termination, Turn};
use enricher::error::LoopError;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn bundled_calls_are_corrected_without_spending_budget() {
    let reasoner = Arc::new(ScriptedReasoner::new(
        vec![
            Reply::Ready(AssistantTurn::with_calls(vec![
                call("a", "search", json!({"query": "acme"})),
                call("b", SUBMIT_ACTION, json!({"x": "early"})),
            ])),
            Reply::Ready(single("s1", SUBMIT_ACTION, json!({"x": "v"}))),
        ],
        vec![Reply::Ready(accept())],
    ));
    let outcome = governor(reasoner, search_registry(), settings(1))
        .run("acme", x_schema())
        .await
        .unwrap();

    // One iteration was enough: the malformed turn did not consume it.
    assert_eq!(outcome.terminated, Termination::Accepted);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.record, Some(json!({"x": "v"})));
    outcome.conversation.ensure_paired().unwrap();

    let corrective: Vec<_> = outcome
        .conversation
        .results()
        .filter(|result| result.call_id == "a" || result.call_id == "b")
        .collect();
    assert_eq!(corrective.len(), 2);
    assert!(corrective.iter().all(|result| {
        result.outcome == Outcome::Failure && result.content.contains("exactly one action")
    }));
}

#[tokio::test]
async fn empty_decision_gets_a_user_reminder() {
    let reasoner = Arc::new(ScriptedReasoner::new(
        vec![
            Reply::Ready(AssistantTurn {
                text: Some("I think I know the answer.".into()),
                action_calls: Vec::new(),
            }),
            Reply::Ready(single("s1", SUBMIT_ACTION, json!({"x": "v"}))),
        ],
        vec![Reply::Ready(accept())],
    ));
    let outcome = governor(reasoner, search_registry(), settings(2))
        .run("acme", x_schema())
        .await
        .unwrap();

    assert_eq!(outcome.terminated, Termination::Accepted);
    assert_eq!(outcome.iterations, 1);
    let turns = outcome.conversation.turns();
    assert!(matches!(&turns[1], Turn::Assistant(t) if t.action_calls.is_empty()));
    assert!(matches!(&turns[2], Turn::User { text } if text.contains(SUBMIT_ACTION)));
}

#[tokio::test]
async fn endless_violations_hit_the_correction_cap() {
    let reasoner = Arc::new(ScriptedReasoner::repeating(AssistantTurn::default()));
    let outcome = governor(reasoner, search_registry(), settings(3))
        .run("acme", x_schema())
        .await
        .unwrap();

    assert_eq!(outcome.terminated, Termination::CorrectionsExhausted);
    assert!(outcome.record.is_none());
    assert_eq!(outcome.iterations, 0);
    // Opening prompt plus one reminder per correction.
    assert_eq!(outcome.conversation.len(), 1 + 4);
}

#[tokio::test]
async fn slow_decision_is_a_correctable_violation() {
    let reasoner = Arc::new(ScriptedReasoner::new(
        vec![
            Reply::Hang,
            Reply::Ready(single("s1", SUBMIT_ACTION, json!({"x": "v"}))),
        ],
        vec![Reply::Ready(accept())],
    ));
    let settings = LoopSettings {
        decision_timeout: Duration::from_millis(50),
        ..settings(2)
    };
    let outcome = governor(reasoner, search_registry(), settings)
        .run("acme", x_schema())
        .await
        .unwrap();

    assert_eq!(outcome.terminated, Termination::Accepted);
    assert_eq!(outcome.iterations, 1);
    assert!(matches!(
        &outcome.conversation.turns()[1],
        Turn::User { text } if text.contains("decision timed out")
    ));
}

#[tokio::test]
async fn slow_judgment_ends_the_run_without_a_record() {
    let reasoner = Arc::new(ScriptedReasoner::new(
        vec![Reply::Ready(single("s1", SUBMIT_ACTION, json!({"x": "v"})))],
        vec![Reply::Hang],
    ));
    let settings = LoopSettings {
        judgment_timeout: Duration::from_millis(50),
        ..settings(3)
    };
    let outcome = governor(reasoner, search_registry(), settings)
        .run("acme", x_schema())
        .await
        .unwrap();

    assert_eq!(outcome.terminated, Termination::JudgmentUnavailable);
    assert!(outcome.record.is_none());
    outcome.conversation.ensure_paired().unwrap();
}

#[tokio::test]
async fn provider_failure_aborts_the_run() {
    let reasoner = Arc::new(ScriptedReasoner::new(vec![Reply::ProviderDown], Vec::new()));
    let err = governor(reasoner, search_registry(), settings(3))
        .run("acme", x_schema())
        .await
        .unwrap_err();

    assert!(matches!(err, LoopError::Reasoning(_)));
    assert!(format!("{err:#}").contains("connection refused"));
}
