use crate::support::{
    Reply, ScriptedReasoner, accept, governor, reject, search_registry, settings, single,
    x_schema,
};
use enricher::agent::{Outcome, Termination, Turn};
use enricher::actions::SUBMIT_ACTION;
use serde_json::json;
use std::sync::Arc;

fn result_turns(turns: &[Turn]) -> Vec<(&str, &str, Outcome)> {
    turns
        .iter()
        .filter_map(|turn| match turn {
            Turn::ActionResult(result) => Some((
                result.action_name.as_str(),
                result.content.as_str(),
                result.outcome,
            )),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn search_forever_exhausts_the_budget_without_a_record() {
    let reasoner = Arc::new(ScriptedReasoner::repeating(single(
        "c1",
        "search",
        json!({"query": "acme"}),
    )));
    let outcome = governor(reasoner, search_registry(), settings(3))
        .run("acme", x_schema())
        .await
        .unwrap();

    assert_eq!(outcome.terminated, Termination::BudgetExhausted);
    assert!(outcome.record.is_none());
    assert_eq!(outcome.iterations, 3);
    // Opening prompt plus three decision/result pairs.
    assert_eq!(outcome.conversation.len(), 7);
    assert!(matches!(outcome.conversation.turns()[0], Turn::User { .. }));
    outcome.conversation.ensure_paired().unwrap();
    let results = result_turns(outcome.conversation.turns());
    assert!(results.iter().all(|(_, _, o)| *o == Outcome::Success));
}

#[tokio::test]
async fn accepted_first_submission_ends_after_one_iteration() {
    let reasoner = Arc::new(ScriptedReasoner::new(
        vec![Reply::Ready(single("s1", SUBMIT_ACTION, json!({"x": "v"})))],
        vec![Reply::Ready(accept())],
    ));
    let outcome = governor(reasoner.clone(), search_registry(), settings(5))
        .run("acme", x_schema())
        .await
        .unwrap();

    assert_eq!(outcome.terminated, Termination::Accepted);
    assert_eq!(outcome.record, Some(json!({"x": "v"})));
    assert_eq!(outcome.iterations, 1);
    let results = result_turns(outcome.conversation.turns());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, SUBMIT_ACTION);
    assert_eq!(results[0].2, Outcome::Success);
    assert!(results[0].1.contains("every field is sourced"));
    // The judge only saw the opening prompt, not the submitting turn.
    assert_eq!(reasoner.judged_views(), vec![1]);
}

#[tokio::test]
async fn rejected_then_accepted_keeps_only_the_second_record() {
    let reasoner = Arc::new(ScriptedReasoner::new(
        vec![
            Reply::Ready(single("s1", SUBMIT_ACTION, json!({"x": "bad"}))),
            Reply::Ready(single("s2", SUBMIT_ACTION, json!({"x": "good"}))),
        ],
        vec![
            Reply::Ready(reject("x must come from the annual report")),
            Reply::Ready(accept()),
        ],
    ));
    let outcome = governor(reasoner.clone(), search_registry(), settings(5))
        .run("acme", x_schema())
        .await
        .unwrap();

    assert_eq!(outcome.terminated, Termination::Accepted);
    assert_eq!(outcome.record, Some(json!({"x": "good"})));
    assert_eq!(outcome.iterations, 2);
    let results = result_turns(outcome.conversation.turns());
    assert_eq!(
        results[0],
        (
            SUBMIT_ACTION,
            "Unsatisfactory response:\nx must come from the annual report",
            Outcome::Failure
        )
    );
    assert_eq!(results[1].2, Outcome::Success);
    // Second review sees the first submission and its rejection.
    assert_eq!(reasoner.judged_views(), vec![1, 3]);
}

#[tokio::test]
async fn rejection_on_the_last_iteration_leaves_no_record() {
    let reasoner = Arc::new(ScriptedReasoner::new(
        vec![Reply::Ready(single("s1", SUBMIT_ACTION, json!({"x": "close"})))],
        vec![Reply::Ready(reject("not yet"))],
    ));
    let outcome = governor(reasoner, search_registry(), settings(1))
        .run("acme", x_schema())
        .await
        .unwrap();

    assert_eq!(outcome.terminated, Termination::BudgetExhausted);
    assert!(outcome.record.is_none());
    assert_eq!(outcome.iterations, 1);
    outcome.conversation.ensure_paired().unwrap();
}

#[tokio::test]
async fn schema_invalid_submission_is_rejected_without_a_review() {
    let reasoner = Arc::new(ScriptedReasoner::new(
        vec![
            Reply::Ready(single("s1", SUBMIT_ACTION, json!({"y": 1}))),
            Reply::Ready(single("s2", SUBMIT_ACTION, json!({"x": "v"}))),
        ],
        vec![Reply::Ready(accept())],
    ));
    let outcome = governor(reasoner.clone(), search_registry(), settings(4))
        .run("acme", x_schema())
        .await
        .unwrap();

    assert_eq!(outcome.terminated, Termination::Accepted);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(reasoner.judged_views().len(), 1);
    let results = result_turns(outcome.conversation.turns());
    assert!(results[0].1.contains("does not match the target schema"));
}

#[tokio::test]
async fn research_then_submit_interleaves_results() {
    let reasoner = Arc::new(ScriptedReasoner::new(
        vec![
            Reply::Ready(single("c1", "search", json!({"query": "acme founded"}))),
            Reply::Ready(single("s1", SUBMIT_ACTION, json!({"x": "1990"}))),
        ],
        vec![Reply::Ready(accept())],
    ));
    let outcome = governor(reasoner.clone(), search_registry(), settings(4))
        .run("acme", x_schema())
        .await
        .unwrap();

    assert_eq!(outcome.record, Some(json!({"x": "1990"})));
    assert_eq!(outcome.iterations, 2);
    let kinds: Vec<&str> = outcome
        .conversation
        .turns()
        .iter()
        .map(|turn| match turn {
            Turn::User { .. } => "user",
            Turn::Assistant(_) => "assistant",
            Turn::ActionResult(_) => "result",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["user", "assistant", "result", "assistant", "result"]
    );
    assert_eq!(reasoner.judged_views(), vec![3]);
}
