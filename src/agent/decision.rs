use super::conversation::{AssistantTurn, Turn};
use super::reasoner::{ActionMode, DecisionRequest, Reasoner, ReasoningError};
use super::state::{CandidateUpdate, RunState, StateDelta};
use crate::actions::{ActionSpec, SUBMIT_ACTION};
use crate::error::LoopError;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Ways a decision can break the one-action-per-turn contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    NoAction,
    MultipleActions(usize),
    /// `submit` arrived together with other calls.
    SubmitBundled(usize),
    /// The reasoning capability did not answer in time.
    TimedOut,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAction => write!(f, "no action chosen"),
            Self::MultipleActions(n) => write!(f, "{n} actions chosen"),
            Self::SubmitBundled(n) => write!(f, "submit bundled with {} other actions", n - 1),
            Self::TimedOut => write!(f, "decision timed out"),
        }
    }
}

/// Where the governor goes after a decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Execute(AssistantTurn),
    Validate,
    Correct {
        malformed: Option<AssistantTurn>,
        violation: Violation,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionOutcome {
    pub delta: StateDelta,
    pub route: Route,
}

/// Check the shape of a decision. `Ok` means exactly one call.
pub fn classify(turn: &AssistantTurn) -> Result<(), Violation> {
    let calls = &turn.action_calls;
    match calls.len() {
        0 => Err(Violation::NoAction),
        1 => Ok(()),
        n if calls.iter().any(|call| call.name == SUBMIT_ACTION) => {
            Err(Violation::SubmitBundled(n))
        }
        n => Err(Violation::MultipleActions(n)),
    }
}

/// Give every call an id that is non-empty and unused in the conversation.
pub fn normalize_call_ids(turn: &mut AssistantTurn, state: &RunState) {
    let mut used: HashSet<String> = state
        .conversation()
        .calls()
        .map(|call| call.id.clone())
        .collect();
    for call in &mut turn.action_calls {
        if call.id.trim().is_empty() || used.contains(&call.id) {
            let fresh = format!("call_{}", uuid::Uuid::new_v4().simple());
            tracing::debug!(old = call.id.as_str(), new = fresh.as_str(), "reassigned call id");
            call.id = fresh;
        }
        used.insert(call.id.clone());
    }
}

/// Decision Step: ask for exactly one action and route on the answer.
///
/// Malformed answers and timeouts are protocol violations routed to the
/// Correction Step. Only a failing reasoning provider aborts the run.
pub async fn decide(
    reasoner: &dyn Reasoner,
    state: &RunState,
    actions: &[ActionSpec],
    timeout: Duration,
) -> Result<DecisionOutcome, LoopError> {
    let request = DecisionRequest {
        conversation: state.conversation().turns(),
        actions,
        mode: ActionMode::ExactlyOne,
    };

    let mut turn = match tokio::time::timeout(timeout, reasoner.decide(request)).await {
        Ok(Ok(turn)) => turn,
        Ok(Err(ReasoningError::Provider(e))) => return Err(LoopError::Reasoning(e)),
        Ok(Err(e @ ReasoningError::MalformedJudgment(_))) => {
            return Err(LoopError::Reasoning(e.into()));
        }
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "decision timed out");
            return Ok(DecisionOutcome {
                delta: StateDelta::default(),
                route: Route::Correct {
                    malformed: None,
                    violation: Violation::TimedOut,
                },
            });
        }
    };

    normalize_call_ids(&mut turn, state);

    if let Err(violation) = classify(&turn) {
        tracing::info!(%violation, "protocol violation");
        let keep_turn = turn.text.is_some() || !turn.action_calls.is_empty();
        let delta = if keep_turn {
            StateDelta::append(vec![Turn::Assistant(turn.clone())])
        } else {
            StateDelta::default()
        };
        return Ok(DecisionOutcome {
            delta,
            route: Route::Correct {
                malformed: Some(turn),
                violation,
            },
        });
    }

    let call = &turn.action_calls[0];
    let (candidate, route) = if call.name == SUBMIT_ACTION {
        (
            CandidateUpdate::Replace(call.arguments.clone()),
            Route::Validate,
        )
    } else {
        (CandidateUpdate::Keep, Route::Execute(turn.clone()))
    };

    Ok(DecisionOutcome {
        delta: StateDelta {
            turns: vec![Turn::Assistant(turn)],
            candidate,
            advance_iteration: true,
            correction: false,
        },
        route,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::conversation::ActionCall;
    use crate::agent::reasoner::{Judgment, JudgmentRequest};
    use crate::schema::SchemaDescriptor;
    use serde_json::json;
    use std::future::Future;
    use std::pin::Pin;

    struct FixedReasoner(AssistantTurn);

    impl Reasoner for FixedReasoner {
        fn decide<'a>(
            &'a self,
            _request: DecisionRequest<'a>,
        ) -> Pin<Box<dyn Future<Output = Result<AssistantTurn, ReasoningError>> + Send + 'a>>
        {
            Box::pin(async move { Ok(self.0.clone()) })
        }

        fn judge<'a>(
            &'a self,
            _request: JudgmentRequest<'a>,
        ) -> Pin<Box<dyn Future<Output = Result<Judgment, ReasoningError>> + Send + 'a>> {
            Box::pin(async move { Err(ReasoningError::MalformedJudgment("unused".into())) })
        }
    }

    fn call(id: &str, name: &str) -> ActionCall {
        ActionCall::new(id, name, json!({"x": "v"}))
    }

    fn state() -> RunState {
        let mut state = RunState::new("acme", SchemaDescriptor::new(json!({"type": "object"})));
        state
            .apply(StateDelta::append(vec![Turn::user("find acme")]))
            .unwrap();
        state
    }

    async fn run(turn: AssistantTurn) -> DecisionOutcome {
        decide(
            &FixedReasoner(turn),
            &state(),
            &[],
            Duration::from_secs(5),
        )
        .await
        .unwrap()
    }

    #[test]
    fn classify_shapes() {
        assert_eq!(
            classify(&AssistantTurn::default()),
            Err(Violation::NoAction)
        );
        assert_eq!(
            classify(&AssistantTurn::with_calls(vec![call("a", "search")])),
            Ok(())
        );
        assert_eq!(
            classify(&AssistantTurn::with_calls(vec![
                call("a", "search"),
                call("b", "search")
            ])),
            Err(Violation::MultipleActions(2))
        );
        assert_eq!(
            classify(&AssistantTurn::with_calls(vec![
                call("a", "search"),
                call("b", SUBMIT_ACTION)
            ])),
            Err(Violation::SubmitBundled(2))
        );
    }

    #[tokio::test]
    async fn single_action_advances_and_routes_to_execution() {
        let outcome = run(AssistantTurn::with_calls(vec![call("a", "search")])).await;
        assert!(outcome.delta.advance_iteration);
        assert_eq!(outcome.delta.candidate, CandidateUpdate::Keep);
        assert!(matches!(outcome.route, Route::Execute(ref t) if t.action_calls[0].id == "a"));
    }

    #[tokio::test]
    async fn submit_sets_candidate_and_routes_to_validation() {
        let outcome = run(AssistantTurn::with_calls(vec![call("s", SUBMIT_ACTION)])).await;
        assert!(outcome.delta.advance_iteration);
        assert_eq!(
            outcome.delta.candidate,
            CandidateUpdate::Replace(json!({"x": "v"}))
        );
        assert_eq!(outcome.route, Route::Validate);
    }

    #[tokio::test]
    async fn two_calls_are_a_free_violation() {
        let outcome = run(AssistantTurn::with_calls(vec![
            call("a", "search"),
            call("b", "search"),
        ]))
        .await;
        assert!(!outcome.delta.advance_iteration);
        assert_eq!(outcome.delta.turns.len(), 1);
        assert!(matches!(
            outcome.route,
            Route::Correct {
                violation: Violation::MultipleActions(2),
                malformed: Some(_),
            }
        ));
    }

    #[tokio::test]
    async fn empty_turn_is_not_recorded() {
        let outcome = run(AssistantTurn::default()).await;
        assert!(outcome.delta.turns.is_empty());
        assert!(matches!(
            outcome.route,
            Route::Correct {
                violation: Violation::NoAction,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_and_empty_ids_are_replaced() {
        let mut state = state();
        state
            .apply(StateDelta::append(vec![Turn::Assistant(
                AssistantTurn::with_calls(vec![call("a", "search")]),
            )]))
            .unwrap();
        let mut turn = AssistantTurn::with_calls(vec![
            call("a", "search"),
            call("", "search"),
            call("b", "search"),
            call("b", "search"),
        ]);
        normalize_call_ids(&mut turn, &state);

        let ids: Vec<&str> = turn.action_calls.iter().map(|c| c.id.as_str()).collect();
        assert_ne!(ids[0], "a");
        assert!(ids[0].starts_with("call_"));
        assert!(ids[1].starts_with("call_"));
        assert_eq!(ids[2], "b");
        assert_ne!(ids[3], "b");
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 4);
    }
}
