use super::conversation::{ActionCall, ActionResultTurn, Turn};
use super::reasoner::{Judgment, JudgmentRequest, Reasoner, ReasoningError};
use super::state::{CandidateUpdate, RunState, StateDelta};
use crate::actions::SUBMIT_ACTION;
use crate::error::LoopError;
use crate::prompt::PromptBuilder;
use serde_json::Value;
use std::time::Duration;

const REJECTION_PREFIX: &str = "Unsatisfactory response:";

/// How the review of a submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected,
    /// The judge did not answer in time. Terminal for the run.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub delta: StateDelta,
    pub verdict: Verdict,
}

fn rejection(call: &ActionCall, critique: &str) -> ValidationOutcome {
    ValidationOutcome {
        delta: StateDelta {
            turns: vec![Turn::ActionResult(ActionResultTurn::failure(
                call,
                format!("{REJECTION_PREFIX}\n{critique}"),
            ))],
            candidate: CandidateUpdate::Clear,
            ..StateDelta::default()
        },
        verdict: Verdict::Rejected,
    }
}

/// The pending `submit` call, its position and the candidate it carried.
fn pending_submission(state: &RunState) -> Result<(usize, &ActionCall, &Value), LoopError> {
    let conversation = state.conversation();
    let (idx, turn) = conversation
        .last_assistant()
        .ok_or_else(|| LoopError::internal("validation without an assistant turn"))?;
    let call = match turn.action_calls.as_slice() {
        [call] if call.name == SUBMIT_ACTION => call,
        _ => {
            return Err(LoopError::internal(
                "validation requires a turn with exactly one submit call",
            ));
        }
    };
    if !conversation.pending_call_ids().contains(call.id.as_str()) {
        return Err(LoopError::internal(format!(
            "submit call '{}' was already answered",
            call.id
        )));
    }
    let candidate = state
        .candidate_record()
        .ok_or_else(|| LoopError::internal("validation without a candidate record"))?;
    Ok((idx, call, candidate))
}

/// Validation Step: have an independent judge review the candidate.
///
/// The judge sees the conversation up to, but not including, the turn that
/// submitted the candidate, plus a review prompt. Exactly one result turn
/// answers the `submit` call whatever the verdict.
pub async fn validate(
    reasoner: &dyn Reasoner,
    prompts: &PromptBuilder,
    state: &RunState,
    timeout: Duration,
) -> Result<ValidationOutcome, LoopError> {
    let (submit_idx, call, candidate) = pending_submission(state)?;

    let schema_errors = state.target_schema.validate(candidate);
    if !schema_errors.is_empty() {
        tracing::info!(errors = schema_errors.len(), "candidate fails schema check");
        let critique = format!(
            "The record does not match the target schema:\n- {}",
            schema_errors.join("\n- ")
        );
        return Ok(rejection(call, &critique));
    }

    let candidate_text =
        serde_json::to_string_pretty(candidate).unwrap_or_else(|_| candidate.to_string());
    let prompt = prompts
        .judgment_prompt(&state.topic, &state.target_schema.render(), &candidate_text)
        .map_err(|e| LoopError::internal(format!("judgment prompt failed to render: {e:#}")))?;

    let request = JudgmentRequest {
        conversation: &state.conversation().turns()[..submit_idx],
        prompt: &prompt,
    };

    let judgment = match tokio::time::timeout(timeout, reasoner.judge(request)).await {
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "judgment timed out");
            return Ok(ValidationOutcome {
                delta: StateDelta {
                    turns: vec![Turn::ActionResult(ActionResultTurn::failure(
                        call,
                        format!("Judgment unavailable: no verdict within {}s", timeout.as_secs()),
                    ))],
                    candidate: CandidateUpdate::Clear,
                    ..StateDelta::default()
                },
                verdict: Verdict::Unavailable,
            });
        }
        Ok(Err(ReasoningError::Provider(e))) => return Err(LoopError::Reasoning(e)),
        Ok(Err(ReasoningError::MalformedJudgment(message))) => Err(message),
        Ok(Ok(judgment)) => judgment
            .ensure_well_formed()
            .map_err(|e| e.to_string()),
    };

    let judgment: Judgment = match judgment {
        Ok(judgment) => judgment,
        Err(message) => {
            tracing::warn!(message = message.as_str(), "unusable judgment, treating as rejection");
            return Ok(rejection(
                call,
                &format!("The review could not be completed ({message}). Re-check the evidence and submit again."),
            ));
        }
    };

    if judgment.is_acceptable {
        return Ok(ValidationOutcome {
            delta: StateDelta::append(vec![Turn::ActionResult(ActionResultTurn::success(
                call,
                judgment.reasons.join("\n"),
            ))]),
            verdict: Verdict::Accepted,
        });
    }

    Ok(rejection(call, &judgment.critique()))
}
