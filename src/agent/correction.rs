use super::conversation::{ActionResultTurn, AssistantTurn, Turn};
use super::decision::Violation;
use super::state::StateDelta;
use crate::actions::SUBMIT_ACTION;

fn reminder(violation: Violation) -> String {
    format!(
        "Protocol violation: {violation}. Every turn must call exactly one action. \
         Call `{SUBMIT_ACTION}` with the complete record once you have enough evidence."
    )
}

/// Correction Step: answer a protocol violation with feedback.
///
/// Each call of a malformed turn gets its own `Failure` result so the
/// call/result pairing stays whole. Without calls there is nothing to
/// answer, so the reminder arrives as a user turn instead. Never advances
/// the iteration count.
pub fn correct(malformed: Option<&AssistantTurn>, violation: Violation) -> StateDelta {
    let message = reminder(violation);
    let turns = match malformed {
        Some(turn) if !turn.action_calls.is_empty() => turn
            .action_calls
            .iter()
            .map(|call| Turn::ActionResult(ActionResultTurn::failure(call, message.clone())))
            .collect(),
        _ => vec![Turn::user(message)],
    };

    StateDelta {
        turns,
        correction: true,
        ..StateDelta::default()
    }
}
