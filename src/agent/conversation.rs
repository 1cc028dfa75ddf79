use crate::error::LoopError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Whether an action result turn reports success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

/// A single action the reasoning capability asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ActionCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantTurn {
    pub text: Option<String>,
    pub action_calls: Vec<ActionCall>,
}

impl AssistantTurn {
    pub fn with_calls(action_calls: Vec<ActionCall>) -> Self {
        Self {
            text: None,
            action_calls,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResultTurn {
    pub call_id: String,
    pub action_name: String,
    pub content: String,
    pub outcome: Outcome,
}

impl ActionResultTurn {
    pub fn success(call: &ActionCall, content: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            action_name: call.name.clone(),
            content: content.into(),
            outcome: Outcome::Success,
        }
    }

    pub fn failure(call: &ActionCall, content: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            action_name: call.name.clone(),
            content: content.into(),
            outcome: Outcome::Failure,
        }
    }
}

/// One entry of the evidence trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    User { text: String },
    Assistant(AssistantTurn),
    ActionResult(ActionResultTurn),
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }
}

/// Append-only log of turns.
///
/// Appends are checked: call ids stay unique, and every result answers an
/// earlier call that has not been answered yet. A rejected append is an
/// internal consistency error because only the controller builds turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub(crate) fn push(&mut self, turn: Turn) -> Result<(), LoopError> {
        match &turn {
            Turn::User { .. } => {}
            Turn::Assistant(assistant) => {
                let mut seen = HashSet::new();
                for call in &assistant.action_calls {
                    if call.id.is_empty() {
                        return Err(LoopError::internal(format!(
                            "action call '{}' has an empty id",
                            call.name
                        )));
                    }
                    if !seen.insert(call.id.as_str()) || self.has_call_id(&call.id) {
                        return Err(LoopError::internal(format!(
                            "duplicate action call id '{}'",
                            call.id
                        )));
                    }
                }
            }
            Turn::ActionResult(result) => {
                if !self.pending_call_ids().contains(result.call_id.as_str()) {
                    return Err(LoopError::internal(format!(
                        "result for '{}' does not answer an outstanding action call",
                        result.call_id
                    )));
                }
            }
        }
        self.turns.push(turn);
        Ok(())
    }

    pub fn calls(&self) -> impl Iterator<Item = &ActionCall> {
        self.turns
            .iter()
            .filter_map(|turn| match turn {
                Turn::Assistant(assistant) => Some(assistant),
                _ => None,
            })
            .flat_map(|assistant| assistant.action_calls.iter())
    }

    pub fn results(&self) -> impl Iterator<Item = &ActionResultTurn> {
        self.turns.iter().filter_map(|turn| match turn {
            Turn::ActionResult(result) => Some(result),
            _ => None,
        })
    }

    pub fn has_call_id(&self, id: &str) -> bool {
        self.calls().any(|call| call.id == id)
    }

    /// Ids of calls that have no result yet.
    pub fn pending_call_ids(&self) -> HashSet<&str> {
        let answered: HashSet<&str> = self.results().map(|r| r.call_id.as_str()).collect();
        self.calls()
            .map(|call| call.id.as_str())
            .filter(|id| !answered.contains(id))
            .collect()
    }

    /// The most recent assistant turn and its position.
    pub fn last_assistant(&self) -> Option<(usize, &AssistantTurn)> {
        self.turns
            .iter()
            .enumerate()
            .rev()
            .find_map(|(idx, turn)| match turn {
                Turn::Assistant(assistant) => Some((idx, assistant)),
                _ => None,
            })
    }

    /// Check the 1:1 call/result pairing over the whole log.
    pub fn ensure_paired(&self) -> Result<(), LoopError> {
        let mut results_per_call: HashMap<&str, usize> =
            self.calls().map(|call| (call.id.as_str(), 0)).collect();
        for result in self.results() {
            let Some(count) = results_per_call.get_mut(result.call_id.as_str()) else {
                return Err(LoopError::internal(format!(
                    "orphaned result for unknown call '{}'",
                    result.call_id
                )));
            };
            *count += 1;
        }
        let mut unpaired: Vec<String> = results_per_call
            .into_iter()
            .filter(|(_, count)| *count != 1)
            .map(|(id, count)| format!("{id} ({count} results)"))
            .collect();
        if unpaired.is_empty() {
            return Ok(());
        }
        unpaired.sort();
        Err(LoopError::internal(format!(
            "action calls without exactly one result: {}",
            unpaired.join(", ")
        )))
    }
}
