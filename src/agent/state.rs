use super::conversation::{Conversation, Turn};
use crate::error::LoopError;
use crate::schema::SchemaDescriptor;
use serde_json::Value;

/// How a step wants the candidate record changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CandidateUpdate {
    #[default]
    Keep,
    /// A new submission. Replaces any previous candidate wholesale.
    Replace(Value),
    Clear,
}

/// Everything a step wants changed, applied by the governor in one go.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDelta {
    pub turns: Vec<Turn>,
    pub candidate: CandidateUpdate,
    pub advance_iteration: bool,
    pub correction: bool,
}

impl StateDelta {
    pub fn append(turns: Vec<Turn>) -> Self {
        Self {
            turns,
            ..Self::default()
        }
    }
}

/// State of one extraction run. Only [`RunState::apply`] mutates it.
#[derive(Debug, Clone)]
pub struct RunState {
    pub topic: String,
    pub target_schema: SchemaDescriptor,
    conversation: Conversation,
    candidate_record: Option<Value>,
    iteration_count: u32,
    correction_count: u32,
}

impl RunState {
    pub fn new(topic: impl Into<String>, target_schema: SchemaDescriptor) -> Self {
        Self {
            topic: topic.into(),
            target_schema,
            conversation: Conversation::new(),
            candidate_record: None,
            iteration_count: 0,
            correction_count: 0,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn candidate_record(&self) -> Option<&Value> {
        self.candidate_record.as_ref()
    }

    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    pub fn correction_count(&self) -> u32 {
        self.correction_count
    }

    pub fn apply(&mut self, delta: StateDelta) -> Result<(), LoopError> {
        for turn in delta.turns {
            self.conversation.push(turn)?;
        }
        match delta.candidate {
            CandidateUpdate::Keep => {}
            CandidateUpdate::Replace(record) => self.candidate_record = Some(record),
            CandidateUpdate::Clear => self.candidate_record = None,
        }
        if delta.advance_iteration {
            self.iteration_count += 1;
        }
        if delta.correction {
            self.correction_count += 1;
        }
        Ok(())
    }

    pub(crate) fn into_parts(self) -> (Conversation, Option<Value>, u32) {
        (
            self.conversation,
            self.candidate_record,
            self.iteration_count,
        )
    }
}
