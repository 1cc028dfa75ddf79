pub mod conversation;
pub mod correction;
pub mod decision;
pub mod execution;
pub mod governor;
pub mod reasoner;
pub mod state;
pub mod validation;

pub use conversation::{
    ActionCall, ActionResultTurn, AssistantTurn, Conversation, Outcome, Turn,
};
pub use correction::correct;
pub use decision::{DecisionOutcome, Route, Violation, classify, decide, normalize_call_ids};
pub use execution::ExecutionStage;
pub use governor::{LoopGovernor, LoopSettings, RunOutcome, Termination};
pub use reasoner::{
    ActionMode, DecisionRequest, JUDGMENT_FUNCTION, Judgment, JudgmentRequest, LlmReasoner,
    Reasoner, ReasoningError, turns_to_messages,
};
pub use state::{CandidateUpdate, RunState, StateDelta};
pub use validation::{ValidationOutcome, Verdict, validate};
