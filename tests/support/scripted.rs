#![allow(dead_code)]

use enricher::SchemaDescriptor;
use enricher::actions::{Action, ActionRegistry, RunContext};
use enricher::agent::{
    ActionCall, AssistantTurn, DecisionRequest, Judgment, JudgmentRequest, LoopGovernor,
    LoopSettings, Reasoner, ReasoningError,
};
use enricher::observability::NoopObserver;
use enricher::prompt::PromptBuilder;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub enum Reply<T> {
    Ready(T),
    Hang,
    ProviderDown,
}

/// Reasoner that plays back queued replies, repeating `fallback` once the
/// decision queue runs dry.
pub struct ScriptedReasoner {
    decisions: Mutex<VecDeque<Reply<AssistantTurn>>>,
    fallback: Option<AssistantTurn>,
    judgments: Mutex<VecDeque<Reply<Judgment>>>,
    judged_views: Mutex<Vec<usize>>,
}

impl ScriptedReasoner {
    pub fn new(decisions: Vec<Reply<AssistantTurn>>, judgments: Vec<Reply<Judgment>>) -> Self {
        Self {
            decisions: Mutex::new(VecDeque::from(decisions)),
            fallback: None,
            judgments: Mutex::new(VecDeque::from(judgments)),
            judged_views: Mutex::new(Vec::new()),
        }
    }

    pub fn repeating(turn: AssistantTurn) -> Self {
        Self {
            fallback: Some(turn),
            ..Self::new(Vec::new(), Vec::new())
        }
    }

    /// Conversation length each judgment call was shown.
    pub fn judged_views(&self) -> Vec<usize> {
        self.judged_views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

async fn play<T>(reply: Reply<T>) -> Result<T, ReasoningError> {
    match reply {
        Reply::Ready(value) => Ok(value),
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(ReasoningError::MalformedJudgment("hung".into()))
        }
        Reply::ProviderDown => Err(ReasoningError::Provider(anyhow::anyhow!(
            "connection refused"
        ))),
    }
}

impl Reasoner for ScriptedReasoner {
    fn decide<'a>(
        &'a self,
        _request: DecisionRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<AssistantTurn, ReasoningError>> + Send + 'a>> {
        let reply = self
            .decisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .or_else(|| self.fallback.clone().map(Reply::Ready))
            .unwrap_or(Reply::Ready(AssistantTurn::default()));
        Box::pin(play(reply))
    }

    fn judge<'a>(
        &'a self,
        request: JudgmentRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<Judgment, ReasoningError>> + Send + 'a>> {
        self.judged_views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.conversation.len());
        let reply = self
            .judgments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Reply::Ready(reject("no more judgments scripted")));
        Box::pin(play(reply))
    }
}

/// Action that echoes its arguments back.
pub struct EchoAction(pub &'static str);

impl Action for EchoAction {
    fn name(&self) -> &str {
        self.0
    }

    fn description(&self) -> &str {
        "Echo the arguments"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"query": {"type": "string"}}})
    }

    fn invoke<'a>(
        &'a self,
        args: Value,
        _ctx: &'a RunContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move { Ok(format!("{} results for {args}", self.0)) })
    }
}

/// Action that always errors.
pub struct BrokenAction;

impl Action for BrokenAction {
    fn name(&self) -> &str {
        "broken"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    fn invoke<'a>(
        &'a self,
        _args: Value,
        _ctx: &'a RunContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move { anyhow::bail!("upstream returned 503") })
    }
}

pub fn call(id: &str, name: &str, arguments: Value) -> ActionCall {
    ActionCall::new(id, name, arguments)
}

pub fn single(id: &str, name: &str, arguments: Value) -> AssistantTurn {
    AssistantTurn::with_calls(vec![call(id, name, arguments)])
}

pub fn accept() -> Judgment {
    Judgment {
        reasons: vec![
            "every field is sourced".into(),
            "values agree across sources".into(),
            "no required field is missing".into(),
        ],
        is_acceptable: true,
        improvement_notes: None,
    }
}

pub fn reject(notes: &str) -> Judgment {
    Judgment {
        reasons: vec![
            "value is unsupported".into(),
            "sources disagree".into(),
            "needs another lookup".into(),
        ],
        is_acceptable: false,
        improvement_notes: Some(notes.into()),
    }
}

/// Record schema with one required string field `x`.
pub fn x_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(json!({
        "type": "object",
        "properties": {"x": {"type": "string"}},
        "required": ["x"]
    }))
}

pub fn settings(max_loops: u32) -> LoopSettings {
    LoopSettings {
        max_loops,
        max_corrections: 4,
        max_concurrent_actions: 4,
        decision_timeout: Duration::from_secs(5),
        judgment_timeout: Duration::from_secs(5),
        action_timeout: Duration::from_secs(5),
    }
}

pub fn search_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register(Box::new(EchoAction("search")));
    registry
}

pub fn governor(
    reasoner: Arc<ScriptedReasoner>,
    registry: ActionRegistry,
    settings: LoopSettings,
) -> LoopGovernor {
    LoopGovernor::new(
        reasoner,
        Arc::new(registry),
        Arc::new(PromptBuilder::new().unwrap()),
        Arc::new(NoopObserver),
        settings,
    )
}
