use super::conversation::{AssistantTurn, Conversation, Turn};
use super::correction::correct;
use super::decision::{Route, Violation, decide};
use super::execution::ExecutionStage;
use super::reasoner::Reasoner;
use super::state::{RunState, StateDelta};
use super::validation::{Verdict, validate};
use crate::actions::{ActionRegistry, RunContext, SUBMIT_ACTION};
use crate::config::Config;
use crate::error::LoopError;
use crate::observability::{Observer, ObserverEvent};
use crate::prompt::PromptBuilder;
use crate::schema::SchemaDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

// ── Public types ─────────────────────────────────────────────────────────────

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// A candidate passed independent review.
    Accepted,
    /// The iteration budget ran out.
    BudgetExhausted,
    /// Too many malformed decisions.
    CorrectionsExhausted,
    /// The judge did not answer in time.
    JudgmentUnavailable,
}

impl Termination {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::BudgetExhausted => "budget_exhausted",
            Self::CorrectionsExhausted => "corrections_exhausted",
            Self::JudgmentUnavailable => "judgment_unavailable",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final output of [`LoopGovernor::run`]: the verdict plus the audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Present only when `terminated` is [`Termination::Accepted`].
    pub record: Option<Value>,
    pub terminated: Termination,
    pub iterations: u32,
    pub conversation: Conversation,
}

/// Read-only limits for one run.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub max_loops: u32,
    pub max_corrections: u32,
    pub max_concurrent_actions: usize,
    pub decision_timeout: Duration,
    pub judgment_timeout: Duration,
    pub action_timeout: Duration,
}

impl LoopSettings {
    pub fn from_config(config: &Config) -> Self {
        let agent = &config.agent;
        Self {
            max_loops: agent.max_loops,
            max_corrections: agent.max_corrections,
            max_concurrent_actions: agent.max_concurrent_actions,
            decision_timeout: Duration::from_secs(agent.decision_timeout_secs),
            judgment_timeout: Duration::from_secs(agent.judgment_timeout_secs),
            action_timeout: Duration::from_secs(agent.action_timeout_secs),
        }
    }
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// ── Internal types ───────────────────────────────────────────────────────────

enum Phase {
    Deciding,
    Correcting {
        malformed: Option<AssistantTurn>,
        violation: Violation,
    },
    Executing(AssistantTurn),
    Validating,
    Terminal(Termination),
}

// ── Governor ─────────────────────────────────────────────────────────────────

/// Drives one run through decide, execute or validate, and correct, until a
/// terminal state. Owns the [`RunState`]; steps only return deltas.
pub struct LoopGovernor {
    reasoner: Arc<dyn Reasoner>,
    registry: Arc<ActionRegistry>,
    prompts: Arc<PromptBuilder>,
    observer: Arc<dyn Observer>,
    execution: ExecutionStage,
    settings: LoopSettings,
}

impl LoopGovernor {
    pub fn new(
        reasoner: Arc<dyn Reasoner>,
        registry: Arc<ActionRegistry>,
        prompts: Arc<PromptBuilder>,
        observer: Arc<dyn Observer>,
        settings: LoopSettings,
    ) -> Self {
        let execution = ExecutionStage::new(
            Arc::clone(&registry),
            Arc::clone(&observer),
            settings.max_concurrent_actions,
            settings.action_timeout,
        );
        Self {
            reasoner,
            registry,
            prompts,
            observer,
            execution,
            settings,
        }
    }

    /// Run the loop for `topic` until a terminal state.
    ///
    /// Only internal consistency failures and a failing reasoning provider
    /// surface as errors. Everything the model or an action does wrong is
    /// absorbed into the conversation.
    pub async fn run(
        &self,
        topic: &str,
        target_schema: SchemaDescriptor,
    ) -> Result<RunOutcome, LoopError> {
        let started = Instant::now();
        let ctx = Arc::new(RunContext::new(topic, target_schema.clone()));
        let actions = self.registry.specs_with_submit(&target_schema);
        let mut state = RunState::new(topic, target_schema);

        let opening = self
            .prompts
            .decision_prompt(topic, &state.target_schema.render())
            .map_err(|e| LoopError::internal(format!("decision prompt failed to render: {e:#}")))?;
        state.apply(StateDelta::append(vec![Turn::user(opening)]))?;

        self.observer.record_event(&ObserverEvent::RunStart {
            topic: topic.to_string(),
            max_loops: self.settings.max_loops,
        });
        tracing::info!(topic, max_loops = self.settings.max_loops, "run started");

        let mut phase = Phase::Deciding;
        let termination = loop {
            phase = match phase {
                Phase::Terminal(termination) => break termination,

                Phase::Deciding => {
                    state.conversation().ensure_paired()?;
                    if state.iteration_count() >= self.settings.max_loops {
                        Phase::Terminal(Termination::BudgetExhausted)
                    } else {
                        let outcome = decide(
                            self.reasoner.as_ref(),
                            &state,
                            &actions,
                            self.settings.decision_timeout,
                        )
                        .await?;
                        state.apply(outcome.delta)?;
                        self.route(outcome.route, state.iteration_count())
                    }
                }

                Phase::Correcting {
                    malformed,
                    violation,
                } => {
                    state.apply(correct(malformed.as_ref(), violation))?;
                    let corrections = state.correction_count();
                    self.observer.record_event(&ObserverEvent::ProtocolViolation {
                        violation: violation.to_string(),
                        corrections,
                    });
                    if corrections >= self.settings.max_corrections {
                        tracing::warn!(corrections, "correction budget exhausted");
                        Phase::Terminal(Termination::CorrectionsExhausted)
                    } else {
                        Phase::Deciding
                    }
                }

                Phase::Executing(turn) => {
                    state.apply(self.execution.execute(&turn, &ctx).await)?;
                    Phase::Deciding
                }

                Phase::Validating => {
                    let outcome = validate(
                        self.reasoner.as_ref(),
                        &self.prompts,
                        &state,
                        self.settings.judgment_timeout,
                    )
                    .await?;
                    state.apply(outcome.delta)?;
                    self.observer.record_event(&ObserverEvent::Judgment {
                        iteration: state.iteration_count(),
                        accepted: outcome.verdict == Verdict::Accepted,
                    });
                    match outcome.verdict {
                        Verdict::Accepted => Phase::Terminal(Termination::Accepted),
                        Verdict::Rejected => Phase::Deciding,
                        Verdict::Unavailable => Phase::Terminal(Termination::JudgmentUnavailable),
                    }
                }
            };
        };

        let (conversation, candidate, iterations) = state.into_parts();
        let record = if termination == Termination::Accepted {
            candidate
        } else {
            None
        };

        let duration = started.elapsed();
        self.observer.record_event(&ObserverEvent::RunEnd {
            termination: termination.to_string(),
            iterations,
            duration,
        });
        self.observer.flush();
        tracing::info!(
            termination = termination.as_str(),
            iterations,
            turns = conversation.len(),
            "run finished"
        );

        Ok(RunOutcome {
            record,
            terminated: termination,
            iterations,
            conversation,
        })
    }

    fn route(&self, route: Route, iteration: u32) -> Phase {
        match route {
            Route::Execute(turn) => {
                for call in &turn.action_calls {
                    self.observer.record_event(&ObserverEvent::Decision {
                        iteration,
                        action: call.name.clone(),
                    });
                }
                Phase::Executing(turn)
            }
            Route::Validate => {
                self.observer.record_event(&ObserverEvent::Decision {
                    iteration,
                    action: SUBMIT_ACTION.to_string(),
                });
                Phase::Validating
            }
            Route::Correct {
                malformed,
                violation,
            } => Phase::Correcting {
                malformed,
                violation,
            },
        }
    }
}
