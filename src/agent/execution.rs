use super::conversation::{ActionCall, ActionResultTurn, AssistantTurn, Outcome, Turn};
use super::state::StateDelta;
use crate::actions::{Action, ActionRegistry, RunContext};
use crate::error::ActionError;
use crate::llm::coerce_arguments;
use crate::observability::{Observer, ObserverEvent};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinError;

/// Action Execution Stage.
///
/// Every call runs in its own task, at most `max_concurrent` at a time.
/// A failure, timeout or panic in one call becomes a `Failure` result for
/// that call only. Results come back in call order.
pub struct ExecutionStage {
    registry: Arc<ActionRegistry>,
    observer: Arc<dyn Observer>,
    max_concurrent: usize,
    action_timeout: Duration,
}

impl ExecutionStage {
    pub fn new(
        registry: Arc<ActionRegistry>,
        observer: Arc<dyn Observer>,
        max_concurrent: usize,
        action_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            observer,
            max_concurrent: max_concurrent.max(1),
            action_timeout,
        }
    }

    pub async fn execute(&self, turn: &AssistantTurn, ctx: &Arc<RunContext>) -> StateDelta {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let started = Instant::now();

        let handles: Vec<_> = turn
            .action_calls
            .iter()
            .map(|call| {
                let action = self.registry.get(&call.name);
                let call = call.clone();
                let ctx = Arc::clone(ctx);
                let semaphore = Arc::clone(&semaphore);
                let timeout = self.action_timeout;
                tokio::spawn(async move {
                    // The semaphore is never closed, so the permit always arrives.
                    let _permit = semaphore.acquire_owned().await;
                    invoke_one(action, &call, &ctx, timeout).await
                })
            })
            .collect();

        let joined = join_all(handles).await;

        let turns = turn
            .action_calls
            .iter()
            .zip(joined)
            .map(|(call, joined)| {
                let (result, duration) = joined.unwrap_or_else(|err| {
                    let error = ActionError::Panicked {
                        name: call.name.clone(),
                        message: join_error_message(err),
                    };
                    tracing::error!(action = call.name.as_str(), call_id = call.id.as_str(), "{error}");
                    (
                        ActionResultTurn::failure(call, error.to_string()),
                        started.elapsed(),
                    )
                });
                self.observer.record_event(&ObserverEvent::ActionCall {
                    action: call.name.clone(),
                    call_id: call.id.clone(),
                    duration,
                    success: result.outcome == Outcome::Success,
                });
                Turn::ActionResult(result)
            })
            .collect();

        StateDelta::append(turns)
    }
}

async fn invoke_one(
    action: Option<Arc<dyn Action>>,
    call: &ActionCall,
    ctx: &RunContext,
    timeout: Duration,
) -> (ActionResultTurn, Duration) {
    let started = Instant::now();
    let Some(action) = action else {
        let error = ActionError::NotFound {
            name: call.name.clone(),
        };
        tracing::warn!(call_id = call.id.as_str(), "{error}");
        return (
            ActionResultTurn::failure(call, error.to_string()),
            started.elapsed(),
        );
    };

    let args = coerce_arguments(&call.arguments, &action.input_schema());
    tracing::debug!(action = call.name.as_str(), call_id = call.id.as_str(), "invoking action");

    let result = match tokio::time::timeout(timeout, action.invoke(args, ctx)).await {
        Ok(Ok(content)) => ActionResultTurn::success(call, content),
        Ok(Err(e)) => {
            let error = ActionError::Failed {
                name: call.name.clone(),
                message: format!("{e:#}"),
            };
            tracing::warn!(call_id = call.id.as_str(), "{error}");
            ActionResultTurn::failure(call, error.to_string())
        }
        Err(_) => {
            let error = ActionError::TimedOut {
                name: call.name.clone(),
                secs: timeout.as_secs(),
            };
            tracing::warn!(call_id = call.id.as_str(), "{error}");
            ActionResultTurn::failure(call, error.to_string())
        }
    };
    (result, started.elapsed())
}

fn join_error_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "action panicked".to_string())
}
