use super::{ActionRegistry, FetchAndSummarizeAction, SearchAction};
use crate::config::Config;
use crate::llm::Provider;
use crate::prompt::PromptBuilder;
use std::sync::Arc;

/// Build the registry of evidence-gathering actions for a run.
pub fn default_actions(
    config: &Config,
    provider: Arc<dyn Provider>,
    prompts: Arc<PromptBuilder>,
) -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register(Box::new(SearchAction::new(&config.search)));
    registry.register(Box::new(FetchAndSummarizeAction::new(
        &config.fetch,
        provider,
        prompts,
        config.model.clone(),
        config.temperature,
    )));
    registry
}
