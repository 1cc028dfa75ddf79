pub mod dispatch;

use crate::actions::default_actions;
use crate::agent::{LlmReasoner, LoopGovernor, LoopSettings, RunOutcome};
use crate::config::Config;
use crate::llm::create_resilient_provider;
use crate::observability::create_observer;
use crate::prompt::PromptBuilder;
use crate::schema::SchemaDescriptor;
use crate::error::Result;
use anyhow::Context;
use std::sync::Arc;

pub use dispatch::dispatch;

/// Wire provider, prompts, actions and observer together and run one extraction.
///
/// 1. Validates the config and builds a retrying provider.
/// 2. Parses the prompt templates once.
/// 3. Registers `search` and `fetch_and_summarize`.
/// 4. Drives a [`LoopGovernor`] to a terminal state.
///
/// Invalid configuration surfaces as [`EnrichError::Config`] and a failed run
/// as [`EnrichError::Loop`].
///
/// [`EnrichError::Config`]: crate::EnrichError::Config
/// [`EnrichError::Loop`]: crate::EnrichError::Loop
pub async fn run(topic: &str, schema: SchemaDescriptor, config: &Config) -> Result<RunOutcome> {
    config.validate()?;

    let provider = create_resilient_provider(config);
    let prompts = Arc::new(
        PromptBuilder::with_templates(
            config.agent.prompt_template.as_deref(),
            config.agent.judgment_template.as_deref(),
        )
        .context("Failed to build prompt templates")?,
    );
    let registry = Arc::new(default_actions(
        config,
        Arc::clone(&provider),
        Arc::clone(&prompts),
    ));
    let observer = create_observer(&config.observability);
    let reasoner = Arc::new(LlmReasoner::new(
        provider,
        config.model.clone(),
        config.temperature,
    ));

    let governor = LoopGovernor::new(
        reasoner,
        registry,
        prompts,
        observer,
        LoopSettings::from_config(config),
    );
    Ok(governor.run(topic, schema).await?)
}
