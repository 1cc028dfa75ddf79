use super::openai::OpenAiCompatibleProvider;
use super::reliable::ReliableProvider;
use super::traits::Provider;
use crate::config::Config;
use std::sync::Arc;

/// Name used in logs and errors for the configured endpoint.
fn provider_name(base_url: Option<&str>) -> &'static str {
    match base_url {
        None => "openai",
        Some(url) if url.contains("api.openai.com") => "openai",
        Some(_) => "openai-compatible",
    }
}

/// Create the bare provider described by `config`, without retries.
pub fn create_provider(config: &Config) -> Arc<dyn Provider> {
    let base_url = config.base_url.as_deref();
    let timeout_secs = config
        .agent
        .decision_timeout_secs
        .max(config.agent.judgment_timeout_secs);
    Arc::new(OpenAiCompatibleProvider::with_timeout(
        provider_name(base_url),
        base_url,
        config.api_key.as_deref(),
        timeout_secs,
    ))
}

/// Create the configured provider wrapped in retry/backoff handling.
pub fn create_resilient_provider(config: &Config) -> Arc<dyn Provider> {
    let inner = create_provider(config);
    Arc::new(ReliableProvider::new(
        inner,
        config.reliability.max_retries,
        config.reliability.base_backoff_ms,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_openai() {
        let provider = create_resilient_provider(&Config::default());
        assert_eq!(provider.name(), "openai");
        assert!(provider.supports_tool_calling());
    }

    #[test]
    fn custom_base_url_is_named_compatible() {
        let config = Config {
            base_url: Some("http://localhost:8000/v1".into()),
            ..Config::default()
        };
        assert_eq!(create_provider(&config).name(), "openai-compatible");
    }
}
