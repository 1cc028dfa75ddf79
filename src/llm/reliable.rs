use super::traits::{Provider, ProviderCapabilities};
use super::types::{ProviderMessage, ProviderResponse, ToolChoice};
use crate::actions::ActionSpec;
use crate::error::LlmError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

const MAX_BACKOFF_MS: u64 = 10_000;

/// Client errors that will not resolve by retrying.
fn is_non_retryable(err: &anyhow::Error) -> bool {
    if let Some(llm_err) = err.downcast_ref::<LlmError>() {
        if llm_err.is_client_error() {
            return true;
        }
        if let LlmError::Api { body, .. } = llm_err {
            return is_quota_exhausted(body);
        }
        return false;
    }

    if let Some(reqwest_err) = err.downcast_ref::<reqwest::Error>()
        && let Some(status) = reqwest_err.status()
    {
        let code = status.as_u16();
        return status.is_client_error() && code != 429 && code != 408;
    }

    false
}

fn is_quota_exhausted(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("insufficient_quota") || lower.contains("exceeded your current quota")
}

/// Provider wrapper that retries transient failures with exponential backoff.
pub struct ReliableProvider {
    inner: Arc<dyn Provider>,
    max_retries: u32,
    base_backoff_ms: u64,
}

impl ReliableProvider {
    pub fn new(inner: Arc<dyn Provider>, max_retries: u32, base_backoff_ms: u64) -> Self {
        Self {
            inner,
            max_retries,
            base_backoff_ms: base_backoff_ms.max(50),
        }
    }

    async fn with_retries<T, F, Fut>(&self, operation: &str, call: F) -> anyhow::Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let provider_name = self.inner.name();
        let mut backoff_ms = self.base_backoff_ms;
        let mut failures = Vec::new();

        for attempt in 0..=self.max_retries {
            match call().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(
                            provider = provider_name,
                            operation,
                            attempt,
                            "Provider recovered after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if is_non_retryable(&e) {
                        tracing::warn!(
                            provider = provider_name,
                            operation,
                            "Non-retryable provider error: {e}"
                        );
                        return Err(e);
                    }

                    failures.push(format!(
                        "attempt {}/{}: {e}",
                        attempt + 1,
                        self.max_retries + 1
                    ));

                    if attempt < self.max_retries {
                        tracing::warn!(
                            provider = provider_name,
                            operation,
                            attempt = attempt + 1,
                            max_retries = self.max_retries,
                            "Provider call failed, retrying"
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                        backoff_ms = backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
                    }
                }
            }
        }

        anyhow::bail!(
            "{provider_name} failed after {} attempts:\n{}",
            self.max_retries + 1,
            failures.join("\n")
        )
    }
}

impl Provider for ReliableProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.inner.capabilities()
    }

    fn chat_with_system<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        message: &'a str,
        model: &'a str,
        temperature: f64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            self.with_retries("chat", || {
                self.inner
                    .chat_with_system(system_prompt, message, model, temperature)
            })
            .await
        })
    }

    fn chat_with_tools<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        messages: &'a [ProviderMessage],
        tools: &'a [ActionSpec],
        tool_choice: &'a ToolChoice,
        model: &'a str,
        temperature: f64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ProviderResponse>> + Send + 'a>> {
        Box::pin(async move {
            self.with_retries("chat_with_tools", || {
                self.inner.chat_with_tools(
                    system_prompt,
                    messages,
                    tools,
                    tool_choice,
                    model,
                    temperature,
                )
            })
            .await
        })
    }
}
