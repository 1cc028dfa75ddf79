use super::page::{fetch_page_text, parse_target};
use super::traits::{Action, RunContext};
use crate::config::FetchConfig;
use crate::llm::{Provider, build_web_client};
use crate::prompt::PromptBuilder;
use reqwest::Client;
use serde_json::{Value, json};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

const SUMMARY_SYSTEM_PROMPT: &str =
    "You condense web pages into factual research notes. Never add facts the page does not state.";

/// Fetch a page and have the model summarize it against the run's topic.
pub struct FetchAndSummarizeAction {
    client: Client,
    provider: Arc<dyn Provider>,
    prompts: Arc<PromptBuilder>,
    model: String,
    temperature: f64,
    max_content_chars: usize,
    max_page_bytes: usize,
}

impl FetchAndSummarizeAction {
    pub fn new(
        config: &FetchConfig,
        provider: Arc<dyn Provider>,
        prompts: Arc<PromptBuilder>,
        model: impl Into<String>,
        temperature: f64,
    ) -> Self {
        Self {
            client: build_web_client(config.timeout_secs),
            provider,
            prompts,
            model: model.into(),
            temperature,
            max_content_chars: config.max_content_chars,
            max_page_bytes: config.max_page_bytes,
        }
    }
}

impl Action for FetchAndSummarizeAction {
    fn name(&self) -> &str {
        "fetch_and_summarize"
    }

    fn description(&self) -> &str {
        "Download a web page and return a summary of the facts on it that matter for the \
current topic and record."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute http(s) URL of the page to read"
                }
            },
            "required": ["url"]
        })
    }

    fn invoke<'a>(
        &'a self,
        args: Value,
        ctx: &'a RunContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let raw_url = args
                .get("url")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow::anyhow!("Missing 'url' parameter"))?;
            let url = parse_target(raw_url)?;

            let page = fetch_page_text(
                &self.client,
                &url,
                self.max_content_chars,
                self.max_page_bytes,
            )
            .await?;
            if page.text.is_empty() {
                return Ok(format!("{url} has no readable text."));
            }
            tracing::debug!(url = %url, chars = page.text.len(), "fetched page");

            let prompt =
                self.prompts
                    .summary_prompt(&ctx.topic, &ctx.schema.render(), &page.text)?;
            let summary = self
                .provider
                .chat_with_system(
                    Some(SUMMARY_SYSTEM_PROMPT),
                    &prompt,
                    &self.model,
                    self.temperature,
                )
                .await?;

            let title = page.title.as_deref().unwrap_or("Untitled");
            Ok(format!("[{title}]\nURL: {}\n\n{}", page.url, summary.trim()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaDescriptor;

    struct EchoProvider;

    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        fn chat_with_system<'a>(
            &'a self,
            _system_prompt: Option<&'a str>,
            message: &'a str,
            _model: &'a str,
            _temperature: f64,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
            Box::pin(async move { Ok(message.to_string()) })
        }
    }

    fn action() -> FetchAndSummarizeAction {
        FetchAndSummarizeAction::new(
            &FetchConfig::default(),
            Arc::new(EchoProvider),
            Arc::new(PromptBuilder::new().unwrap()),
            "test-model",
            0.0,
        )
    }

    fn ctx() -> RunContext {
        RunContext::new("acme", SchemaDescriptor::new(json!({"type": "object"})))
    }

    #[tokio::test]
    async fn missing_url_is_an_error() {
        let err = action().invoke(json!({}), &ctx()).await.unwrap_err();
        assert!(err.to_string().contains("url"));
    }

    #[tokio::test]
    async fn non_http_url_is_rejected_before_fetching() {
        let err = action()
            .invoke(json!({"url": "ftp://acme.test/file"}), &ctx())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("scheme"));
    }
}
