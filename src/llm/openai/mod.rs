pub(in crate::llm) mod compat;
pub(in crate::llm) mod types;

use crate::actions::ActionSpec;
use crate::llm::http_client::build_provider_client;
use crate::llm::traits::{Provider, ProviderCapabilities};
use crate::llm::types::{ProviderMessage, ProviderResponse, ToolChoice};
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use types::{ChatRequest, ChatResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions provider for OpenAI and any server speaking the same
/// wire format (vLLM, llama.cpp, LM Studio, gateways).
pub struct OpenAiCompatibleProvider {
    name: String,
    chat_completions_url: String,
    /// Pre-computed `"Bearer <key>"` header value.
    cached_auth_header: Option<String>,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(name: &str, base_url: Option<&str>, api_key: Option<&str>) -> Self {
        Self::with_timeout(name, base_url, api_key, 120)
    }

    pub fn with_timeout(
        name: &str,
        base_url: Option<&str>,
        api_key: Option<&str>,
        timeout_secs: u64,
    ) -> Self {
        let base_url = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        Self {
            name: name.to_string(),
            chat_completions_url: format!("{base_url}/chat/completions"),
            cached_auth_header: api_key
                .filter(|key| !key.trim().is_empty())
                .map(|key| format!("Bearer {key}")),
            client: build_provider_client(timeout_secs),
        }
    }

    async fn call_api_with_request(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        compat::send_chat_completions_json(
            &self.client,
            self.cached_auth_header.as_ref(),
            request,
            &self.name,
            &self.chat_completions_url,
        )
        .await
    }
}

impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities { tool_calling: true }
    }

    fn chat_with_system<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        message: &'a str,
        model: &'a str,
        temperature: f64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let request = compat::build_request(system_prompt, message, model, temperature);
            let chat_response = self.call_api_with_request(&request).await?;
            compat::build_text_provider_response(chat_response, &self.name)
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
            let request = compat::build_tools_request(
                system_prompt,
                messages,
                tools,
                tool_choice,
                model,
                temperature,
            );
            let chat_response = self.call_api_with_request(&request).await?;
            compat::build_tool_provider_response(chat_response, &self.name)
        })
    }
}
