use super::types::{ContentBlock, MessageRole, ProviderMessage, ProviderResponse, ToolChoice};
use crate::actions::ActionSpec;
use std::future::Future;
use std::pin::Pin;

pub fn messages_to_text(messages: &[ProviderMessage]) -> String {
    messages
        .iter()
        .filter_map(|msg| {
            let role_label = match msg.role {
                MessageRole::User => "User:",
                MessageRole::Assistant => "Assistant:",
                MessageRole::System => "System:",
            };
            let text_parts: Vec<String> = msg
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.clone()),
                    ContentBlock::ToolResult { content, .. } => Some(content.clone()),
                    ContentBlock::ToolUse { .. } => None,
                })
                .collect();
            if text_parts.is_empty() {
                None
            } else {
                Some(format!("{} {}", role_label, text_parts.join(" ")))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Provider capabilities reported at runtime.
#[derive(Debug, Clone, Default)]
pub struct ProviderCapabilities {
    pub tool_calling: bool,
}

pub trait Provider: Send + Sync {
    /// Provider identifier (e.g. "openai").
    fn name(&self) -> &str;

    /// Runtime capability flags.
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::default()
    }

    fn chat_with_system<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        message: &'a str,
        model: &'a str,
        temperature: f64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;

    /// Chat with tool definitions attached. Providers without tool calling
    /// flatten the transcript and answer in plain text.
    fn chat_with_tools<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        messages: &'a [ProviderMessage],
        _tools: &'a [ActionSpec],
        _tool_choice: &'a ToolChoice,
        model: &'a str,
        temperature: f64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ProviderResponse>> + Send + 'a>> {
        Box::pin(async move {
            let text = messages_to_text(messages);
            let reply = self
                .chat_with_system(system_prompt, &text, model, temperature)
                .await?;
            Ok(ProviderResponse::text_only(reply))
        })
    }

    fn supports_tool_calling(&self) -> bool {
        self.capabilities().tool_calling
    }
}
