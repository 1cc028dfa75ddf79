use super::types::{
    ChatRequest, ChatResponse, Message, OpenAiTool, OpenAiToolCall, OpenAiToolCallFunction,
    OpenAiToolDefinition, Usage,
};
use crate::actions::ActionSpec;
use crate::error::LlmError;
use crate::llm::scrub::api_error;
use crate::llm::types::{
    ContentBlock, MessageRole, ProviderMessage, ProviderResponse, StopReason, ToolChoice,
};
use serde_json::{Value, json};

pub(in crate::llm) fn build_request(
    system_prompt: Option<&str>,
    message: &str,
    model: &str,
    temperature: f64,
) -> ChatRequest {
    let capacity = if system_prompt.is_some() { 2 } else { 1 };
    let mut messages = Vec::with_capacity(capacity);

    if let Some(sys) = system_prompt {
        messages.push(build_text_message("system", sys.to_string()));
    }
    messages.push(build_text_message("user", message.to_string()));

    ChatRequest {
        model: model.to_string(),
        messages,
        temperature,
        tools: None,
        tool_choice: None,
    }
}

pub(in crate::llm) fn build_text_message(role: &'static str, content: String) -> Message {
    Message {
        role,
        content: Some(content),
        tool_call_id: None,
        tool_calls: None,
    }
}

pub(in crate::llm) fn map_provider_message(provider_message: &ProviderMessage) -> Vec<Message> {
    let mut text_parts = Vec::new();
    let mut assistant_tool_calls = Vec::new();
    let mut tool_messages = Vec::new();

    for block in &provider_message.content {
        match block {
            ContentBlock::Text { text } => text_parts.push(text.clone()),
            ContentBlock::ToolUse { id, name, input } => {
                assistant_tool_calls.push(OpenAiToolCall {
                    id: id.clone(),
                    r#type: "function".to_string(),
                    function: OpenAiToolCallFunction {
                        name: name.clone(),
                        arguments: input.to_string(),
                    },
                });
            }
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error: _,
            } => {
                tool_messages.push(Message {
                    role: "tool",
                    content: Some(content.clone()),
                    tool_call_id: Some(tool_use_id.clone()),
                    tool_calls: None,
                });
            }
        }
    }

    let mut messages = Vec::new();
    let text_content = if text_parts.is_empty() {
        None
    } else {
        Some(text_parts.join("\n"))
    };

    match provider_message.role {
        MessageRole::Assistant => {
            if text_content.is_some() || !assistant_tool_calls.is_empty() {
                messages.push(Message {
                    role: "assistant",
                    content: text_content,
                    tool_call_id: None,
                    tool_calls: if assistant_tool_calls.is_empty() {
                        None
                    } else {
                        Some(assistant_tool_calls)
                    },
                });
            }
        }
        MessageRole::User => {
            if let Some(content) = text_content {
                messages.push(build_text_message("user", content));
            }
        }
        MessageRole::System => {
            if let Some(content) = text_content {
                messages.push(build_text_message("system", content));
            }
        }
    }

    messages.extend(tool_messages);
    messages
}

pub(in crate::llm) fn build_openai_tools(tools: &[ActionSpec]) -> Option<Vec<OpenAiTool>> {
    if tools.is_empty() {
        return None;
    }
    Some(
        tools
            .iter()
            .map(|tool| OpenAiTool {
                r#type: "function",
                function: OpenAiToolDefinition {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                },
            })
            .collect(),
    )
}

pub(in crate::llm) fn tool_choice_value(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Auto => json!("auto"),
        ToolChoice::Required => json!("required"),
        ToolChoice::Function(name) => json!({"type": "function", "function": {"name": name}}),
    }
}

fn build_messages(system_prompt: Option<&str>, messages: &[ProviderMessage]) -> Vec<Message> {
    let mut openai_messages = Vec::new();

    if let Some(sys) = system_prompt {
        openai_messages.push(build_text_message("system", sys.to_string()));
    }

    for provider_message in messages {
        openai_messages.extend(map_provider_message(provider_message));
    }

    openai_messages
}

pub(in crate::llm) fn build_tools_request(
    system_prompt: Option<&str>,
    messages: &[ProviderMessage],
    tools: &[ActionSpec],
    tool_choice: &ToolChoice,
    model: &str,
    temperature: f64,
) -> ChatRequest {
    let tools = build_openai_tools(tools);
    let tool_choice = tools.as_ref().map(|_| tool_choice_value(tool_choice));
    ChatRequest {
        model: model.to_string(),
        messages: build_messages(system_prompt, messages),
        temperature,
        tools,
        tool_choice,
    }
}

pub(in crate::llm) fn map_finish_reason(finish_reason: Option<&str>) -> StopReason {
    match finish_reason {
        Some("stop") => StopReason::EndTurn,
        Some("tool_calls") => StopReason::ToolUse,
        Some("length") => StopReason::MaxTokens,
        Some(_) | None => StopReason::Error,
    }
}

pub(in crate::llm) fn parse_tool_calls(
    tool_calls: Option<Vec<OpenAiToolCall>>,
    provider_name: &str,
) -> Vec<ContentBlock> {
    tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tool_call| {
            let input = serde_json::from_str::<Value>(&tool_call.function.arguments)
                .unwrap_or_else(|e| {
                    // Keep the raw text so the caller can report it back to the model.
                    tracing::warn!(
                        provider = provider_name,
                        tool = tool_call.function.name.as_str(),
                        "tool call arguments were not valid JSON: {e}"
                    );
                    Value::String(tool_call.function.arguments.clone())
                });
            ContentBlock::ToolUse {
                id: tool_call.id,
                name: tool_call.function.name,
                input,
            }
        })
        .collect()
}

pub(in crate::llm) async fn send_chat_completions_json(
    client: &reqwest::Client,
    auth_header: Option<&String>,
    request: &ChatRequest,
    provider_name: &str,
    url: &str,
) -> anyhow::Result<ChatResponse> {
    let auth_header = auth_header.ok_or_else(|| LlmError::MissingApiKey {
        provider: provider_name.to_string(),
    })?;

    let response = client
        .post(url)
        .header("Authorization", auth_header)
        .json(request)
        .send()
        .await
        .map_err(|error| LlmError::Request {
            provider: provider_name.to_string(),
            message: error.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(api_error(provider_name, response).await);
    }

    response.json().await.map_err(|error| {
        LlmError::Decode {
            provider: provider_name.to_string(),
            message: error.to_string(),
        }
        .into()
    })
}

fn provider_response_with_usage(text: String, usage: Option<&Usage>) -> ProviderResponse {
    if let Some(usage) = usage {
        ProviderResponse::with_usage(text, usage.prompt_tokens, usage.completion_tokens)
    } else {
        ProviderResponse::text_only(text)
    }
}

pub(in crate::llm) fn build_text_provider_response(
    chat_response: ChatResponse,
    provider_name: &str,
) -> anyhow::Result<String> {
    chat_response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow::anyhow!("No response from {provider_name}"))
}

pub(in crate::llm) fn build_tool_provider_response(
    chat_response: ChatResponse,
    provider_name: &str,
) -> anyhow::Result<ProviderResponse> {
    let ChatResponse {
        choices,
        usage,
        model,
    } = chat_response;
    let choice = choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No response from {provider_name}"))?;

    let text = choice.message.content.unwrap_or_default();
    let mut content_blocks = parse_tool_calls(choice.message.tool_calls, provider_name);

    if !text.is_empty() {
        content_blocks.insert(0, ContentBlock::Text { text: text.clone() });
    }

    let mut provider_response = provider_response_with_usage(text, usage.as_ref());
    provider_response.content_blocks = content_blocks;
    provider_response.stop_reason = Some(map_finish_reason(choice.finish_reason.as_deref()));

    if let Some(api_model) = model {
        provider_response = provider_response.with_model(api_model);
    }

    Ok(provider_response)
}
