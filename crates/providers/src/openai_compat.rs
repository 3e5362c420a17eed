//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM, LiteLLM proxies and any other
//! endpoint exposing `/v1/chat/completions` with function calling.

use async_trait::async_trait;
use baton_config::LlmConfig;
use baton_core::error::ProviderError;
use baton_core::provider::{Provider, ProviderRequest, ProviderResponse};
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const RATE_LIMIT_BACKOFF_SECS: u64 = 5;

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// The public OpenAI endpoint.
    pub fn openai(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Build a provider from the `[llm]` section of the app config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ProviderError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ProviderError::NotConfigured(
                "no API key; set llm.api_key, BATON_API_KEY or OPENAI_API_KEY".into(),
            )
        })?;
        Self::new("openai", config.api_base.clone(), api_key)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.bearer_auth(&self.api_key)
    }
}

/// Map a non-success HTTP status to a provider error.
fn status_error(status: u16, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: RATE_LIMIT_BACKOFF_SECS,
        },
        401 | 403 => ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = wire::ChatRequest::from(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "Sending completion request"
        );

        let response = self
            .authorized(self.client.post(self.endpoint("chat/completions")))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "Provider returned error");
            return Err(status_error(status.as_u16(), text));
        }

        let completion: wire::ChatResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: status.as_u16(),
                message: format!("Failed to parse response: {e}"),
            })?;

        completion.into_provider_response()
    }
}

/// Chat-completions wire format.
mod wire {
    use baton_core::error::ProviderError;
    use baton_core::message::{Message, MessageToolCall, Role};
    use baton_core::provider::{ProviderRequest, ProviderResponse, ToolDefinition, Usage};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize)]
    pub struct ChatRequest<'a> {
        pub model: &'a str,
        pub messages: Vec<ChatMessage>,
        pub temperature: f32,
        pub stream: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub max_tokens: Option<u32>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub tools: Vec<Tool<'a>>,
    }

    impl<'a> From<&'a ProviderRequest> for ChatRequest<'a> {
        fn from(request: &'a ProviderRequest) -> Self {
            Self {
                model: &request.model,
                messages: request.messages.iter().map(ChatMessage::from).collect(),
                temperature: request.temperature,
                stream: false,
                max_tokens: request.max_tokens,
                tools: request.tools.iter().map(Tool::from).collect(),
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub content: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub tool_calls: Option<Vec<FunctionCall>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub tool_call_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
    }

    impl From<&Message> for ChatMessage {
        /// Tool notes that answer no call (handoff notices) go out as system
        /// messages; the API rejects tool messages without a call id.
        fn from(message: &Message) -> Self {
            let role = match (message.role, &message.tool_call_id) {
                (Role::User, _) => "user",
                (Role::Assistant, _) => "assistant",
                (Role::System, _) | (Role::Tool, None) => "system",
                (Role::Tool, Some(_)) => "tool",
            };
            let calls: Vec<FunctionCall> =
                message.tool_calls.iter().map(FunctionCall::from).collect();

            Self {
                role: role.into(),
                content: Some(message.content.clone()),
                tool_calls: (!calls.is_empty()).then_some(calls),
                tool_call_id: message.tool_call_id.clone(),
                name: message.name.clone().filter(|_| message.role == Role::Tool),
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FunctionCall {
        pub id: String,
        #[serde(rename = "type", default = "function_kind")]
        pub kind: String,
        pub function: FunctionCallBody,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FunctionCallBody {
        pub name: String,
        pub arguments: String,
    }

    fn function_kind() -> String {
        "function".into()
    }

    impl From<&MessageToolCall> for FunctionCall {
        fn from(call: &MessageToolCall) -> Self {
            Self {
                id: call.id.clone(),
                kind: function_kind(),
                function: FunctionCallBody {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                },
            }
        }
    }

    impl From<FunctionCall> for MessageToolCall {
        fn from(call: FunctionCall) -> Self {
            Self {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            }
        }
    }

    #[derive(Debug, Serialize)]
    pub struct Tool<'a> {
        #[serde(rename = "type")]
        pub kind: &'static str,
        pub function: ToolSchema<'a>,
    }

    #[derive(Debug, Serialize)]
    pub struct ToolSchema<'a> {
        pub name: &'a str,
        pub description: &'a str,
        pub parameters: &'a serde_json::Value,
    }

    impl<'a> From<&'a ToolDefinition> for Tool<'a> {
        fn from(tool: &'a ToolDefinition) -> Self {
            Self {
                kind: "function",
                function: ToolSchema {
                    name: &tool.name,
                    description: &tool.description,
                    parameters: &tool.parameters,
                },
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct ChatResponse {
        pub model: String,
        pub choices: Vec<Choice>,
        pub usage: Option<TokenUsage>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Choice {
        pub message: ChatMessage,
    }

    #[derive(Debug, Deserialize)]
    pub struct TokenUsage {
        pub prompt_tokens: u32,
        pub completion_tokens: u32,
        pub total_tokens: u32,
    }

    impl ChatResponse {
        /// Take the first choice; an empty choice list is an API error.
        pub fn into_provider_response(self) -> Result<ProviderResponse, ProviderError> {
            let Some(choice) = self.choices.into_iter().next() else {
                return Err(ProviderError::ApiError {
                    status_code: 200,
                    message: "No choices in response".into(),
                });
            };

            let calls = choice
                .message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(MessageToolCall::from)
                .collect();

            Ok(ProviderResponse {
                message: Message::assistant(choice.message.content.unwrap_or_default())
                    .with_tool_calls(calls),
                usage: self.usage.map(|u| Usage {
                    prompt_tokens: u.prompt_tokens,
                    completion_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                }),
                model: self.model,
            })
        }
    }
}
