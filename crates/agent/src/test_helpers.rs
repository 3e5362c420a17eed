//! Shared test helpers for engine and session tests.

use baton_core::agent::{AgentDefinition, AgentRegistry};
use baton_core::error::ProviderError;
use baton_core::message::{Message, MessageToolCall};
use baton_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use baton_tools::{LocalDriver, ToolDispatcher};
use std::sync::{Arc, Mutex};

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and records
/// the request. Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let count = requests.len();

        if count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                count,
                responses.len()
            );
        }

        requests.push(request);
        Ok(responses[count].clone())
    }
}

/// A provider whose every call fails.
pub struct FailingProvider;

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

pub fn text(content: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(content),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn calls(tool_calls: Vec<MessageToolCall>) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant("").with_tool_calls(tool_calls),
        usage: None,
        model: "mock-model".into(),
    }
}

pub fn call(id: &str, name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall::new(id, name, args)
}

pub fn dispatcher() -> ToolDispatcher {
    ToolDispatcher::new(
        Arc::new(baton_tools::default_registry()),
        Arc::new(LocalDriver::new()),
    )
}

/// `triage` may hand off to `billing`; both can use `core_sum`.
pub fn agents() -> Arc<AgentRegistry> {
    let mut registry = AgentRegistry::new();
    registry.register(
        AgentDefinition::new("triage", "You route requests.")
            .with_description("Routes requests")
            .with_tools(["core_sum"])
            .with_handoffs(["billing"]),
    );
    registry.register(
        AgentDefinition::new("billing", "You handle billing.")
            .with_description("Handles invoices and refunds")
            .with_tools(["core_sum"]),
    );
    Arc::new(registry)
}
