//! The per-agent turn loop.

use crate::handoff;
use crate::stream_event::{AgentStreamEvent, EventSender, emit};
use baton_core::agent::{AgentDefinition, AgentRegistry, HandoffRequest};
use baton_core::message::{Conversation, Message};
use baton_core::provider::{Provider, ProviderRequest, ToolDefinition};
use baton_tools::ToolDispatcher;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// How an engine run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The model answered without tool calls; carries the answer.
    Completed(String),
    /// The iteration budget ran out before a final answer.
    Exhausted,
    /// The agent asked to transfer control.
    Handoff(HandoffRequest),
}

/// Runs one agent against a shared conversation.
pub struct AgentEngine {
    agent: Arc<AgentDefinition>,
    provider: Arc<dyn Provider>,
    dispatcher: ToolDispatcher,
    tool_definitions: Vec<ToolDefinition>,
    max_iterations: u32,
    iterations: u32,
    events: Option<EventSender>,
}

impl AgentEngine {
    /// Create an engine for `agent`.
    ///
    /// The model sees the agent's declared tools followed by one handoff tool
    /// per permitted target; `agents` supplies the target descriptions.
    pub fn new(
        agent: Arc<AgentDefinition>,
        provider: Arc<dyn Provider>,
        dispatcher: ToolDispatcher,
        agents: &AgentRegistry,
    ) -> Self {
        let mut tool_definitions = dispatcher.registry().definitions_for(&agent.tools);
        tool_definitions.extend(handoff::definitions(&agent, agents));

        Self {
            agent,
            provider,
            dispatcher,
            tool_definitions,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            iterations: 0,
            events: None,
        }
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Start the counter at `iterations` (carried over from a previous agent).
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_events(mut self, events: Option<EventSender>) -> Self {
        self.events = events;
        self
    }

    /// Iterations used so far, including any carried over.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn tool_definitions(&self) -> &[ToolDefinition] {
        &self.tool_definitions
    }

    /// Run the loop for one input.
    ///
    /// Tool failures are written into the conversation and the loop goes on;
    /// only a model failure is returned as an error.
    pub async fn run(
        &mut self,
        conversation: &mut Conversation,
        input: &str,
    ) -> baton_core::Result<RunOutcome> {
        let agent_name = self.agent.name.clone();

        if !input.is_empty() {
            conversation.push(Message::user(input).from_agent(&agent_name));
        }

        info!(
            agent = %agent_name,
            messages = conversation.len(),
            iterations = self.iterations,
            "Running agent"
        );

        while self.iterations < self.max_iterations {
            debug!(agent = %agent_name, iteration = self.iterations, "Agent loop iteration");

            let request = ProviderRequest {
                model: self.agent.model.model.clone(),
                messages: conversation.model_context(Some(self.agent.system_prompt.as_str())),
                temperature: self.agent.model.temperature,
                max_tokens: self.agent.model.max_tokens,
                tools: self.tool_definitions.clone(),
            };

            let response = self.provider.complete(request).await?;

            if !response.is_tool_call() {
                let answer = response.content().to_string();
                conversation.push(response.message.from_agent(&agent_name));
                emit(
                    &self.events,
                    AgentStreamEvent::Text {
                        agent: agent_name,
                        content: answer.clone(),
                    },
                );
                return Ok(RunOutcome::Completed(answer));
            }

            let tool_calls = response.message.tool_calls.clone();
            debug!(agent = %agent_name, tool_count = tool_calls.len(), "Executing tool calls");
            conversation.push(response.message.from_agent(&agent_name));

            for call in &tool_calls {
                let args = call.parsed_arguments();
                emit(
                    &self.events,
                    AgentStreamEvent::ToolCall {
                        agent: agent_name.clone(),
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: serde_json::Value::Object(args.clone()),
                    },
                );

                if let Some(target) = handoff::target_of(&call.name) {
                    let reason = handoff::reason_of(&args);
                    info!(from = %agent_name, to = %target, reason = %reason, "Handoff requested");

                    conversation.push(
                        Message::tool_result(&call.id, &call.name, handoff::acknowledgment(target))
                            .from_agent(&agent_name),
                    );
                    // Handoffs count against the iteration budget.
                    self.iterations += 1;
                    return Ok(RunOutcome::Handoff(HandoffRequest {
                        target_agent: target.to_string(),
                        reason,
                    }));
                }

                let output = match self.dispatcher.execute(&call.name, args).await {
                    Ok(output) => output,
                    Err(e) => {
                        warn!(agent = %agent_name, tool = %call.name, error = %e, "Tool call failed");
                        format!("Error: {e}")
                    }
                };

                emit(
                    &self.events,
                    AgentStreamEvent::ToolResult {
                        agent: agent_name.clone(),
                        id: call.id.clone(),
                        name: call.name.clone(),
                        output: output.clone(),
                    },
                );
                conversation.push(
                    Message::tool_result(&call.id, &call.name, output).from_agent(&agent_name),
                );
            }

            self.iterations += 1;
        }

        warn!(
            agent = %agent_name,
            max_iterations = self.max_iterations,
            "Iteration budget exhausted"
        );
        Ok(RunOutcome::Exhausted)
    }
}
