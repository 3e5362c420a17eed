//! Message and Conversation domain types.
//!
//! These are the core value objects that flow through the entire system:
//! user input → Session → AgentEngine → Provider → tool results → back into the conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions
    System,
    /// Tool execution result
    Tool,
}

/// A single message in a conversation.
///
/// The serialized form is also the conversation snapshot format, so field
/// order and optionality here are part of the on-disk contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    #[serde(default)]
    pub content: String,

    /// When the message was appended
    pub timestamp: DateTime<Utc>,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// If this is a tool result, the name of the tool that produced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The agent that produced this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
            agent_name: None,
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a tool result message answering `tool_call_id`.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut msg = Self::with_role(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg.name = Some(tool_name.into());
        msg
    }

    /// Create a tool-role note that does not answer any call (orchestrator notices).
    pub fn tool_note(content: impl Into<String>) -> Self {
        Self::with_role(Role::Tool, content)
    }

    /// Tag the message with the agent that produced it.
    pub fn from_agent(mut self, agent_name: impl Into<String>) -> Self {
        self.agent_name = Some(agent_name.into());
        self
    }

    /// Attach the tool calls the assistant requested.
    pub fn with_tool_calls(mut self, tool_calls: Vec<MessageToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as JSON string
    pub arguments: String,
}

impl MessageToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.to_string(),
        }
    }

    /// Parse the argument string into a JSON object.
    ///
    /// Anything that is not a JSON object (including malformed JSON) yields an
    /// empty object so the callee reports missing arguments itself.
    pub fn parsed_arguments(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::from_str(&self.arguments) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// The conversation context store: an ordered, append-only message log.
///
/// Besides `push`, the only mutations are a full replace (`load`) and a full
/// reset (`reset`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a conversation from an existing ordered message list.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Append a message to the conversation.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replace the whole history.
    pub fn load(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Clear the history, keeping only `system_prompt` (if any) as a system message.
    pub fn reset(&mut self, system_prompt: Option<&str>) {
        self.messages.clear();
        if let Some(prompt) = system_prompt.filter(|p| !p.is_empty()) {
            self.messages.push(Message::system(prompt));
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Produce the message list sent to the model: the system prompt first,
    /// then the full chronological history.
    ///
    /// The prompt is not repeated when the history already opens with it
    /// (a conversation freshly `reset` to that prompt).
    pub fn model_context(&self, system_prompt: Option<&str>) -> Vec<Message> {
        let mut context = Vec::with_capacity(self.messages.len() + 1);
        if let Some(prompt) = system_prompt.filter(|p| !p.is_empty()) {
            let already_first = self
                .messages
                .first()
                .is_some_and(|m| m.role == Role::System && m.content == prompt);
            if !already_first {
                context.push(Message::system(prompt));
            }
        }
        context.extend(self.messages.iter().cloned());
        context
    }

    /// Index of the first tool result whose `tool_call_id` does not match a call
    /// of the closest preceding assistant message.
    ///
    /// Tool notes without a call id are not correlated and never reported.
    pub fn first_uncorrelated_tool_result(&self) -> Option<usize> {
        let mut open_calls: &[MessageToolCall] = &[];
        for (idx, msg) in self.messages.iter().enumerate() {
            match msg.role {
                Role::Assistant => open_calls = &msg.tool_calls,
                Role::Tool => {
                    if let Some(call_id) = &msg.tool_call_id {
                        if !open_calls.iter().any(|c| &c.id == call_id) {
                            return Some(idx);
                        }
                    }
                }
                _ => {}
            }
        }
        None
    }
}
