//! Agent-level streaming events.
//!
//! Engines emit events while they run; the session relays them unchanged and
//! adds its own (`agent_change`, `done`, `error`). Consumers receive them on a
//! `tokio::sync::mpsc` channel.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// Sending half for stream events.
pub type EventSender = UnboundedSender<AgentStreamEvent>;

/// Events emitted during a session turn.
///
/// - `text`         final assistant text of an agent run
/// - `tool_call`    an agent is invoking a tool
/// - `tool_result`  a tool finished
/// - `agent_change` control passed to another agent
/// - `done`         the turn is complete
/// - `error`        the turn failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    Text {
        agent: String,
        content: String,
    },

    ToolCall {
        agent: String,
        id: String,
        name: String,
        input: serde_json::Value,
    },

    ToolResult {
        agent: String,
        id: String,
        name: String,
        output: String,
    },

    AgentChange {
        from: String,
        to: String,
        reason: String,
    },

    Done {
        agent: String,
        iterations: u32,
    },

    Error {
        message: String,
    },
}

impl AgentStreamEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::AgentChange { .. } => "agent_change",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

/// Send `event` if anyone is listening. A dropped receiver is not an error.
pub(crate) fn emit(sender: &Option<EventSender>, event: AgentStreamEvent) {
    if let Some(tx) = sender {
        let _ = tx.send(event);
    }
}
