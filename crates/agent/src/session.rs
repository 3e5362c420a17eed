//! Session orchestration: one conversation, a chain of agents.

use crate::engine::{AgentEngine, DEFAULT_MAX_ITERATIONS, RunOutcome};
use crate::handoff;
use crate::stream_event::{AgentStreamEvent, EventSender, emit};
use baton_core::agent::{AgentDefinition, AgentRegistry};
use baton_core::error::HandoffError;
use baton_core::message::{Conversation, Message};
use baton_core::provider::{Provider, ToolDefinition};
use baton_core::snapshot;
use baton_core::tool::ToolRegistry;
use baton_tools::ToolDispatcher;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Settings that replace the starting agent's own before the first turn.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub tools: Option<Vec<String>>,
}

/// Pick the starting agent by name, falling back to the built-in chat agent.
pub fn resolve_agent(agents: &AgentRegistry, name: Option<&str>) -> AgentDefinition {
    match name {
        Some(name) => match agents.get(name) {
            Some(agent) => {
                info!(agent = %name, "Using agent from registry");
                (*agent).clone()
            }
            None => {
                warn!(agent = %name, "Agent not found in registry, using fallback");
                AgentDefinition::fallback()
            }
        },
        None => {
            info!("No agent specified, using fallback");
            AgentDefinition::fallback()
        }
    }
}

/// Apply bootstrap overrides.
///
/// Tools resolve in order: explicit override, the agent's own list,
/// `default_tools`, then every registered tool.
pub fn apply_overrides(
    mut agent: AgentDefinition,
    overrides: &Overrides,
    default_tools: &[String],
    tools: &ToolRegistry,
) -> AgentDefinition {
    if let Some(model) = &overrides.model {
        agent.model.model = model.clone();
    }
    if let Some(temperature) = overrides.temperature {
        agent.model.temperature = temperature;
    }
    if let Some(max_tokens) = overrides.max_tokens {
        agent.model.max_tokens = Some(max_tokens);
    }

    if let Some(list) = &overrides.tools {
        agent.tools = list.clone();
    } else if agent.tools.is_empty() {
        agent.tools = if default_tools.is_empty() {
            tools.names().into_iter().map(String::from).collect()
        } else {
            default_tools.to_vec()
        };
    }

    agent
}

/// Result of one [`Session::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Agent active when the turn ended.
    pub agent: String,
    /// Final answer; `None` if the iteration budget ran out first.
    pub text: Option<String>,
    /// Iterations used across the whole handoff chain.
    pub iterations: u32,
}

/// A chat session.
///
/// Owns the conversation and the active agent. Each `send` runs engines
/// until one finishes without handing off; every engine in the chain shares
/// the conversation and the iteration budget.
pub struct Session {
    agents: Arc<AgentRegistry>,
    provider: Arc<dyn Provider>,
    dispatcher: ToolDispatcher,
    active: Arc<AgentDefinition>,
    conversation: Conversation,
    max_iterations: u32,
    workspace: PathBuf,
    events: Option<EventSender>,
}

impl Session {
    pub fn new(
        agent: AgentDefinition,
        provider: Arc<dyn Provider>,
        dispatcher: ToolDispatcher,
        agents: Arc<AgentRegistry>,
    ) -> Self {
        info!(
            agent = %agent.name,
            model = %agent.model.model,
            tools = ?agent.tools,
            "Initializing session"
        );
        Self {
            agents,
            provider,
            dispatcher,
            active: Arc::new(agent),
            conversation: Conversation::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            workspace: PathBuf::from("."),
            events: None,
        }
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Directory holding conversation snapshots.
    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace = workspace.into();
        self
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn active_agent(&self) -> &AgentDefinition {
        &self.active
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Handle one user request, following handoffs until an agent finishes.
    ///
    /// A handoff to an unknown agent records an error note in the history and
    /// fails with `Error::Handoff`; model failures propagate as `Error::Provider`.
    pub async fn send(&mut self, input: &str) -> baton_core::Result<Reply> {
        let mut input = input.to_string();
        let mut iterations = 0;

        loop {
            let mut engine = AgentEngine::new(
                self.active.clone(),
                self.provider.clone(),
                self.dispatcher.clone(),
                &self.agents,
            )
            .with_max_iterations(self.max_iterations)
            .with_iterations(iterations)
            .with_events(self.events.clone());

            let result = engine.run(&mut self.conversation, &input).await;
            iterations = engine.iterations();

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(agent = %self.active.name, error = %e, "Agent run failed");
                    emit(&self.events, AgentStreamEvent::Error { message: e.to_string() });
                    return Err(e);
                }
            };

            let request = match outcome {
                RunOutcome::Completed(text) => return Ok(self.finish(Some(text), iterations)),
                RunOutcome::Exhausted => return Ok(self.finish(None, iterations)),
                RunOutcome::Handoff(request) => request,
            };

            let from = self.active.name.clone();
            let Some(target) = self.agents.get(&request.target_agent) else {
                error!(from = %from, to = %request.target_agent, "Handoff target not found");
                self.conversation.push(
                    Message::tool_note(handoff::unknown_target_note(&request.target_agent))
                        .from_agent(&from),
                );
                let err = HandoffError::TargetNotFound(request.target_agent);
                emit(&self.events, AgentStreamEvent::Error { message: err.to_string() });
                return Err(err.into());
            };

            info!(from = %from, to = %target.name, reason = %request.reason, "Handoff");
            self.conversation.push(
                Message::tool_note(handoff::transfer_note(&from, &target.name, &request.reason))
                    .from_agent(&from),
            );
            emit(
                &self.events,
                AgentStreamEvent::AgentChange {
                    from,
                    to: target.name.clone(),
                    reason: request.reason,
                },
            );

            self.active = target;
            if iterations >= self.max_iterations {
                warn!(
                    agent = %self.active.name,
                    max_iterations = self.max_iterations,
                    "Iteration budget exhausted at handoff"
                );
                return Ok(self.finish(None, iterations));
            }
            input = handoff::CONTINUATION_INPUT.to_string();
        }
    }

    fn finish(&self, text: Option<String>, iterations: u32) -> Reply {
        emit(
            &self.events,
            AgentStreamEvent::Done {
                agent: self.active.name.clone(),
                iterations,
            },
        );
        Reply {
            agent: self.active.name.clone(),
            text,
            iterations,
        }
    }

    /// Clear the history back to the active agent's system prompt.
    pub fn clear_history(&mut self) {
        self.conversation.reset(Some(self.active.system_prompt.as_str()));
        info!(agent = %self.active.name, "Conversation cleared");
    }

    /// Save the conversation to `<workspace>/<name>.json` (default `session.json`).
    pub fn save(&self, name: Option<&str>) -> baton_core::Result<PathBuf> {
        let path = snapshot::snapshot_path(&self.workspace, name);
        snapshot::save(&self.conversation, &path)?;
        info!(path = %path.display(), messages = self.conversation.len(), "Conversation saved");
        Ok(path)
    }

    /// Replace the conversation with a saved snapshot; returns the message count.
    pub fn load(&mut self, name: Option<&str>) -> baton_core::Result<usize> {
        let path = snapshot::snapshot_path(&self.workspace, name);
        let messages = snapshot::load(&path)?;
        self.conversation.load(messages);
        info!(path = %path.display(), messages = self.conversation.len(), "Conversation loaded");
        Ok(self.conversation.len())
    }

    /// Make `name` the active agent, keeping the history.
    ///
    /// An agent without its own tools keeps the current tool list.
    pub fn switch_agent(&mut self, name: &str) -> baton_core::Result<&AgentDefinition> {
        let Some(agent) = self.agents.get(name) else {
            warn!(agent = %name, "Agent not found");
            return Err(HandoffError::TargetNotFound(name.to_string()).into());
        };

        let mut next = (*agent).clone();
        if next.tools.is_empty() {
            next.tools = self.active.tools.clone();
        }
        info!(from = %self.active.name, to = %next.name, "Switched agent");
        self.active = Arc::new(next);
        Ok(self.active.as_ref())
    }

    /// Tools the active agent may call, in its declared order.
    pub fn tools_info(&self) -> Vec<ToolDefinition> {
        self.dispatcher.registry().definitions_for(&self.active.tools)
    }
}
