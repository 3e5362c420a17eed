//! Agent definitions, handoff requests, and the agent registry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Model settings an agent runs with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier passed to the provider
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temp")]
    pub temperature: f32,

    /// Maximum tokens per response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temp() -> f32 {
    0.7
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".into(),
            temperature: default_temp(),
            max_tokens: None,
        }
    }
}

/// A named agent: prompt, tools, permitted handoff targets, and model settings.
///
/// Treated as immutable once loaded; sessions may override fields only while
/// bootstrapping, before the first turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub system_prompt: String,

    /// Names of tools from the capability table this agent may call
    #[serde(default)]
    pub tools: Vec<String>,

    /// Names of agents this agent may transfer control to
    #[serde(default)]
    pub handoffs: Vec<String>,

    #[serde(default)]
    pub model: ModelConfig,

    /// Extension settings not interpreted by the engine
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            system_prompt: system_prompt.into(),
            tools: Vec::new(),
            handoffs: Vec::new(),
            model: ModelConfig::default(),
            config: serde_json::Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_handoffs(mut self, handoffs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.handoffs = handoffs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    /// The general-purpose agent used when nothing else is configured.
    pub fn fallback() -> Self {
        Self::new(
            "DefaultChatAgent",
            "You are a helpful AI assistant with access to various tools.\n\
             When users ask you to perform tasks, use the available tools when appropriate.\n\
             Be concise, clear, and helpful in your responses.\n\
             Always explain what you're doing when using tools.",
        )
        .with_description("General purpose conversational agent")
    }
}

/// A request from a running agent to hand the conversation to another agent.
///
/// Produced by the engine and consumed by the session; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRequest {
    pub target_agent: String,
    pub reason: String,
}

/// All known agents, keyed by name. Built at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<AgentDefinition>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. Replaces any existing agent with the same name.
    pub fn register(&mut self, agent: AgentDefinition) {
        self.agents.insert(agent.name.clone(), Arc::new(agent));
    }

    pub fn get(&self, name: &str) -> Option<Arc<AgentDefinition>> {
        self.agents.get(name).cloned()
    }

    /// List all registered agent names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.agents.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_by_name() {
        let mut registry = AgentRegistry::new();
        registry.register(AgentDefinition::new("triage", "route").with_handoffs(["billing"]));
        registry.register(AgentDefinition::new("billing", "bill"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("triage").unwrap().handoffs, vec!["billing"]);
        assert!(registry.get("ghost").is_none());
        assert_eq!(registry.names(), vec!["billing", "triage"]);
    }

    #[test]
    fn fallback_agent_has_prompt() {
        let agent = AgentDefinition::fallback();
        assert_eq!(agent.name, "DefaultChatAgent");
        assert!(agent.system_prompt.contains("helpful AI assistant"));
        assert!(agent.tools.is_empty());
        assert!(agent.handoffs.is_empty());
    }

    #[test]
    fn model_config_defaults() {
        let cfg = ModelConfig::default();
        assert!((cfg.temperature - 0.7).abs() < f32::EPSILON);
        assert!(cfg.max_tokens.is_none());
    }
}
