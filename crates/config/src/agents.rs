//! Agent definition files.
//!
//! Each agent lives in its own TOML file:
//!
//! ```toml
//! [agent]
//! name = "triage"
//! description = "Routes requests to the right specialist"
//! system_prompt = "You are a triage agent..."
//! tools = ["core_bash"]
//! handoffs = ["billing"]
//!
//! [agent.llm]
//! model = "gpt-4o-mini"
//! temperature = 0.2
//! ```
//!
//! Any other key under `[agent]` is kept in the definition's extension config.

use crate::{ConfigError, LlmConfig};
use baton_core::agent::{AgentDefinition, AgentRegistry, ModelConfig};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct AgentFile {
    agent: RawAgent,
}

#[derive(Debug, Deserialize)]
struct RawAgent {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    system_prompt: String,
    #[serde(default)]
    tools: Vec<String>,
    #[serde(default)]
    handoffs: Vec<String>,
    #[serde(default)]
    llm: RawLlm,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLlm {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

/// Parse an agent definition from TOML text, filling model settings from `defaults`.
pub fn parse_agent(content: &str, defaults: &LlmConfig) -> Result<AgentDefinition, toml::de::Error> {
    let file: AgentFile = toml::from_str(content)?;
    let raw = file.agent;

    Ok(AgentDefinition {
        name: raw.name.unwrap_or_else(|| "unnamed_agent".into()),
        description: raw.description,
        system_prompt: raw.system_prompt,
        tools: raw.tools,
        handoffs: raw.handoffs,
        model: ModelConfig {
            model: raw.llm.model.unwrap_or_else(|| defaults.model.clone()),
            temperature: raw.llm.temperature.unwrap_or(defaults.temperature),
            max_tokens: raw.llm.max_tokens.or(Some(defaults.max_tokens)),
        },
        config: raw.extra,
    })
}

/// Load one agent definition file.
pub fn load_agent_file(path: &Path, defaults: &LlmConfig) -> Result<AgentDefinition, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_agent(&content, defaults).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load every `*.toml` file in `dir` into a registry.
///
/// Files that fail to parse are skipped with a warning; a missing directory
/// yields an empty registry.
pub fn load_agents_dir(dir: &Path, defaults: &LlmConfig) -> Result<AgentRegistry, ConfigError> {
    let mut registry = AgentRegistry::new();
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "Agents directory not found");
        return Ok(registry);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::ReadError {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut paths: Vec<_> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    for path in paths {
        match load_agent_file(&path, defaults) {
            Ok(agent) => {
                debug!(agent = %agent.name, path = %path.display(), "Loaded agent definition");
                registry.register(agent);
            }
            Err(e) => warn!(error = %e, "Skipping invalid agent definition"),
        }
    }

    Ok(registry)
}
