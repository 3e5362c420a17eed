//! Configuration loading, validation, and management for Baton.
//!
//! Loads configuration from `~/.baton/config.toml` with environment
//! variable overrides. Validates all settings at startup.

pub mod agents;

pub use agents::{load_agent_file, load_agents_dir};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The root configuration structure.
///
/// Maps directly to `~/.baton/config.toml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model client settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Conversation snapshot storage
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Executor worker settings
    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("llm", &self.llm)
            .field("agent", &self.agent)
            .field("memory", &self.memory)
            .field("executor", &self.executor)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key for the model endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Where tool calls run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// In the agent's own process
    #[default]
    Local,
    /// In the executor worker, over its socket
    Isolated,
}

impl FromStr for ExecutionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "isolated" => Ok(Self::Isolated),
            other => Err(ConfigError::ValidationError(format!(
                "Invalid execution mode: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Iteration budget shared by a whole handoff chain
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default)]
    pub execution_mode: ExecutionMode,

    /// Agent to start sessions with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_agent: Option<String>,

    /// Directory of `*.toml` agent definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents_dir: Option<PathBuf>,

    /// Tools granted to agents that declare none
    #[serde(default)]
    pub default_tools: Vec<String>,
}

fn default_max_iterations() -> u32 {
    100
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            execution_mode: ExecutionMode::default(),
            default_agent: None,
            agents_dir: None,
            default_tools: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Directory for conversation snapshots
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,
}

fn default_workspace() -> PathBuf {
    AppConfig::config_dir().join("workspace")
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            workspace: default_workspace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,

    /// How long a client waits for a response
    #[serde(default = "default_executor_timeout")]
    pub timeout_secs: u64,
}

fn default_socket_path() -> PathBuf {
    PathBuf::from("/tmp/baton/executor.sock")
}
fn default_executor_timeout() -> u64 {
    30
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            timeout_secs: default_executor_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path with environment overrides.
    ///
    /// Priority: env vars > config file > defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(key) = std::env::var("BATON_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY")) {
            self.llm.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("BATON_MODEL") {
            self.llm.model = model;
        }
        if let Ok(mode) = std::env::var("BATON_EXECUTION_MODE") {
            self.agent.execution_mode = mode.parse()?;
        }
        if let Ok(socket) = std::env::var("BATON_EXECUTOR_SOCKET") {
            self.executor.socket_path = PathBuf::from(socket);
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".baton")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be > 0".into(),
            ));
        }

        if self.executor.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "executor.timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.llm.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.max_iterations, 100);
        assert_eq!(config.agent.execution_mode, ExecutionMode::Local);
        assert_eq!(
            config.executor.socket_path,
            PathBuf::from("/tmp/baton/executor.sock")
        );
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.llm.model, config.llm.model);
        assert_eq!(parsed.agent.max_iterations, config.agent.max_iterations);
        assert_eq!(parsed.executor.timeout_secs, config.executor.timeout_secs);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.llm.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iteration_budget_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[agent]
max_iterations = 7
execution_mode = "isolated"
default_agent = "triage"

[executor]
socket_path = "/run/baton.sock"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.agent.max_iterations, 7);
        assert_eq!(config.agent.execution_mode, ExecutionMode::Isolated);
        assert_eq!(config.agent.default_agent.as_deref(), Some("triage"));
        assert_eq!(config.executor.socket_path, PathBuf::from("/run/baton.sock"));
        assert_eq!(config.executor.timeout_secs, 30);
        assert_eq!(config.llm.max_tokens, 4096);
    }

    #[test]
    fn execution_mode_parsing() {
        assert_eq!("local".parse::<ExecutionMode>().unwrap(), ExecutionMode::Local);
        assert_eq!("Isolated".parse::<ExecutionMode>().unwrap(), ExecutionMode::Isolated);
        assert!("cloud".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("max_iterations = 100"));
        assert!(toml_str.contains("executor.sock"));
    }
}
