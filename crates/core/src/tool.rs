//! Tool capability table: what the agent can do, keyed by name.
//!
//! Every tool is a [`ToolEntry`]: a statically declared [`ToolSpec`] (used for
//! both the model-facing JSON schema and argument validation) plus a
//! [`Capability`] saying how it runs. The [`ToolRegistry`] is built once at
//! startup and shared read-only behind an `Arc`.

use crate::error::ToolError;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// JSON-shaped arguments passed to a tool.
pub type ToolArgs = Map<String, Value>;

/// The JSON type of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: description.into(),
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }
}

/// The static description of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// JSON Schema for the parameters object.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.params {
            let mut prop = Map::new();
            prop.insert("type".into(), Value::from(p.kind.as_str()));
            if !p.description.is_empty() {
                prop.insert("description".into(), Value::from(p.description.clone()));
            }
            properties.insert(p.name.clone(), Value::Object(prop));
        }
        let required: Vec<Value> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| Value::from(p.name.clone()))
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Convert this spec into a ToolDefinition for sending to the LLM.
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters_schema(),
        }
    }

    /// Check `args` against the declared parameters before invocation.
    pub fn validate(&self, args: &ToolArgs) -> Result<(), ToolError> {
        for p in &self.params {
            match args.get(&p.name) {
                None | Some(Value::Null) if p.required => {
                    return Err(ToolError::InvalidArguments {
                        tool_name: self.name.clone(),
                        reason: format!("missing required argument '{}'", p.name),
                    });
                }
                Some(value) if !value.is_null() && !p.kind.matches(value) => {
                    return Err(ToolError::InvalidArguments {
                        tool_name: self.name.clone(),
                        reason: format!("argument '{}' must be of type {}", p.name, p.kind.as_str()),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Renders a shell command line from tool arguments.
pub trait CommandTemplate: Send + Sync {
    fn render(&self, args: &ToolArgs) -> Result<String, ToolError>;
}

impl<F> CommandTemplate for F
where
    F: Fn(&ToolArgs) -> Result<String, ToolError> + Send + Sync,
{
    fn render(&self, args: &ToolArgs) -> Result<String, ToolError> {
        self(args)
    }
}

/// A function executed directly by the host process.
#[async_trait]
pub trait NativeFunction: Send + Sync {
    async fn call(&self, args: ToolArgs) -> Result<Value, ToolError>;
}

/// How a tool runs.
#[derive(Clone)]
pub enum Capability {
    /// Rendered into a command line and run by a shell.
    ShellCommand(Arc<dyn CommandTemplate>),
    /// Invoked in-process.
    NativeFunction(Arc<dyn NativeFunction>),
}

impl Capability {
    pub fn kind(&self) -> ToolKind {
        match self {
            Self::ShellCommand(_) => ToolKind::Cli,
            Self::NativeFunction(_) => ToolKind::Native,
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capability::{}", self.kind())
    }
}

/// Capability kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Cli,
    Native,
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => f.write_str("cli"),
            Self::Native => f.write_str("native"),
        }
    }
}

/// A registered tool: its spec plus how to run it.
#[derive(Debug, Clone)]
pub struct ToolEntry {
    pub spec: ToolSpec,
    pub capability: Capability,
}

impl ToolEntry {
    pub fn shell(spec: ToolSpec, template: impl CommandTemplate + 'static) -> Self {
        Self {
            spec,
            capability: Capability::ShellCommand(Arc::new(template)),
        }
    }

    pub fn native(spec: ToolSpec, function: impl NativeFunction + 'static) -> Self {
        Self {
            spec,
            capability: Capability::NativeFunction(Arc::new(function)),
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn kind(&self) -> ToolKind {
        self.capability.kind()
    }
}

/// Render a tool's JSON output as the text fed back to the model.
///
/// Strings are used verbatim; everything else is compact JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The tool capability table.
///
/// Populated during startup, then frozen behind an `Arc` and only read.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, entry: ToolEntry) {
        self.tools.insert(entry.spec.name.clone(), entry);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.tools.get(name)
    }

    /// Get a tool by name, failing with `ToolError::NotFound`.
    pub fn resolve(&self, name: &str) -> Result<&ToolEntry, ToolError> {
        self.get(name).ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// Get all tool definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = self.tools.values().map(|t| t.spec.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Definitions for the named tools, in the given order.
    ///
    /// Unknown names are skipped with a warning.
    pub fn definitions_for(&self, names: &[String]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|name| match self.get(name) {
                Some(entry) => Some(entry.spec.to_definition()),
                None => {
                    warn!(tool = %name, "Declared tool is not registered, skipping");
                    None
                }
            })
            .collect()
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
