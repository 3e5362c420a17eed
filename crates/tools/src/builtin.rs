//! Built-in tools.
//!
//! - `core_bash`: runs a shell command line (cli capability).
//! - `core_sum`: adds two numbers in-process (native capability).

use async_trait::async_trait;
use baton_core::error::ToolError;
use baton_core::tool::{NativeFunction, ParamSpec, ParamType, ToolArgs, ToolEntry, ToolSpec};
use serde_json::{Number, Value};

/// The `core_bash` tool: the `command` argument is the command line itself.
pub fn core_bash() -> ToolEntry {
    ToolEntry::shell(
        ToolSpec::new(
            "core_bash",
            "Execute a bash command and return its output. Use this for running programs, \
             inspecting files and checking the system.",
        )
        .param(ParamSpec::required(
            "command",
            ParamType::String,
            "The shell command to execute",
        )),
        render_bash,
    )
}

fn render_bash(args: &ToolArgs) -> Result<String, ToolError> {
    args.get("command")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::InvalidArguments {
            tool_name: "core_bash".into(),
            reason: "missing required argument 'command'".into(),
        })
}

/// The `core_sum` tool.
pub fn core_sum() -> ToolEntry {
    ToolEntry::native(
        ToolSpec::new("core_sum", "Add two numbers and return the result.")
            .param(ParamSpec::required("a", ParamType::Number, "First operand"))
            .param(ParamSpec::required("b", ParamType::Number, "Second operand")),
        Sum,
    )
}

struct Sum;

#[async_trait]
impl NativeFunction for Sum {
    async fn call(&self, args: ToolArgs) -> Result<Value, ToolError> {
        let operand = |key: &str| {
            args.get(key).ok_or_else(|| ToolError::InvalidArguments {
                tool_name: "core_sum".into(),
                reason: format!("missing required argument '{key}'"),
            })
        };
        let (a, b) = (operand("a")?, operand("b")?);

        // Integer inputs stay integers so 3 + 5 reports 8, not 8.0.
        if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
            return a.checked_add(b).map(Value::from).ok_or_else(|| {
                ToolError::ExecutionFailed {
                    tool_name: "core_sum".into(),
                    reason: "integer overflow".into(),
                }
            });
        }

        let sum = a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0);
        Number::from_f64(sum)
            .map(Value::Number)
            .ok_or_else(|| ToolError::ExecutionFailed {
                tool_name: "core_sum".into(),
                reason: "result is not a finite number".into(),
            })
    }
}
