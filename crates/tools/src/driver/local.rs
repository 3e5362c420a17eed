//! In-process driver: shell commands as child processes, native functions awaited directly.

use super::ExecutionDriver;
use async_trait::async_trait;
use baton_core::error::ToolError;
use baton_core::tool::{Capability, ToolArgs, ToolEntry, value_to_text};
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDriver;

impl LocalDriver {
    pub fn new() -> Self {
        Self
    }

    /// Run a capability and return its raw JSON result.
    ///
    /// Shell commands yield their trimmed stdout as a string; a non-zero exit
    /// is still `Ok`, carrying `Error: <stderr>`.
    pub async fn invoke(&self, entry: &ToolEntry, args: ToolArgs) -> Result<Value, ToolError> {
        match &entry.capability {
            Capability::ShellCommand(template) => {
                let command = template.render(&args)?;
                run_shell(entry.name(), &command).await.map(Value::String)
            }
            Capability::NativeFunction(function) => {
                debug!(tool = %entry.name(), "Calling native tool");
                function.call(args).await
            }
        }
    }
}

async fn run_shell(tool_name: &str, command: &str) -> Result<String, ToolError> {
    debug!(tool = %tool_name, command = %command, "Executing shell command");

    let output = if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", command]).output().await
    } else {
        Command::new("sh").args(["-c", command]).output().await
    };

    let output = output.map_err(|e| ToolError::ExecutionFailed {
        tool_name: tool_name.to_string(),
        reason: e.to_string(),
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        warn!(tool = %tool_name, exit_code = code, "Command failed");
        return Ok(format!("Error: {}", stderr.trim()));
    }

    let stdout = stdout.trim();
    let stderr = stderr.trim();
    if stderr.is_empty() {
        Ok(stdout.to_string())
    } else {
        Ok(format!("{stdout}\n[stderr]: {stderr}"))
    }
}

#[async_trait]
impl ExecutionDriver for LocalDriver {
    fn name(&self) -> &str {
        "local"
    }

    async fn execute(&self, entry: &ToolEntry, args: ToolArgs) -> Result<String, ToolError> {
        self.invoke(entry, args).await.map(|value| value_to_text(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{core_bash, core_sum};
    use serde_json::json;

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().unwrap_or_default()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_echo() {
        let out = LocalDriver
            .execute(&core_bash(), args(json!({"command": "echo hello"})))
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_failure_reports_stderr() {
        let out = LocalDriver
            .execute(
                &core_bash(),
                args(json!({"command": "echo boom >&2; exit 3"})),
            )
            .await
            .unwrap();
        assert_eq!(out, "Error: boom");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_success_keeps_stderr_note() {
        let out = LocalDriver
            .execute(
                &core_bash(),
                args(json!({"command": "echo out; echo warn >&2"})),
            )
            .await
            .unwrap();
        assert_eq!(out, "out\n[stderr]: warn");
    }

    #[tokio::test]
    async fn native_result_is_raw_json() {
        let value = LocalDriver
            .invoke(&core_sum(), args(json!({"a": 3, "b": 5})))
            .await
            .unwrap();
        assert_eq!(value, json!(8));

        let text = LocalDriver
            .execute(&core_sum(), args(json!({"a": 3, "b": 5})))
            .await
            .unwrap();
        assert_eq!(text, "8");
    }
}
