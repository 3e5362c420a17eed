//! Execution driver that delegates every tool to the executor worker.

use crate::client::ExecutorClient;
use crate::protocol::Status;
use async_trait::async_trait;
use baton_core::error::ToolError;
use baton_core::tool::{ToolArgs, ToolEntry, value_to_text};
use baton_tools::ExecutionDriver;
use tracing::debug;

/// Forwards both shell and native tools as `execute` requests.
pub struct IsolatedDriver {
    client: ExecutorClient,
}

impl IsolatedDriver {
    pub fn new(client: ExecutorClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExecutionDriver for IsolatedDriver {
    fn name(&self) -> &str {
        "isolated"
    }

    async fn execute(&self, entry: &ToolEntry, args: ToolArgs) -> Result<String, ToolError> {
        debug!(tool = %entry.name(), kind = %entry.kind(), "Forwarding tool to executor");

        let response = self
            .client
            .execute(entry.name(), args)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: entry.name().to_string(),
                reason: e.to_string(),
            })?;

        Ok(match response.status {
            Status::Success => value_to_text(&response.message),
            Status::Error => format!("Error: {}", value_to_text(&response.message)),
        })
    }
}
