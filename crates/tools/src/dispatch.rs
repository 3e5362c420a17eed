//! Tool dispatch: name → capability → driver.

use crate::driver::ExecutionDriver;
use baton_core::error::ToolError;
use baton_core::tool::{ToolArgs, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves tool calls against the capability table and runs them through
/// the active driver.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    driver: Arc<dyn ExecutionDriver>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, driver: Arc<dyn ExecutionDriver>) -> Self {
        Self { registry, driver }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }

    /// Execute a tool by name.
    ///
    /// Fails only for an unknown tool or arguments that don't match its
    /// declared parameters. Driver failures come back as
    /// `Ok("Failed to execute tool: <reason>")`.
    pub async fn execute(&self, name: &str, args: ToolArgs) -> Result<String, ToolError> {
        let entry = self.registry.resolve(name)?;
        entry.spec.validate(&args)?;

        debug!(tool = %name, driver = %self.driver.name(), "Dispatching tool");

        match self.driver.execute(entry, args).await {
            Ok(output) => Ok(output),
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool execution failed");
                Ok(format!("Failed to execute tool: {}", failure_reason(&e)))
            }
        }
    }
}

fn failure_reason(error: &ToolError) -> String {
    match error {
        ToolError::ExecutionFailed { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}
