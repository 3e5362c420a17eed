//! Execution drivers.
//!
//! A driver runs a resolved [`ToolEntry`]. Exactly one driver is active per
//! process, chosen from `agent.execution_mode` at startup.

mod local;

pub use local::LocalDriver;

use async_trait::async_trait;
use baton_core::error::ToolError;
use baton_core::tool::{ToolArgs, ToolEntry};

/// Runs tool capabilities and renders their outcome as model-facing text.
#[async_trait]
pub trait ExecutionDriver: Send + Sync {
    /// Short name used in logs ("local", "isolated").
    fn name(&self) -> &str;

    /// Execute `entry` with already-validated `args`.
    ///
    /// An `Err` means the driver itself failed; the dispatcher turns it into
    /// a textual result.
    async fn execute(&self, entry: &ToolEntry, args: ToolArgs) -> Result<String, ToolError>;
}
