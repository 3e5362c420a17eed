//! Built-in tools, execution drivers and dispatch for Baton.
//!
//! Tools are declared once as [`ToolEntry`] values and collected into a
//! [`ToolRegistry`]. A [`ToolDispatcher`] resolves calls against that table
//! and hands them to the process-wide [`ExecutionDriver`].

pub mod builtin;
pub mod dispatch;
pub mod driver;

pub use dispatch::ToolDispatcher;
pub use driver::{ExecutionDriver, LocalDriver};

use baton_core::tool::{ToolEntry, ToolRegistry};

/// All built-in tools.
pub fn builtin_tools() -> Vec<ToolEntry> {
    vec![builtin::core_bash(), builtin::core_sum()]
}

/// Create a tool registry with every built-in tool.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for entry in builtin_tools() {
        registry.register(entry);
    }
    registry
}
