//! # Baton Core
//!
//! Domain types, traits, and error definitions for the Baton agent runtime.
//! This crate has no I/O framework dependencies; it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every seam is defined here as a trait or a plain data type:
//! - `Provider` is the model client boundary
//! - `ToolRegistry` is the capability table, built once at startup
//! - `Conversation` is the append-only context store
//!
//! Implementations live in their respective crates.

pub mod agent;
pub mod error;
pub mod message;
pub mod provider;
pub mod snapshot;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentDefinition, AgentRegistry, HandoffRequest, ModelConfig};
pub use error::{Error, Result};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{
    Capability, ParamSpec, ParamType, ToolArgs, ToolEntry, ToolKind, ToolRegistry,
    ToolSpec,
};
