//! Error types for the Baton domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all Baton operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Handoff errors ---
    #[error("Handoff error: {0}")]
    Handoff(#[from] HandoffError),

    // --- Snapshot errors ---
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool {0} not found")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("The socket was not found at {0}. The executor is not available")]
    Unavailable(PathBuf),

    #[error("Executor protocol error: {0}")]
    Protocol(String),

    #[error("Executor did not answer within {0}s")]
    Timeout(u64),

    #[error("Executor I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Error)]
pub enum HandoffError {
    #[error("Cannot transfer to '{0}': Agent not found")]
    TargetNotFound(String),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to access snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed snapshot {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
