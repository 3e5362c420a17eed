//! Executor worker for Baton.
//!
//! The worker owns its own tool registry and runs tools on behalf of agent
//! processes that selected the `isolated` execution mode. Agents talk to it
//! through a Unix-domain socket, one base64-encoded JSON request per
//! connection.

pub mod client;
pub mod isolated;
pub mod protocol;
pub mod server;

pub use client::ExecutorClient;
pub use isolated::IsolatedDriver;
pub use protocol::{Command, ExecutorRequest, ExecutorResponse, FrameError, Status};
pub use server::{DEFAULT_READ_TIMEOUT, ExecutorServer, ExecutorService};

/// Default socket location.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/baton/executor.sock";
