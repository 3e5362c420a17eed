//! Client side of the executor protocol.

use crate::protocol::{ExecutorRequest, ExecutorResponse, decode_frame, encode_frame, read_frame};
use baton_core::error::ExecutorError;
use baton_core::tool::ToolArgs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ExecutorClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl ExecutorClient {
    pub fn new(socket_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send one request on a fresh connection and wait for its response.
    ///
    /// A missing socket file fails fast with `ExecutorError::Unavailable`;
    /// the whole exchange is bounded by the client timeout.
    pub async fn send(&self, request: &ExecutorRequest) -> Result<ExecutorResponse, ExecutorError> {
        if !self.socket_path.exists() {
            return Err(ExecutorError::Unavailable(self.socket_path.clone()));
        }

        debug!(command = ?request.command, socket = %self.socket_path.display(), "Sending executor request");

        tokio::time::timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| ExecutorError::Timeout(self.timeout.as_secs()))?
    }

    async fn exchange(&self, request: &ExecutorRequest) -> Result<ExecutorResponse, ExecutorError> {
        let frame = encode_frame(request).map_err(|e| ExecutorError::Protocol(e.to_string()))?;

        let mut stream = UnixStream::connect(&self.socket_path).await?;
        stream.write_all(&frame).await?;

        let mut reader = BufReader::new(stream);
        let reply = read_frame(&mut reader).await?;
        if reply.is_empty() {
            return Err(ExecutorError::Protocol(
                "connection closed without a response".into(),
            ));
        }
        decode_frame(&reply).map_err(|e| ExecutorError::Protocol(e.to_string()))
    }

    /// Health check; returns the server's reply (`"pong"`).
    pub async fn ping(&self) -> Result<String, ExecutorError> {
        let message = self
            .send(&ExecutorRequest::ping())
            .await?
            .into_result()
            .map_err(ExecutorError::Protocol)?;
        Ok(match message {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
    }

    /// Names of the tools the worker can run.
    pub async fn list_tools(&self) -> Result<Vec<String>, ExecutorError> {
        let message = self
            .send(&ExecutorRequest::list_tools())
            .await?
            .into_result()
            .map_err(ExecutorError::Protocol)?;
        serde_json::from_value(message).map_err(|e| ExecutorError::Protocol(e.to_string()))
    }

    /// Run a tool on the worker. Tool failures come back as an `error` status.
    pub async fn execute(
        &self,
        tool_name: &str,
        tool_args: ToolArgs,
    ) -> Result<ExecutorResponse, ExecutorError> {
        self.send(&ExecutorRequest::execute(tool_name, tool_args)).await
    }
}
