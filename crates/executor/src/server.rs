//! The executor worker: a Unix-socket server running tools from its own registry.

use crate::protocol::{
    Command, ExecutorRequest, ExecutorResponse, decode_frame, encode_frame, read_frame,
};
use baton_core::error::{ExecutorError, ToolError};
use baton_core::tool::{ToolArgs, ToolRegistry};
use baton_tools::LocalDriver;
use serde_json::Value;
use std::future::Future;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Request handling, independent of the transport.
pub struct ExecutorService {
    registry: Arc<ToolRegistry>,
    driver: LocalDriver,
}

impl ExecutorService {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            driver: LocalDriver::new(),
        }
    }

    /// Answer one request.
    pub async fn process(&self, request: ExecutorRequest) -> ExecutorResponse {
        let id = request.id.as_deref().unwrap_or("-");
        info!(id = %id, command = ?request.command, "Processing request");

        match request.command {
            Command::Ping => ExecutorResponse::success("pong"),
            Command::ListTools => ExecutorResponse::success(Value::from(self.registry.names())),
            Command::Execute => {
                let Some(tool_name) = request.tool_name.as_deref().filter(|n| !n.is_empty()) else {
                    return ExecutorResponse::error("Tool name is required");
                };
                let args = request.tool_args.clone().unwrap_or_default();
                match self.run_tool(tool_name, args).await {
                    Ok(value) => ExecutorResponse::success(value),
                    Err(e) => {
                        error!(id = %id, tool = %tool_name, error = %e, "Error executing tool");
                        ExecutorResponse::error(e.to_string())
                    }
                }
            }
            Command::Unknown => ExecutorResponse::error("The command is invalid; please try again"),
        }
    }

    async fn run_tool(&self, name: &str, args: ToolArgs) -> Result<Value, ToolError> {
        let entry = self.registry.resolve(name)?;
        entry.spec.validate(&args)?;
        self.driver.invoke(entry, args).await
    }
}

/// How long a connection may take to send its request frame.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// A bound executor socket.
pub struct ExecutorServer {
    listener: UnixListener,
    socket_path: PathBuf,
    service: Arc<ExecutorService>,
    read_timeout: Duration,
}

impl ExecutorServer {
    /// Bind the socket at `socket_path`.
    ///
    /// A stale socket file is removed first, the parent directory is created
    /// if needed, and the socket is made world read/writeable.
    pub fn bind(
        socket_path: impl Into<PathBuf>,
        registry: Arc<ToolRegistry>,
    ) -> Result<Self, ExecutorError> {
        let socket_path = socket_path.into();

        if socket_path.exists() {
            debug!(path = %socket_path.display(), "Removing stale socket");
            std::fs::remove_file(&socket_path)?;
        }
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&socket_path)?;
        std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o666))?;

        info!(
            path = %socket_path.display(),
            tools = registry.len(),
            "Executor socket created"
        );

        Ok(Self {
            listener,
            socket_path,
            service: Arc::new(ExecutorService::new(registry)),
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    /// Drop connections that have not sent a full request within `timeout`.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accept connections until the process is stopped.
    pub async fn serve(self) -> Result<(), ExecutorError> {
        self.serve_until(std::future::pending()).await
    }

    /// Accept connections until `shutdown` resolves, then remove the socket file.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<(), ExecutorError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("Executor waiting for connections");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        let service = self.service.clone();
                        tokio::spawn(handle_connection(stream, service, self.read_timeout));
                    }
                    Err(e) => error!(error = %e, "Failed to accept connection"),
                },
            }
        }

        info!(path = %self.socket_path.display(), "Executor shutting down");
        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            warn!(error = %e, "Failed to remove socket file");
        }
        Ok(())
    }
}

/// Serve exactly one request on `stream`, then close it.
async fn handle_connection(
    stream: UnixStream,
    service: Arc<ExecutorService>,
    read_timeout: Duration,
) {
    let id = Uuid::new_v4().to_string();
    info!(id = %id, "New client connection");

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let frame = match tokio::time::timeout(read_timeout, read_frame(&mut reader)).await {
        Ok(Ok(frame)) => frame,
        Ok(Err(e)) => {
            error!(id = %id, error = %e, "Failed to read request; dropping connection");
            return;
        }
        Err(_) => {
            warn!(
                id = %id,
                timeout_secs = read_timeout.as_secs_f64(),
                "No request received in time; dropping connection"
            );
            return;
        }
    };

    let response = match decode_frame::<ExecutorRequest>(&frame) {
        Ok(mut request) => {
            request.id = Some(id.clone());
            service.process(request).await
        }
        Err(e) => {
            warn!(id = %id, error = %e, "Malformed request frame");
            ExecutorResponse::error(e.to_string())
        }
    };

    let encoded = match encode_frame(&response) {
        Ok(encoded) => encoded,
        Err(e) => {
            error!(id = %id, error = %e, "Failed to encode response; dropping connection");
            return;
        }
    };

    if let Err(e) = write_half.write_all(&encoded).await {
        error!(id = %id, error = %e, "Failed to send response");
        return;
    }
    if let Err(e) = write_half.shutdown().await {
        debug!(id = %id, error = %e, "Failed to shut down connection");
    }
    debug!(id = %id, "Connection closed");
}
