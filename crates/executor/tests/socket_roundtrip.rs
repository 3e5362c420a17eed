//! End-to-end tests over a real Unix socket.

use baton_core::error::ExecutorError;
use baton_core::tool::ToolArgs;
use baton_executor::{ExecutorClient, ExecutorServer, IsolatedDriver, Status};
use baton_tools::{ExecutionDriver, ToolDispatcher, default_registry};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

struct Worker {
    _dir: tempfile::TempDir,
    socket: PathBuf,
    shutdown: tokio::sync::oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl Worker {
    async fn start() -> Self {
        Self::start_with_read_timeout(baton_executor::DEFAULT_READ_TIMEOUT).await
    }

    async fn start_with_read_timeout(read_timeout: Duration) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("nested").join("executor.sock");
        let server = ExecutorServer::bind(&socket, Arc::new(default_registry()))
            .unwrap()
            .with_read_timeout(read_timeout);
        let (shutdown, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            server
                .serve_until(async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });
        Self {
            _dir: dir,
            socket,
            shutdown,
            handle,
        }
    }

    fn client(&self) -> ExecutorClient {
        ExecutorClient::new(&self.socket, Duration::from_secs(5))
    }

    async fn stop(self) {
        let _ = self.shutdown.send(());
        self.handle.await.unwrap();
        assert!(!self.socket.exists());
    }
}

fn args(value: serde_json::Value) -> ToolArgs {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn ping_list_and_execute() {
    let worker = Worker::start().await;
    let client = worker.client();

    assert_eq!(client.ping().await.unwrap(), "pong");
    assert_eq!(client.list_tools().await.unwrap(), vec!["core_bash", "core_sum"]);

    let response = client
        .execute("core_sum", args(json!({"a": 3, "b": 5})))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Success);
    assert_eq!(response.message, json!(8));

    let response = client
        .execute("core_bash", args(json!({"command": "echo isolated"})))
        .await
        .unwrap();
    assert_eq!(response.message, json!("isolated"));

    worker.stop().await;
}

#[tokio::test]
async fn socket_is_world_writable() {
    use std::os::unix::fs::PermissionsExt;

    let worker = Worker::start().await;
    let mode = std::fs::metadata(&worker.socket).unwrap().permissions().mode();
    assert_eq!(mode & 0o666, 0o666);
    worker.stop().await;
}

#[tokio::test]
async fn stale_socket_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("executor.sock");
    std::fs::write(&socket, b"stale").unwrap();

    let server = ExecutorServer::bind(&socket, Arc::new(default_registry())).unwrap();
    assert_eq!(server.socket_path(), socket.as_path());
}

#[tokio::test]
async fn raw_wire_responses() {
    let worker = Worker::start().await;

    async fn exchange(socket: &PathBuf, line: &[u8]) -> serde_json::Value {
        use base64::Engine;
        let mut stream = UnixStream::connect(socket).await.unwrap();
        stream.write_all(line).await.unwrap();
        let mut reader = BufReader::new(stream);
        let mut reply = String::new();
        reader.read_line(&mut reply).await.unwrap();
        let body = base64::engine::general_purpose::STANDARD
            .decode(reply.trim())
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn frame(value: serde_json::Value) -> Vec<u8> {
        use base64::Engine;
        let mut line = base64::engine::general_purpose::STANDARD
            .encode(value.to_string())
            .into_bytes();
        line.push(b'\n');
        line
    }

    let reply = exchange(&worker.socket, &frame(json!({"id": "1", "command": "ping"}))).await;
    assert_eq!(reply, json!({"status": "success", "message": "pong"}));

    let reply = exchange(
        &worker.socket,
        &frame(json!({"command": "execute", "tool_name": "core_sum", "tool_args": {"a": 3, "b": 5}})),
    )
    .await;
    assert_eq!(reply, json!({"status": "success", "message": 8}));

    let reply = exchange(&worker.socket, &frame(json!({"command": "shutdown"}))).await;
    assert_eq!(
        reply,
        json!({"status": "error", "message": "The command is invalid; please try again"})
    );

    let reply = exchange(&worker.socket, &frame(json!({"command": "execute"}))).await;
    assert_eq!(reply, json!({"status": "error", "message": "Tool name is required"}));

    let reply = exchange(&worker.socket, b"!!! definitely not base64 !!!\n").await;
    assert_eq!(reply["status"], "error");

    worker.stop().await;
}

#[tokio::test]
async fn concurrent_connections() {
    let worker = Worker::start().await;
    let client = worker.client();

    let calls = (0..8).map(|i| {
        let client = client.clone();
        async move {
            client
                .execute("core_sum", args(json!({"a": i, "b": 1})))
                .await
                .unwrap()
                .message
        }
    });
    let results = futures_join(calls.collect()).await;
    for (i, value) in results.into_iter().enumerate() {
        assert_eq!(value, json!(i as i64 + 1));
    }

    worker.stop().await;
}

async fn futures_join<F>(futures: Vec<F>) -> Vec<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handles: Vec<_> = futures.into_iter().map(tokio::spawn).collect();
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        out.push(handle.await.unwrap());
    }
    out
}

#[tokio::test]
async fn isolated_driver_through_dispatcher() {
    let worker = Worker::start().await;
    let driver: Arc<dyn ExecutionDriver> = Arc::new(IsolatedDriver::new(worker.client()));
    let dispatcher = ToolDispatcher::new(Arc::new(default_registry()), driver);

    assert_eq!(dispatcher.driver_name(), "isolated");
    let out = dispatcher
        .execute("core_sum", args(json!({"a": 3, "b": 5})))
        .await
        .unwrap();
    assert_eq!(out, "8");

    let out = dispatcher
        .execute("core_bash", args(json!({"command": "echo oops >&2; exit 1"})))
        .await
        .unwrap();
    assert_eq!(out, "Error: oops");

    worker.stop().await;
}

#[tokio::test]
async fn isolated_driver_without_worker_reports_failure_text() {
    let client = ExecutorClient::new("/nonexistent/baton.sock", Duration::from_secs(1));
    assert!(matches!(
        client.ping().await,
        Err(ExecutorError::Unavailable(_))
    ));

    let driver: Arc<dyn ExecutionDriver> = Arc::new(IsolatedDriver::new(client));
    let dispatcher = ToolDispatcher::new(Arc::new(default_registry()), driver);
    let out = dispatcher
        .execute("core_sum", args(json!({"a": 1, "b": 1})))
        .await
        .unwrap();
    assert!(out.starts_with("Failed to execute tool: The socket was not found at"));
}

#[tokio::test]
async fn idle_connection_is_dropped() {
    let worker = Worker::start_with_read_timeout(Duration::from_millis(200)).await;

    let mut stream = UnixStream::connect(&worker.socket).await.unwrap();
    let mut buf = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf))
        .await
        .expect("server kept an idle connection open");
    assert_eq!(read.unwrap(), 0);
    assert!(buf.is_empty());

    // The worker still serves new connections.
    assert_eq!(worker.client().ping().await.unwrap(), "pong");
    worker.stop().await;
}
