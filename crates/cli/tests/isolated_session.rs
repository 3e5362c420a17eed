//! A chat session whose tools run on a separate executor worker.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use baton_agent::Session;
use baton_core::agent::{AgentDefinition, AgentRegistry};
use baton_core::error::ProviderError;
use baton_core::message::{Message, MessageToolCall, Role};
use baton_core::provider::{Provider, ProviderRequest, ProviderResponse};
use baton_executor::{ExecutorClient, ExecutorServer, IsolatedDriver};
use baton_tools::{ToolDispatcher, default_registry};
use serde_json::json;
use tokio::sync::oneshot;

struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut responses = self.responses.lock().unwrap();
        assert!(!responses.is_empty(), "ScriptedProvider exhausted");
        Ok(responses.remove(0))
    }
}

fn scripted(responses: Vec<ProviderResponse>) -> Arc<dyn Provider> {
    Arc::new(ScriptedProvider {
        responses: Mutex::new(responses),
    })
}

fn respond(message: Message) -> ProviderResponse {
    ProviderResponse {
        message,
        usage: None,
        model: "mock-model".into(),
    }
}

fn call(id: &str, name: &str, args: serde_json::Value) -> ProviderResponse {
    respond(Message::assistant("").with_tool_calls(vec![MessageToolCall::new(id, name, args)]))
}

fn session(socket: &std::path::Path, provider: Arc<dyn Provider>) -> Session {
    let client = ExecutorClient::new(socket, Duration::from_secs(5));
    let dispatcher = ToolDispatcher::new(
        Arc::new(default_registry()),
        Arc::new(IsolatedDriver::new(client)),
    );
    let agent = AgentDefinition::new("worker_user", "Use tools.").with_tools(["core_sum", "core_bash"]);
    Session::new(agent, provider, dispatcher, Arc::new(AgentRegistry::new()))
}

fn tool_results(session: &Session) -> Vec<String> {
    session
        .conversation()
        .messages()
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.content.clone())
        .collect()
}

#[tokio::test]
async fn tools_run_on_the_worker() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("executor.sock");
    let server = ExecutorServer::bind(&socket, Arc::new(default_registry())).unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let worker = tokio::spawn(server.serve_until(async {
        let _ = stopped.await;
    }));

    let provider = scripted(vec![
        call("c1", "core_sum", json!({"a": 20, "b": 22})),
        call("c2", "core_bash", json!({"command": "echo from-worker"})),
        respond(Message::assistant("The sum is 42.")),
    ]);
    let mut session = session(&socket, provider);

    let reply = session.send("add and echo").await.unwrap();
    assert_eq!(reply.text.as_deref(), Some("The sum is 42."));
    assert_eq!(reply.iterations, 2);
    assert_eq!(tool_results(&session), vec!["42", "from-worker"]);

    stop.send(()).unwrap();
    worker.await.unwrap().unwrap();
    assert!(!socket.exists());
}

#[tokio::test]
async fn missing_worker_surfaces_as_tool_result() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("absent.sock");

    let provider = scripted(vec![
        call("c1", "core_sum", json!({"a": 1, "b": 2})),
        respond(Message::assistant("The worker is down.")),
    ]);
    let mut session = session(&socket, provider);

    let reply = session.send("add").await.unwrap();
    assert_eq!(reply.text.as_deref(), Some("The worker is down."));

    let results = tool_results(&session);
    assert_eq!(results.len(), 1);
    assert!(results[0].starts_with("Failed to execute tool:"), "{}", results[0]);
}
