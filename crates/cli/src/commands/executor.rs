//! `baton executor`: run or query the isolated tool worker.

use baton_config::AppConfig;
use baton_executor::{ExecutorClient, ExecutorServer};
use baton_core::tool::ToolArgs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

fn settings(socket: Option<PathBuf>) -> Result<(PathBuf, Duration), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let socket = socket.unwrap_or(config.executor.socket_path);
    Ok((socket, Duration::from_secs(config.executor.timeout_secs)))
}

fn client(socket: Option<PathBuf>) -> Result<ExecutorClient, Box<dyn std::error::Error>> {
    let (socket, timeout) = settings(socket)?;
    Ok(ExecutorClient::new(socket, timeout))
}

/// Parse the `exec` argument string; it must be a JSON object.
fn parse_args(raw: &str) -> Result<ToolArgs, String> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("Tool arguments must be a JSON object, got: {other}")),
        Err(e) => Err(format!("Invalid JSON arguments: {e}")),
    }
}

pub async fn serve(socket: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let (socket, timeout) = settings(socket)?;
    let registry = Arc::new(baton_tools::default_registry());
    let server = ExecutorServer::bind(socket, registry)?.with_read_timeout(timeout);

    println!("  Executor listening on {}", server.socket_path().display());
    println!("  Press Ctrl+C to stop.");

    server
        .serve_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    info!("Executor stopped");
    Ok(())
}

pub async fn ping(socket: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let reply = client(socket)?.ping().await?;
    println!("{reply}");
    Ok(())
}

pub async fn tools(socket: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    for name in client(socket)?.list_tools().await? {
        println!("{name}");
    }
    Ok(())
}

pub async fn exec(
    socket: Option<PathBuf>,
    tool: &str,
    raw_args: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args(raw_args)?;
    let response = client(socket)?.execute(tool, args).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    if !response.is_success() {
        return Err(format!("Tool {tool} failed").into());
    }
    Ok(())
}
