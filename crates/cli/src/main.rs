//! Baton CLI entry point.
//!
//! Commands:
//! - `chat`               Interactive or single-message chat with an agent
//! - `executor serve`     Run the isolated tool executor worker
//! - `executor ping`      Check that the worker is reachable
//! - `executor tools`     List the worker's tools
//! - `executor exec`      Run one tool on the worker

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "baton",
    about = "Baton: conversational agents with tools and handoffs",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with an agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Agent to start with (defaults to agent.default_agent)
        #[arg(short, long)]
        agent: Option<String>,

        /// Override the model
        #[arg(long)]
        model: Option<String>,

        /// Comma-separated tool names the agent may use
        #[arg(long, value_delimiter = ',')]
        tools: Option<Vec<String>>,

        /// Override the sampling temperature
        #[arg(long)]
        temperature: Option<f32>,

        /// Override the maximum tokens per response
        #[arg(long)]
        max_tokens: Option<u32>,

        /// API key (overrides config and environment)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Run or query the isolated tool executor
    Executor {
        /// Socket path (defaults to executor.socket_path)
        #[arg(long, global = true)]
        socket: Option<PathBuf>,

        #[command(subcommand)]
        command: ExecutorCommand,
    },
}

#[derive(Subcommand)]
enum ExecutorCommand {
    /// Start the worker and serve until Ctrl+C
    Serve,
    /// Send a ping
    Ping,
    /// List the worker's tools
    Tools,
    /// Execute one tool
    Exec {
        /// Tool name
        tool: String,
        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat {
            message,
            agent,
            model,
            tools,
            temperature,
            max_tokens,
            api_key,
        } => {
            commands::chat::run(commands::chat::ChatArgs {
                message,
                agent,
                model,
                tools,
                temperature,
                max_tokens,
                api_key,
            })
            .await?
        }
        Commands::Executor { socket, command } => match command {
            ExecutorCommand::Serve => commands::executor::serve(socket).await?,
            ExecutorCommand::Ping => commands::executor::ping(socket).await?,
            ExecutorCommand::Tools => commands::executor::tools(socket).await?,
            ExecutorCommand::Exec { tool, args } => {
                commands::executor::exec(socket, &tool, &args).await?
            }
        },
    }

    Ok(())
}
