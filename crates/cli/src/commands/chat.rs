//! `baton chat`: interactive or single-message chat with an agent.

use baton_agent::{AgentStreamEvent, Overrides, Session, apply_overrides, resolve_agent};
use baton_config::{AppConfig, ExecutionMode};
use baton_core::agent::AgentRegistry;
use baton_core::provider::Provider;
use baton_executor::{ExecutorClient, IsolatedDriver};
use baton_providers::OpenAiCompatProvider;
use baton_tools::ToolDispatcher;
use baton_tools::driver::{ExecutionDriver, LocalDriver};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Flags accepted by `baton chat`.
pub struct ChatArgs {
    pub message: Option<String>,
    pub agent: Option<String>,
    pub model: Option<String>,
    pub tools: Option<Vec<String>>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub api_key: Option<String>,
}

/// A line typed at the interactive prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Exit,
    Clear,
    Save(Option<&'a str>),
    Load(Option<&'a str>),
    Agent(Option<&'a str>),
    Tools,
    Help,
    Unknown(&'a str),
    Message(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if matches!(line, "exit" | "quit") {
        return Input::Exit;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line);
    };

    let mut parts = command.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    match name {
        "exit" | "quit" => Input::Exit,
        "clear" => Input::Clear,
        "save" => Input::Save(arg),
        "load" => Input::Load(arg),
        "agent" => Input::Agent(arg),
        "tools" => Input::Tools,
        "help" => Input::Help,
        _ => Input::Unknown(line),
    }
}

pub async fn run(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(key) = args.api_key.clone() {
        config.llm.api_key = Some(key);
    }

    // Fail early with setup instructions
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    BATON_API_KEY  = 'sk-...'");
        eprintln!("    OPENAI_API_KEY = 'sk-...'");
        eprintln!();
        eprintln!("  Or pass --api-key, or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::from_config(&config.llm)?);

    let tools = Arc::new(baton_tools::default_registry());
    let driver: Arc<dyn ExecutionDriver> = match config.agent.execution_mode {
        ExecutionMode::Local => Arc::new(LocalDriver::new()),
        ExecutionMode::Isolated => Arc::new(IsolatedDriver::new(ExecutorClient::new(
            config.executor.socket_path.clone(),
            Duration::from_secs(config.executor.timeout_secs),
        ))),
    };
    let dispatcher = ToolDispatcher::new(tools.clone(), driver);
    info!(mode = dispatcher.driver_name(), tools = tools.len(), "Tool execution ready");

    let agents_dir = config
        .agent
        .agents_dir
        .clone()
        .unwrap_or_else(|| AppConfig::config_dir().join("agents"));
    let agents = Arc::new(baton_config::load_agents_dir(&agents_dir, &config.llm)?);
    debug!(dir = %agents_dir.display(), agents = agents.len(), "Agent definitions loaded");

    let requested = args.agent.as_deref().or(config.agent.default_agent.as_deref());
    let mut start = resolve_agent(&agents, requested);
    if requested.is_none_or(|name| agents.get(name).is_none()) {
        start.model.model = config.llm.model.clone();
        start.model.temperature = config.llm.temperature;
        start.model.max_tokens = Some(config.llm.max_tokens);
    }
    let overrides = Overrides {
        model: args.model,
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        tools: args.tools,
    };
    let start = apply_overrides(start, &overrides, &config.agent.default_tools, &tools);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(events_rx));

    let mut session = Session::new(start, provider, dispatcher.clone(), agents.clone())
        .with_max_iterations(config.agent.max_iterations)
        .with_workspace(config.memory.workspace.clone())
        .with_events(events_tx);

    if let Some(message) = args.message {
        let result = session.send(&message).await;
        drop(session);
        let _ = printer.await;
        let reply = result?;
        match reply.text {
            Some(text) => println!("{text}"),
            None => eprintln!("  [No answer within {} iterations]", reply.iterations),
        }
        return Ok(());
    }

    print_banner(&session, &dispatcher, &agents);
    interactive(&mut session).await?;
    drop(session);
    let _ = printer.await;

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

async fn interactive(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Exit => break,
            Input::Clear => {
                session.clear_history();
                println!("  Conversation cleared.");
            }
            Input::Save(name) => match session.save(name) {
                Ok(path) => println!("  Saved to {}", path.display()),
                Err(e) => eprintln!("  [Error] {e}"),
            },
            Input::Load(name) => match session.load(name) {
                Ok(count) => println!("  Loaded {count} messages."),
                Err(e) => eprintln!("  [Error] {e}"),
            },
            Input::Agent(None) => println!("  Active agent: {}", session.active_agent().name),
            Input::Agent(Some(name)) => match session.switch_agent(name) {
                Ok(agent) => println!("  Switched to {}", agent.name),
                Err(e) => eprintln!("  [Error] {e}"),
            },
            Input::Tools => {
                let tools = session.tools_info();
                if tools.is_empty() {
                    println!("  No tools available.");
                }
                for tool in tools {
                    println!("  {:<16} {}", tool.name, tool.description);
                }
            }
            Input::Help => print_help(),
            Input::Unknown(command) => {
                eprintln!("  Unknown command: {command} (try /help)");
            }
            Input::Message(text) => match session.send(text).await {
                Ok(reply) => {
                    println!();
                    match reply.text {
                        Some(text) => {
                            for line in text.lines() {
                                println!("  {} > {line}", reply.agent);
                            }
                        }
                        None => eprintln!(
                            "  [No answer within {} iterations]",
                            reply.iterations
                        ),
                    }
                    println!();
                }
                Err(e) => {
                    eprintln!("  [Error] {e}");
                    println!();
                }
            },
        }
    }

    Ok(())
}

fn print_banner(session: &Session, dispatcher: &ToolDispatcher, agents: &AgentRegistry) {
    let agent = session.active_agent();
    let agent_names = agents.names();

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║         Baton Agent: Interactive Mode        ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Agent:     {}", agent.name);
    println!("  Model:     {}", agent.model.model);
    println!("  Tools:     {}", agent.tools.join(", "));
    println!("  Execution: {}", dispatcher.driver_name());
    if !agent_names.is_empty() {
        println!("  Agents:    {}", agent_names.join(", "));
    }
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type /help for commands, 'exit' or Ctrl+C to quit.");
    println!();
}

fn print_help() {
    println!("  /clear          Clear the conversation");
    println!("  /save [name]    Save the conversation (default: session)");
    println!("  /load [name]    Load a saved conversation");
    println!("  /agent [name]   Show or switch the active agent");
    println!("  /tools          List the active agent's tools");
    println!("  /exit           Quit");
}

/// Relay engine events to stderr until every sender is dropped.
async fn print_events(mut events: mpsc::UnboundedReceiver<AgentStreamEvent>) {
    while let Some(event) = events.recv().await {
        if let Some(line) = describe(&event) {
            eprintln!("{line}");
        }
    }
}

fn describe(event: &AgentStreamEvent) -> Option<String> {
    match event {
        AgentStreamEvent::ToolCall { agent, name, input, .. } => {
            Some(format!("  [{agent}] calling {name} {input}"))
        }
        AgentStreamEvent::ToolResult { name, output, .. } => {
            Some(format!("  [{name}] {}", preview(output, 200)))
        }
        AgentStreamEvent::AgentChange { from, to, reason } => {
            Some(format!("  [handoff] {from} -> {to}: {reason}"))
        }
        // Answers and errors are printed from the reply itself.
        AgentStreamEvent::Text { .. }
        | AgentStreamEvent::Done { .. }
        | AgentStreamEvent::Error { .. } => None,
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(parse_input("  hello there "), Input::Message("hello there"));
        assert_eq!(parse_input("   "), Input::Empty);
    }

    #[test]
    fn exit_words() {
        assert_eq!(parse_input("exit"), Input::Exit);
        assert_eq!(parse_input("quit"), Input::Exit);
        assert_eq!(parse_input("/exit"), Input::Exit);
        assert_eq!(parse_input("/quit"), Input::Exit);
    }

    #[test]
    fn commands_with_optional_names() {
        assert_eq!(parse_input("/save"), Input::Save(None));
        assert_eq!(parse_input("/save  backup "), Input::Save(Some("backup")));
        assert_eq!(parse_input("/load backup"), Input::Load(Some("backup")));
        assert_eq!(parse_input("/agent"), Input::Agent(None));
        assert_eq!(parse_input("/agent billing"), Input::Agent(Some("billing")));
        assert_eq!(parse_input("/clear"), Input::Clear);
        assert_eq!(parse_input("/tools"), Input::Tools);
    }

    #[test]
    fn unknown_slash_command() {
        assert_eq!(parse_input("/dance now"), Input::Unknown("/dance now"));
    }

    #[test]
    fn describes_handoff_and_hides_text() {
        let change = AgentStreamEvent::AgentChange {
            from: "triage".into(),
            to: "billing".into(),
            reason: "invoice".into(),
        };
        assert_eq!(
            describe(&change).as_deref(),
            Some("  [handoff] triage -> billing: invoice")
        );
        let text = AgentStreamEvent::Text {
            agent: "billing".into(),
            content: "done".into(),
        };
        assert!(describe(&text).is_none());
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("héllo\nworld", 3), "hél...");
        assert_eq!(preview("short", 10), "short");
    }
}
