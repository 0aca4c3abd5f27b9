//! chatstream - terminal client for a streaming chat assistant.

mod render;

use std::io::Write;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use chatstream_client::{ChatSession, ClientConfig, HttpTransport, SendOutcome};
use chatstream_core::Author;

use render::TerminalRenderer;

/// chatstream - chat with a streaming assistant from the terminal
#[derive(Parser)]
#[command(name = "chatstream")]
#[command(about = "Terminal client for a streaming chat assistant", long_about = None)]
struct Cli {
    /// Chat service base URL
    #[arg(short, long, default_value = "http://127.0.0.1:6500", global = true)]
    url: String,

    /// Streaming endpoint path
    #[arg(long, default_value = "/stream", global = true)]
    stream_path: String,

    /// Tool output that marks a tool call as finished
    #[arg(long, global = true)]
    sentinel: Option<String>,

    /// Text shown when a request fails
    #[arg(long, global = true)]
    error_message: Option<String>,

    /// Connect timeout in seconds
    #[arg(long, default_value = "10", global = true)]
    connect_timeout: u64,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat {
        /// Greeting shown before the first prompt
        #[arg(long)]
        greeting: Option<String>,

        /// Print tool outputs as they arrive
        #[arg(long)]
        show_tools: bool,
    },

    /// Send a single prompt and print the reply
    Ask {
        /// Prompt text
        prompt: String,

        /// Print tool outputs as they arrive
        #[arg(long)]
        show_tools: bool,

        /// Print the final conversation as JSON instead of streaming
        #[arg(long)]
        json: bool,
    },

    /// Check the chat service health endpoint
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::default()
        .with_base_url(cli.url.as_str())
        .with_stream_path(cli.stream_path.as_str())
        .with_connect_timeout_secs(cli.connect_timeout);
    if let Some(sentinel) = cli.sentinel {
        config = config.with_completion_sentinel(sentinel);
    }
    if let Some(message) = cli.error_message {
        config = config.with_error_message(message);
    }

    match cli.command.unwrap_or(Commands::Chat {
        greeting: None,
        show_tools: false,
    }) {
        Commands::Chat {
            greeting,
            show_tools,
        } => {
            if let Some(greeting) = greeting {
                config = config.with_greeting(greeting);
            }
            chat(config, show_tools).await?;
        }
        Commands::Ask {
            prompt,
            show_tools,
            json,
        } => {
            ask(config, prompt, show_tools, json).await?;
        }
        Commands::Health => {
            health(config).await?;
        }
    }

    Ok(())
}

async fn chat(config: ClientConfig, show_tools: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = ChatSession::connect(&config)?
        .with_observer(Arc::new(TerminalRenderer::stdio(show_tools)));
    info!(thread_id = %session.thread_id(), url = %config.base_url, "Chat session started");

    for message in session.view().conversation.messages() {
        if message.author == Author::Bot {
            println!("{}", message.content);
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if prompt == "/quit" || prompt == "/exit" {
            break;
        }

        // Failures are already rendered in the conversation; keep the REPL going.
        match session.send(prompt).await {
            Ok(SendOutcome::Completed) => {}
            Ok(SendOutcome::Busy) => eprintln!("A response is still streaming."),
            Err(e) => debug!(error = %e, "Exchange failed"),
        }
    }

    Ok(())
}

async fn ask(
    config: ClientConfig,
    prompt: String,
    show_tools: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = ChatSession::connect(&config)?;
    if !json {
        session = session.with_observer(Arc::new(TerminalRenderer::stdio(show_tools)));
    }

    let result = session.send(&prompt).await;

    if json {
        let view = session.view();
        println!("{}", serde_json::to_string_pretty(&view.conversation)?);
    }

    result?;
    Ok(())
}

async fn health(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let transport = HttpTransport::new(&config)?;
    let health = transport.health().await?;

    match health.environment {
        Some(environment) => println!("{} ({})", health.status, environment),
        None => println!("{}", health.status),
    }

    Ok(())
}
