//! Inner Voice: speak or type a thought, get an answer in a chosen persona
//!
//! Subcommands:
//! - `chat`: interactive session in the terminal
//! - `serve`: `/api/process-text` endpoint backed by Gemini
//! - `history`: show or clear the saved history

use anyhow::Result;
use clap::{Parser, Subcommand};
use inner_voice::backend::KNOWN_PERSONAS;
use inner_voice::config::AppConfig;
use inner_voice::history::HistoryStore;
use inner_voice::session::{HistoryEntry, ManualEntry, SessionController, TerminalSink};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "inner-voice")]
#[command(about = "Talk to your inner voice", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, env = "INNER_VOICE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session: each line is a thought
    Chat {
        /// Persona to answer as
        #[arg(long)]
        persona: Option<String>,
    },

    /// Run the /api/process-text endpoint
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show saved history
    History {
        /// Delete the saved history instead
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inner_voice=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Chat { persona } => {
            let config = match persona {
                Some(persona) => config.with_persona(persona),
                None => config,
            };
            config.validate()?;
            run_chat(config).await
        }
        Commands::Serve { port } => {
            let config = match port {
                Some(port) => config.with_port(port),
                None => config,
            };
            let backend = config.backend.gemini()?;
            info!("Serving with Gemini model {}", backend.model());
            inner_voice::server::run(config.server.socket_addr()?, Arc::new(backend)).await?;
            Ok(())
        }
        Commands::History { clear } => {
            let store = open_history(&config);
            if clear {
                store.clear()?;
                println!("History cleared.");
            } else {
                print_history(&store.all());
            }
            Ok(())
        }
    }
}

fn open_history(config: &AppConfig) -> HistoryStore {
    let storage = config.history.storage();
    debug!("History directory: {}", storage.dir().display());
    HistoryStore::open(Arc::new(storage), config.history.key.clone())
}

async fn run_chat(config: AppConfig) -> Result<()> {
    let controller = SessionController::new(
        config.backend.build()?,
        open_history(&config),
        Arc::new(TerminalSink::new(config.session.speak_responses)),
        config.session.default_persona.clone(),
    )
    .with_request_timeout(config.backend.request_timeout());

    println!(
        "Inner Voice ({}). Type a thought, or /help.",
        controller.active_persona()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match ReplCommand::parse(&line) {
            ReplCommand::Quit => break,
            ReplCommand::Help => print_help(),
            ReplCommand::Persona(None) => {
                println!(
                    "Persona: {} (styled: {})",
                    controller.active_persona(),
                    KNOWN_PERSONAS.join(", ")
                );
            }
            ReplCommand::Persona(Some(name)) => {
                if let Err(e) = controller.set_persona(&name) {
                    println!("{}", e.user_message());
                }
            }
            ReplCommand::History => print_history(&controller.history().all()),
            ReplCommand::Replay(index) => {
                if let Err(e) = controller.replay(index) {
                    println!("{}", e.user_message());
                }
            }
            ReplCommand::Clear => {
                if let Err(e) = controller.clear_conversation() {
                    println!("{}", e.user_message());
                }
            }
            ReplCommand::Unknown(command) => {
                println!("Unknown command: {} (try /help)", command);
            }
            ReplCommand::Thought(text) => {
                let mut entry = ManualEntry::new(text);
                if let Err(e) = controller.capture_and_submit(&mut entry, "").await {
                    debug!("Turn not submitted: {}", e);
                }
            }
        }
    }

    info!("Chat session ended");
    Ok(())
}

fn print_help() {
    println!(
        "Commands:\n  /persona [NAME]  show or change persona\n  /history         list past exchanges\n  /replay N        show and speak entry N again\n  /clear           forget the conversation\n  /quit            exit"
    );
}

fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("No history yet.");
        return;
    }
    for (index, entry) in entries.iter().enumerate() {
        let response = if entry.is_failed() {
            "(failed)"
        } else {
            entry.response.as_str()
        };
        println!(
            "{:>2}. [{} | {} | {}] {}\n    -> {}",
            index,
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.persona,
            entry.source,
            entry.query,
            response
        );
    }
}

/// One line of REPL input
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Thought(String),
    Persona(Option<String>),
    History,
    Replay(usize),
    Clear,
    Help,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            return ReplCommand::Thought(line.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "quit" | "exit" => ReplCommand::Quit,
            "help" => ReplCommand::Help,
            "history" => ReplCommand::History,
            "clear" => ReplCommand::Clear,
            "persona" if arg.is_empty() => ReplCommand::Persona(None),
            "persona" => ReplCommand::Persona(Some(arg.to_string())),
            "replay" => match arg.parse() {
                Ok(index) => ReplCommand::Replay(index),
                Err(_) => ReplCommand::Unknown(line.to_string()),
            },
            _ => ReplCommand::Unknown(line.to_string()),
        }
    }
}
