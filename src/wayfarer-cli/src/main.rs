//! Wayfarer CLI - terminal frontend for the travel assistant.
//!
//! Modes:
//! - Interactive chat (default): a prompt loop that streams the reply
//!   with the typewriter reveal
//! - One-shot (`--once`): ask a single question over the non-streaming
//!   endpoint and print the full answer
//! - History (`--history`): list recent sessions and exit
//!
//! Message text is trusted formatted content from the assistant and is
//! printed as-is; interpretation of any markup is left to the terminal.

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{TimeDelta, Utc};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use wayfarer_engine::{
    ChatSession, EngineConfig, HttpChatBackend, SessionEvent, SessionHistory, SessionSummary,
};

/// Prompt shown before user input.
const USER_PROMPT: &str = "you> ";

/// Prefix shown before assistant output.
const ASSISTANT_PREFIX: &str = "wayfarer> ";

/// Terminal chat client for the Wayfarer travel assistant.
#[derive(Debug, Parser)]
#[command(name = "wayfarer", version, about)]
struct Cli {
    /// Backend root URL.
    #[arg(long, env = "WAYFARER_API_URL")]
    api_url: Option<String>,

    /// Typewriter delay between characters, in milliseconds.
    #[arg(long, value_name = "MS")]
    reveal_ms: Option<u64>,

    /// Request timeout, in seconds.
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// List recent sessions and exit.
    #[arg(long)]
    history: bool,

    /// Ask one question over the non-streaming endpoint and exit.
    #[arg(long, value_name = "QUERY")]
    once: Option<String>,
}

fn engine_config(cli: &Cli) -> EngineConfig {
    let mut config = EngineConfig::from_env();
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(ms) = cli.reveal_ms {
        config = config.with_reveal_interval(Duration::from_millis(ms));
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_request_timeout(Duration::from_secs(secs));
    }
    config
}

/// Recent sessions shown in the history view.
fn recent_sessions() -> SessionHistory {
    let now = Utc::now();
    SessionHistory::new(vec![
        SessionSummary {
            id: "1".to_string(),
            title: "Vietnam 4-day plan".to_string(),
            last_message: "Suggest itinerary for Vietnam...".to_string(),
            last_active: now,
        },
        SessionSummary {
            id: "2".to_string(),
            title: "Romantic trip to Paris".to_string(),
            last_message: "Best spots for couples...".to_string(),
            last_active: now - TimeDelta::days(1),
        },
        SessionSummary {
            id: "3".to_string(),
            title: "Adventure in Thailand".to_string(),
            last_message: "Show me hidden beaches...".to_string(),
            last_active: now - TimeDelta::days(2),
        },
    ])
}

fn print_history(history: &SessionHistory) {
    println!("Recent sessions:");
    for entry in history.summaries() {
        println!(
            "  [{}] {}  ({})",
            entry.id,
            entry.title,
            entry.last_active.format("%Y-%m-%d %H:%M")
        );
        println!("      {}", entry.last_message);
    }
}

async fn run_once(config: &EngineConfig, query: &str) -> Result<()> {
    let backend = HttpChatBackend::new(config);
    use wayfarer_engine::ChatBackend as _;
    let answer = backend.chat(query).await?;
    println!("{answer}");
    Ok(())
}

async fn run_interactive(mut session: ChatSession) -> Result<()> {
    let mut events = session.subscribe();
    let printer = tokio::spawn(async move {
        let mut out = std::io::stdout();
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::UserAppended(_) => {
                    print!("{ASSISTANT_PREFIX}");
                    let _ = out.flush();
                }
                SessionEvent::RevealStep(ch) => {
                    print!("{ch}");
                    let _ = out.flush();
                }
                SessionEvent::ReplyFinalized(_) => println!("\n"),
                SessionEvent::TurnFailed(notice) => println!("{}\n", notice.text),
            }
        }
    });

    // The conversation opens with the assistant's greeting.
    if let Some(greeting) = session.snapshot().first() {
        println!("{ASSISTANT_PREFIX}{}\n", greeting.text);
    }
    println!("Type your question, or \"exit\" to leave.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{USER_PROMPT}");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if matches!(input, "exit" | "quit") {
            break;
        }
        session.submit(input).await;
        // Let the printer drain the tail of the event channel before the
        // next prompt appears.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    drop(session);
    let _ = printer.await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = engine_config(&cli);
    tracing::debug!(base_url = %config.base_url, "starting wayfarer");

    if cli.history {
        print_history(&recent_sessions());
        return Ok(());
    }

    if let Some(query) = &cli.once {
        return run_once(&config, query).await;
    }

    let backend = Arc::new(HttpChatBackend::new(&config));
    let session = ChatSession::new(backend, config);
    run_interactive(session).await
}
