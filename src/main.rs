use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod client;
mod config;
mod handler;
mod session;
mod state;
mod tui;
mod ui;

use app::App;
use client::ChatClient;
use config::{Config, API_URL_ENV};
use session::ChatSession;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "mcp-chat")]
#[command(author, version, about = "Chat with an MCP agent endpoint from the terminal", long_about = None)]
struct Cli {
    /// Chat endpoint (overrides MCP_CHAT_API_URL and the config file)
    #[arg(short, long)]
    api_url: Option<String>,

    /// Write logs here instead of the cache directory
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Store the resolved endpoint in the config file
    #[arg(long)]
    save_config: bool,

    /// Send one message, print the reply and exit without the TUI
    #[arg(long, value_name = "MESSAGE")]
    once: Option<String>,
}

fn default_log_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| anyhow!("Could not determine cache directory"))?;
    Ok(cache_dir.join("mcp-chat").join("mcp-chat.log"))
}

/// The terminal owns stderr, so logs go to a file.
fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = match cli.log_file {
        Some(path) => path,
        None => default_log_path()?,
    };
    init_logging(&log_path)?;

    let mut config = Config::load()?;
    let env_url = std::env::var(API_URL_ENV).ok();
    let api_url = config.resolve_api_url(cli.api_url.as_deref(), env_url.as_deref());

    if cli.save_config {
        config.api_url = Some(api_url.clone());
        config.save()?;
    }

    info!(%api_url, "starting chat session");

    if let Some(message) = cli.once {
        println!("{}", ask_once(&api_url, &message).await?);
        return Ok(());
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &api_url).await;
    tui::restore()?;

    result
}

/// One submission outside the TUI; yields the assistant's reply text.
async fn ask_once(api_url: &str, message: &str) -> Result<String> {
    let client = ChatClient::new(api_url);
    let mut session = ChatSession::new();

    if !session.submit(&client, message).await {
        return Err(anyhow!("nothing to send: message is blank"));
    }

    session
        .transcript()
        .last()
        .map(|reply| reply.text().to_string())
        .ok_or_else(|| anyhow!("transcript is empty"))
}

async fn run(terminal: &mut Tui, api_url: &str) -> Result<()> {
    let mut events = EventHandler::new();
    let mut app = App::new(ChatClient::new(api_url), events.sender());

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event),
            None => break,
        }
    }

    if app.is_waiting() {
        info!(pending = app.pending, "quitting with requests in flight");
    }

    Ok(())
}
