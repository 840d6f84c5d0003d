use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ragchat_core::Config;

mod app;
mod gateway_client;
mod handler;
mod tui;
mod ui;

use app::App;
use gateway_client::GatewayClient;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(about = "Chat with a local Ollama model through the ragchat gateway")]
struct Cli {
    /// Base URL of the gateway
    #[arg(short, long)]
    gateway: Option<String>,
    /// Request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

/// Sends log output to a file; the terminal belongs to the UI.
fn init_logging() {
    let Some(dir) = dirs::cache_dir().map(|d| d.join("ragchat")) else {
        return;
    };
    let file = std::fs::create_dir_all(&dir).and_then(|_| File::create(dir.join("ragchat.log")));
    if let Ok(file) = file {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .target(env_logger::Target::Pipe(Box::new(file)))
            .format_timestamp_millis()
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("Could not load config, using defaults: {}", e);
        Config::new()
    });
    config.gateway_url = cli.gateway.or(config.gateway_url);
    config.timeout_secs = cli.timeout_secs.or(config.timeout_secs);

    let gateway = GatewayClient::new(config.gateway_url(), config.timeout())
        .context("cannot create gateway client")?;
    log::info!("Using gateway at {}", gateway.base_url());

    let mut app = App::new(Arc::new(gateway), config.gateway_url());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();
    let sender = events.sender();
    app.fetch_models(&sender);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event, &sender)?,
            None => break,
        }
    }

    Ok(())
}
