use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ragchat_core::{Config, OllamaClient};
use ragchat_gateway::{router, GatewayState};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ragchat-gateway")]
#[command(about = "Forward chat transcripts to a local Ollama server")]
struct Args {
    /// Address to listen on
    #[arg(short, long)]
    bind: Option<String>,
    /// Base URL of the Ollama server
    #[arg(short, long)]
    endpoint: Option<String>,
    /// Ollama model to use
    #[arg(short, long)]
    model: Option<String>,
    /// Upstream request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("ragchat_gateway=info,ragchat_core=info,tower_http=info")
            }),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load config, using defaults: {}", e);
        Config::new()
    });

    // Command-line flags win over the file and the environment
    config.bind_address = args.bind.or(config.bind_address);
    config.endpoint = args.endpoint.or(config.endpoint);
    config.model = args.model.or(config.model);
    config.timeout_secs = args.timeout_secs.or(config.timeout_secs);

    let timeout: Duration = config.timeout();
    let ollama = OllamaClient::new(config.endpoint(), config.model(), timeout)?;
    tracing::info!(
        "Forwarding to {} with model {} (timeout {:?})",
        ollama.base_url(),
        ollama.model(),
        timeout
    );

    let app = router(GatewayState::new(Arc::new(ollama)));

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("cannot bind {}", config.bind_address()))?;
    tracing::info!("Gateway listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
