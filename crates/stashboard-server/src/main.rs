use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use stashboard::app::build_aggregator;
use stashboard::config::{default_config_path, ResolvedConfig};
use stashboard_server::{router, AppState};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "stashboard-server")]
#[command(about = "Serve stashboard price queries over HTTP")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8787")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = ResolvedConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    let app = router(AppState::new(build_aggregator(&config)));
    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("Failed to bind {}", cli.listen))?;
    info!(addr = %cli.listen, "stashboard server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")?;
    Ok(())
}
