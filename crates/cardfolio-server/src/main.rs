use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cardfolio::config::{Config, DEFAULT_CONFIG_FILE};
use cardfolio_server::{app_router, AppState};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "cardfolio-server")]
#[command(about = "Serve wallet holdings and listings over HTTP")]
struct Args {
    /// Path to config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080", env = "CARDFOLIO_LISTEN")]
    listen: SocketAddr,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .json(),
        )
        .init();

    let args = Args::parse();

    let config = Config::load_or_default(&args.config)
        .with_context(|| format!("Failed to load config: {}", args.config.display()))?
        .with_env();

    let state = AppState::from_config(&config)?;
    info!(
        listings = state.listings.is_some(),
        valuation = config.valuation.credentials().is_some(),
        "state initialized"
    );

    let router = app_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    info!(addr = %args.listen, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
