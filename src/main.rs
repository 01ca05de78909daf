use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cardfolio::config::{Config, DEFAULT_CONFIG_FILE};
use cardfolio::market_data::{EnrichmentServiceBuilder, ListingRepository};
use cardfolio::models::PageWindow;

#[derive(Parser)]
#[command(name = "cardfolio")]
#[command(about = "Value the graded cards held in a wallet")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enrich one page of a wallet's holdings with valuations
    Holdings {
        /// Wallet address
        #[arg(long)]
        wallet: String,

        #[arg(long, default_value_t = 0)]
        offset: u32,

        /// Page size (defaults to `http.default_limit`)
        #[arg(long)]
        limit: Option<u32>,

        /// Report cached valuations only
        #[arg(long)]
        offline: bool,
    },
    /// List every card currently flagged as listed
    Listings,
    /// Page through all listings, newest first
    Deals {
        #[arg(long, default_value_t = 1)]
        page: i64,

        #[arg(long, default_value_t = i64::from(PageWindow::DEFAULT_LIMIT))]
        limit: i64,
    },
    /// Show the effective configuration (secrets omitted)
    Config,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .json(),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?
        .with_env();

    match cli.command {
        Command::Holdings {
            wallet,
            offset,
            limit,
            offline,
        } => {
            let mut builder = EnrichmentServiceBuilder::new(&config);
            if offline {
                builder = builder.offline_only();
            }
            let service = builder.build()?;
            let limit = limit.unwrap_or(config.http.default_limit);
            let holdings = service.enrich(&wallet, offset, limit).await?;
            print_json(&holdings)?;
        }
        Command::Listings => {
            let listings = EnrichmentServiceBuilder::new(&config).listings()?;
            print_json(&listings.listed().await?)?;
        }
        Command::Deals { page, limit } => {
            let listings = EnrichmentServiceBuilder::new(&config).listings()?;
            print_json(&listings.page(PageWindow::clamp(page, limit)).await?)?;
        }
        Command::Config => {
            println!("Config file: {}", cli.config.display());
            println!(
                "Listings database: {}",
                if config.database.is_complete() { "configured" } else { "not configured" }
            );
            println!(
                "Alt credentials: {}",
                if config.valuation.credentials().is_some() { "configured" } else { "not configured" }
            );
            println!();
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
