//! Support/resistance zone service - Entry Point
//!
//! `run` (default): recompute zones on every candle close and serve them.
//! `nearest`: print the nearest stored zones around a price and exit.

use anyhow::Result;
use clap::{Parser, Subcommand};
use srzone_core::Period;
use tracing::info;

/// Support/resistance zone service
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via SRZONE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the zone service until Ctrl-C
    Run,
    /// Print the nearest stored support and resistance around a price
    Nearest {
        symbol: String,
        /// Period label, e.g. 15m, 1h, 4h
        period: String,
        price: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config path: CLI arg > SRZONE_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("SRZONE_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = srzone_bot::AppConfig::from_file(&config_path)?;
    srzone_telemetry::init_logging(&config.logging)?;

    info!(
        config_path = %config_path,
        "Starting srzone v{}",
        env!("CARGO_PKG_VERSION")
    );

    let app = srzone_bot::Application::new(config).await?;

    match args.command.unwrap_or(Command::Run) {
        Command::Run => app.run().await?,
        Command::Nearest {
            symbol,
            period,
            price,
        } => {
            let period = Period::from(period.as_str());
            let nearest = app.nearest(&symbol, &period, price).await?;
            println!("{}", serde_json::to_string_pretty(&nearest)?);
        }
    }

    Ok(())
}
