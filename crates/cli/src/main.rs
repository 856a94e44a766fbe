use clap::{Parser, Subcommand};

mod commands;

use commands::{MarketsArgs, QuoteArgs, SimulateArgs, ViralityArgs};

#[derive(Parser)]
#[command(name = "dex")]
#[command(about = "Bonding-curve markets for tweets", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/Dex.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List seeded trending markets with price, market cap and virality
    Markets(MarketsArgs),
    /// Preview a buy or sell against a freshly launched pool
    Quote(QuoteArgs),
    /// Run random traders concurrently over a shared set of markets
    Simulate(SimulateArgs),
    /// Score engagement metrics and predict virality
    Virality(ViralityArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = dex_core::ConfigLoader::load_from(&cli.config)?;
    tracing::debug!(config = ?config, "Loaded configuration");

    match cli.command {
        Commands::Markets(args) => commands::run_markets(args, &config)?,
        Commands::Quote(args) => commands::run_quote(args, &config)?,
        Commands::Simulate(args) => commands::run_simulate(args, &config).await?,
        Commands::Virality(args) => commands::run_virality(args),
    }

    Ok(())
}
