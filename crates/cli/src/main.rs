//! shopedge entry point.
//!
//! Loads configuration, then runs one command against the edge cache engines.
//! Command output is a JSON document on stdout; logging goes to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use shopedge_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{CategorySavedArgs, ClassifyArgs, FlushOriginArgs, InvalidateArgs, PurgeArgs};

/// Edge cache cookie decisions and purge dispatch for a storefront.
#[derive(Debug, Parser)]
#[command(name = "shopedge", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decide the cache cookies for a request snapshot
    Classify(ClassifyArgs),
    /// Send PURGE for the given URLs to every edge node
    Purge(PurgeArgs),
    /// Purge the URLs of changed entities; no tags purges everything
    Invalidate(InvalidateArgs),
    /// Purge every storefront on every edge node
    PurgeAll,
    /// Ask a storefront host to drop everything it has cached
    FlushOrigin(FlushOriginArgs),
    /// Report whether saving a category calls for a full refresh
    CategorySaved(CategorySavedArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    let output = match cli.command {
        Command::Classify(args) => commands::to_json(&commands::classify_impl(&config, args).await?)?,
        Command::Purge(args) => commands::to_json(&commands::purge_impl(&config, args).await)?,
        Command::Invalidate(args) => commands::to_json(&commands::invalidate_impl(&config, args).await?)?,
        Command::PurgeAll => commands::to_json(&commands::purge_all_impl(&config).await?)?,
        Command::FlushOrigin(args) => commands::to_json(&commands::flush_origin_impl(&config, args).await)?,
        Command::CategorySaved(args) => commands::to_json(&commands::category_saved_impl(&config, args).await?)?,
    };

    println!("{output}");

    Ok(())
}
