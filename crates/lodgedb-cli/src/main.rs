use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod export;
mod report;
mod scrape;

#[derive(Debug, Parser)]
#[command(name = "lodgedb")]
#[command(about = "Market scraper for short-term lodging listings")]
struct Cli {
    /// Path to the scrape configuration file.
    #[arg(long, default_value = "config/lodgedb.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Discover locations, extract listings, fetch details, and persist.
    Scrape,
    /// Print market analytics over stored listings.
    Report,
    /// Export stored listings to CSV.
    Export {
        /// Output path; defaults to the configured `output.csv_path`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = lodgedb_core::load_scrape_config(&cli.config)?;

    match cli.command {
        Commands::Scrape => scrape::run(&config).await,
        Commands::Report => report::run().await,
        Commands::Export { out } => export::run(&config, out).await,
    }
}

/// Opens the Postgres pool from the environment and brings the schema up to
/// date. Shared by every subcommand.
pub(crate) async fn open_pool() -> anyhow::Result<sqlx::PgPool> {
    let database_url = lodgedb_core::database_url()?;
    let pool = lodgedb_db::connect_pool(&database_url, lodgedb_db::PoolConfig::from_env()).await?;
    lodgedb_db::run_migrations(&pool).await?;
    Ok(pool)
}
