use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newswire_core::{scheduler::SourceRegistry, store::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "newswire")]
#[command(author, version, about = "Multi-tenant news ingestion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler in the foreground until interrupted
    Run,
    /// Run one ingestion cycle and exit
    Ingest {
        /// Restrict to one source family: "feed" or "api"
        #[arg(short, long)]
        kind: Option<String>,
    },
    /// List registered sources and their state
    Sources,
    /// List stored articles for the configured tenant
    Articles {
        /// Filter by country code
        #[arg(long)]
        country: Option<String>,
        /// Filter by category slug
        #[arg(long)]
        category: Option<String>,
        /// Max rows to print
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
    /// List the tenant's category taxonomy
    Categories,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    // Initialize database
    let db = Arc::new(Database::new(&config).await?);

    // Sources are registered once; missing keys disable, never abort
    let registry = Arc::new(SourceRegistry::from_config(&config)?);

    match cli.command {
        Commands::Run => commands::run::run(db, config, registry).await,
        Commands::Ingest { kind } => commands::ingest::run(&db, &config, &registry, kind).await,
        Commands::Sources => commands::sources::run(&registry),
        Commands::Articles {
            country,
            category,
            limit,
        } => commands::articles::run(&db, &config, country, category, limit).await,
        Commands::Categories => commands::categories::run(&db, &config).await,
    }
}
