//! StorePulse CLI - Database migrations and sync tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! pulse-cli migrate
//!
//! # Ingest one resource (or all) from Shopify into the store
//! pulse-cli ingest products
//! pulse-cli ingest all
//!
//! # Count records in Shopify
//! pulse-cli count orders
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `ingest` - Paginated, resumable ingestion
//! - `count` - Count records across all pages

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand, ValueEnum};
use storepulse_app::models::SyncResource;

mod commands;

#[derive(Parser)]
#[command(name = "pulse-cli")]
#[command(author, version, about = "StorePulse CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Ingest records from Shopify into the store
    Ingest {
        #[arg(value_enum)]
        target: IngestTarget,
    },
    /// Count records in Shopify
    Count {
        #[arg(value_enum)]
        resource: Resource,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Resource {
    Products,
    Customers,
    Orders,
}

impl From<Resource> for SyncResource {
    fn from(resource: Resource) -> Self {
        match resource {
            Resource::Products => Self::Products,
            Resource::Customers => Self::Customers,
            Resource::Orders => Self::Orders,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum IngestTarget {
    Products,
    Customers,
    Orders,
    All,
}

impl IngestTarget {
    const fn resource(self) -> Option<SyncResource> {
        match self {
            Self::Products => Some(SyncResource::Products),
            Self::Customers => Some(SyncResource::Customers),
            Self::Orders => Some(SyncResource::Orders),
            Self::All => None,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Ingest { target } => {
            commands::sync::ingest(target.resource()).await?;
        }
        Commands::Count { resource } => {
            commands::sync::count(resource.into()).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ingest_targets() {
        let cli = Cli::try_parse_from(["pulse-cli", "ingest", "all"]).unwrap_or_else(|e| panic!("{e}"));
        let Commands::Ingest { target } = cli.command else {
            panic!("expected ingest");
        };
        assert_eq!(target.resource(), None);
        assert_eq!(IngestTarget::Orders.resource(), Some(SyncResource::Orders));
        assert!(Cli::try_parse_from(["pulse-cli", "count", "all"]).is_err());
    }
}
