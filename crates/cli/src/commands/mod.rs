//! CLI subcommands.

pub mod migrate;
pub mod sync;

use thiserror::Error;

use storepulse_app::config::ConfigError;
use storepulse_app::services::IngestError;
use storepulse_app::shopify::AdminShopifyError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store error: {0}")]
    Store(#[from] storepulse_app::db::RepositoryError),

    #[error("Shopify error: {0}")]
    Shopify(#[from] AdminShopifyError),

    #[error("Ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    #[error("Migrations need a Postgres store (APP_STORE=postgres)")]
    NotPostgres,
}
