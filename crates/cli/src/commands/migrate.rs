//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! pulse-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `APP_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! `crates/app/migrations/`, embedded at build time.

use storepulse_app::config::StoreBackend;
use storepulse_app::db::{self, MIGRATOR};

use super::CommandError;

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the URL is missing, the connection fails, or a
/// migration does not apply.
pub async fn run() -> Result<(), CommandError> {
    dotenvy::dotenv().ok();

    let StoreBackend::Postgres { database_url } = StoreBackend::from_env()? else {
        return Err(CommandError::NotPostgres);
    };

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
