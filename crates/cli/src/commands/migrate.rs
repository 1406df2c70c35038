//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! pb-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `BRIDGE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Embedded from `crates/bridge/migrations/`:
//! ```text
//! migrations/
//! ├── 20260301000001_create_migrated_users.sql
//! ├── 20260301000002_create_migrated_addresses.sql
//! └── 20260301000003_create_migrated_credentials.sql
//! ```

use profile_bridge::db;
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the sync store migrations.
///
/// # Errors
///
/// Returns error if the database URL is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("BRIDGE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("BRIDGE_DATABASE_URL"))?;

    tracing::info!("Connecting to bridge database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running bridge migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Bridge migrations complete!");
    Ok(())
}
