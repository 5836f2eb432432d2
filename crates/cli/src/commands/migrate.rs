//! Database migration command.
//!
//! Applies the SQL files under `crates/api/migrations/` in order; already
//! applied migrations are skipped.

use thiserror::Error;

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run pending migrations.
///
/// # Errors
///
/// Returns an error if no database URL is set, the database is unreachable
/// or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
