//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use emporium_api::db::create_pool;
use secrecy::SecretString;
use sqlx::PgPool;

/// Connect using `EMPORIUM_DATABASE_URL`, falling back to `DATABASE_URL`.
async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("EMPORIUM_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingEnvVar("EMPORIUM_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(create_pool(&database_url).await?)
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
