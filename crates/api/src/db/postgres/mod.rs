//! `PostgreSQL` storage adapter.
//!
//! Queries are built at runtime (`sqlx::query_as` / `QueryBuilder`) so the
//! crate compiles without a live database or an offline query cache.

mod orders;
mod products;
mod settings;
mod users;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{Database, RepositoryError};

/// Storage backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for migrations and the CLI.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map a unique violation to `Conflict`, everything else to `Database`.
fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}
