use async_trait::async_trait;
use sqlx::types::Json;

use super::PgDatabase;
use crate::db::{RepositoryError, SettingsStore};
use crate::models::StoreSettings;

/// Row key of the store settings document.
const STORE_KEY: &str = "store";

#[async_trait]
impl SettingsStore for PgDatabase {
    async fn load_settings(&self) -> Result<Option<StoreSettings>, RepositoryError> {
        let value: Option<Json<StoreSettings>> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = $1")
                .bind(STORE_KEY)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value.map(|Json(s)| s))
    }

    async fn save_settings(&self, settings: &StoreSettings) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            ",
        )
        .bind(STORE_KEY)
        .bind(Json(settings))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
