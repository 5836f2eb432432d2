//! Store settings.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::extract::JsonBody;
use crate::middleware::RequireAdmin;
use crate::models::StoreSettings;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub settings: StoreSettings,
}

/// Saved settings, or defaults if never saved.
///
/// GET /api/admin/settings
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<SettingsResponse>> {
    Ok(Json(SettingsResponse {
        success: true,
        message: None,
        settings: state.db().settings().await?,
    }))
}

/// Replace the settings document.
///
/// Fields missing from the body take their default values.
///
/// PUT /api/admin/settings
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    JsonBody(settings): JsonBody<StoreSettings>,
) -> Result<Json<SettingsResponse>> {
    let settings = settings.validate()?;
    state.db().save_settings(&settings).await?;

    tracing::info!("store settings updated");
    Ok(Json(SettingsResponse {
        success: true,
        message: Some("Settings updated successfully"),
        settings,
    }))
}
