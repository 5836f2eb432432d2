//! Profile route handlers for the signed-in user.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use emporium_core::OrderId;

use super::auth::{ChangePasswordRequest, UserResponse};
use super::{Message, PageQuery, message};
use crate::db::{OrderFilter, Page};
use crate::error::{AppError, Result};
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::middleware::CurrentUser;
use crate::models::{Order, ProfileUpdate, UserProfile};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Orders embedded in the profile overview.
const RECENT_ORDERS: u32 = 10;
const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserProfile,
    pub orders: Vec<Order>,
    pub orders_count: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub success: bool,
    pub orders: Vec<Order>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub order: Order,
}

/// GET /api/profile
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileResponse>> {
    let filter = OrderFilter::for_user(user.id);
    let recent = Page::new(Some(1), Some(RECENT_ORDERS), RECENT_ORDERS);

    let orders = state.db().list_orders(&filter, Some(recent)).await?;
    let orders_count = state.db().count_orders(&filter).await?;

    Ok(Json(ProfileResponse {
        success: true,
        user: UserProfile::from(&user),
        orders,
        orders_count,
    }))
}

/// Update name, phone or address. Only those columns are written.
///
/// PUT /api/profile (also PUT /api/auth/profile)
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Json<UserResponse>> {
    let changes = update.validate()?;
    let user = state
        .db()
        .update_profile(user.id, &changes)
        .await?
        .ok_or(AuthError::AccountDisabled)?;
    Ok(UserResponse::new(
        &user,
        Some("Profile updated successfully".to_string()),
    ))
}

/// PUT /api/profile/change-password (also PUT /api/auth/change-password)
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(form): JsonBody<ChangePasswordRequest>,
) -> Result<Json<Message>> {
    AuthService::new(state.db())
        .change_password(&user, &form.current_password, &form.new_password)
        .await?;
    Ok(message("Password changed successfully"))
}

/// GET /api/profile/orders
pub async fn orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    QueryParams(query): QueryParams<PageQuery>,
) -> Result<Json<OrderPage>> {
    let filter = OrderFilter::for_user(user.id);
    let page = Page::new(query.page, query.limit, DEFAULT_LIMIT);

    let orders = state.db().list_orders(&filter, Some(page)).await?;
    let total = state.db().count_orders(&filter).await?;

    Ok(Json(OrderPage {
        success: true,
        orders,
        page: page.page,
        limit: page.limit,
        total,
        pages: page.pages_for(total),
    }))
}

/// Another user's order reads as missing.
///
/// GET /api/profile/orders/{orderId}
pub async fn order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = state
        .db()
        .get_order(id)
        .await?
        .filter(|o| o.user_id == user.id)
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    Ok(Json(OrderResponse {
        success: true,
        order,
    }))
}
