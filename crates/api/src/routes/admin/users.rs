//! User management.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use emporium_core::{Email, Role, UserId};

use super::DEFAULT_LIMIT;
use crate::db::{OrderFilter, Page, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::middleware::RequireAdmin;
use crate::models::user::validate_name;
use crate::models::{Order, User, UserProfile};
use crate::routes::auth::UserResponse;
use crate::routes::{Message, PageQuery, message};
use crate::state::AppState;

const RECENT_ORDERS: u32 = 10;

/// Body of a role change.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RoleRequest {
    pub role: Option<String>,
}

/// Admin edit of an account. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub success: bool,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
    pub users: Vec<UserProfile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    pub success: bool,
    pub user: UserProfile,
    pub recent_orders: Vec<Order>,
}

fn parse_role(raw: Option<&str>) -> Result<Role> {
    raw.and_then(|r| r.trim().parse().ok())
        .ok_or_else(|| AppError::BadRequest("Valid role is required (user or admin)".into()))
}

async fn load_user(state: &AppState, id: UserId) -> Result<User> {
    state
        .db()
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Change another user's role.
///
/// Shared by `/api/admin/users/{id}/role` and `/api/auth/users/{id}/role`.
pub(crate) async fn change_role(
    state: &AppState,
    admin: &User,
    id: UserId,
    body: RoleRequest,
) -> Result<User> {
    let role = parse_role(body.role.as_deref())?;
    if id == admin.id {
        return Err(AppError::BadRequest("Cannot change your own role".into()));
    }

    let mut user = load_user(state, id).await?;
    user.role = role;
    let user = state.db().update_user(&user).await?;

    tracing::info!(user_id = %user.id, admin_id = %admin.id, role = %role, "user role changed");
    Ok(user)
}

/// GET /api/admin/users
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    QueryParams(query): QueryParams<PageQuery>,
) -> Result<Json<UserPage>> {
    let page = Page::new(query.page, query.limit, DEFAULT_LIMIT);
    let users = state.db().list_users(Some(page)).await?;
    let total = state.db().count_users().await?;

    Ok(Json(UserPage {
        success: true,
        page: page.page,
        limit: page.limit,
        total,
        pages: page.pages_for(total),
        users: users.iter().map(UserProfile::from).collect(),
    }))
}

/// GET /api/admin/users/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    PathParam(id): PathParam<UserId>,
) -> Result<Json<UserDetail>> {
    let user = load_user(&state, id).await?;
    let recent_orders = state
        .db()
        .list_orders(
            &OrderFilter::for_user(id),
            Some(Page::new(Some(1), Some(RECENT_ORDERS), RECENT_ORDERS)),
        )
        .await?;

    Ok(Json(UserDetail {
        success: true,
        user: UserProfile::from(&user),
        recent_orders,
    }))
}

/// PUT /api/admin/users/{id}
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<UserId>,
    JsonBody(update): JsonBody<UserUpdate>,
) -> Result<Json<UserResponse>> {
    let mut user = load_user(&state, id).await?;

    if let Some(raw) = update.role.as_deref() {
        let role = parse_role(Some(raw))?;
        if id == admin.id && role != admin.role {
            return Err(AppError::BadRequest("Cannot change your own role".into()));
        }
        user.role = role;
    }
    if let Some(is_active) = update.is_active {
        if id == admin.id && !is_active {
            return Err(AppError::BadRequest(
                "Cannot deactivate your own account".into(),
            ));
        }
        user.is_active = is_active;
    }
    if let Some(name) = update.name.as_deref() {
        user.name = validate_name(name)?;
    }
    if let Some(email) = update.email.as_deref() {
        user.email = Email::parse(email)
            .map_err(|e| AppError::BadRequest(format!("Please provide a valid email: {e}")))?;
    }

    let user = match state.db().update_user(&user).await {
        Ok(user) => user,
        Err(RepositoryError::Conflict(_)) => {
            return Err(AppError::BadRequest("Email is already in use".into()));
        }
        Err(RepositoryError::NotFound) => {
            return Err(AppError::NotFound("User not found".into()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, "user updated");
    Ok(UserResponse::new(
        &user,
        Some("User updated successfully".to_string()),
    ))
}

/// Delete an account. Its orders are kept.
///
/// DELETE /api/admin/users/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<UserId>,
) -> Result<Json<Message>> {
    if id == admin.id {
        return Err(AppError::BadRequest("Cannot delete your own account".into()));
    }
    if !state.db().delete_user(id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    state.carts().clear(id).await;

    tracing::info!(user_id = %id, "user deleted");
    Ok(message("User deleted successfully"))
}

/// PUT /api/admin/users/{id}/role
pub async fn update_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<UserId>,
    JsonBody(body): JsonBody<RoleRequest>,
) -> Result<Json<UserResponse>> {
    let user = change_role(&state, &admin, id, body).await?;
    Ok(UserResponse::new(
        &user,
        Some(format!("User role updated to {}", user.role)),
    ))
}
