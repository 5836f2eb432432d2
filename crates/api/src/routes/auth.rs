//! Account routes: registration, login and the caller's own account.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use emporium_core::UserId;

use super::admin::users::{RoleRequest, change_role};
use super::{Message, message};
use crate::error::Result;
use crate::extract::{JsonBody, PathParam};
use crate::middleware::{CurrentUser, RequireAdmin};
use crate::models::{User, UserProfile};
use crate::services::auth::{AuthService, Registration};
use crate::state::AppState;

/// Login form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password change form.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Response carrying a fresh token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: &'static str,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: UserProfile,
}

impl UserResponse {
    pub(crate) fn new(user: &User, message: Option<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message,
            user: UserProfile::from(user),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub success: bool,
    pub count: usize,
    pub users: Vec<UserProfile>,
}

/// Register a new account.
///
/// POST /api/auth/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<Registration>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let user = AuthService::new(state.db()).register(form).await?;
    let token = state.tokens().issue(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "Registration successful",
            token,
            user: UserProfile::from(&user),
        }),
    ))
}

/// Exchange credentials for a token.
///
/// POST /api/auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = AuthService::new(state.db())
        .login(&form.email, &form.password)
        .await?;
    let token = state.tokens().issue(&user)?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful",
        token,
        user: UserProfile::from(&user),
    }))
}

/// GET /api/auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    UserResponse::new(&user, None)
}

/// Tokens are stateless; the client discards its copy.
///
/// POST /api/auth/logout
pub async fn logout(CurrentUser(user): CurrentUser) -> Json<Message> {
    tracing::info!(user_id = %user.id, "user logged out");
    message("Logout successful (remove token client-side)")
}

/// All users, newest first.
///
/// GET /api/auth/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<UserListResponse>> {
    let users: Vec<UserProfile> = state
        .db()
        .list_users(None)
        .await?
        .iter()
        .map(UserProfile::from)
        .collect();

    Ok(Json(UserListResponse {
        success: true,
        count: users.len(),
        users,
    }))
}

/// PUT /api/auth/users/{id}/role
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
