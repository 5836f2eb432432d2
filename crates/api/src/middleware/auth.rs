//! Authentication extractors.
//!
//! Tokens are read from `Authorization: Bearer <token>` or the legacy
//! `x-auth-token` header and resolved to a live user on every request.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Alternate header some clients send the token in.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Extractor that requires a valid bearer token for an active user.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
///     Json(UserProfile::from(&user))
/// }
/// ```
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        let user = AuthService::new(state.db())
            .authenticate(token, state.tokens())
            .await?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        tracing::Span::current().record("user_id", user.id.as_i32());

        Ok(Self(user))
    }
}

/// Extractor that requires an authenticated admin.
///
/// Missing or bad tokens reject with 401; non-admins with 403.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "admin access denied");
            return Err(AuthError::AdminRequired.into());
        }
        Ok(Self(user))
    }
}

/// Pull the raw token out of the request headers.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let from_authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        });

    from_authorization
        .or_else(|| {
            headers
                .get(AUTH_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        })
        .filter(|t| !t.is_empty())
}
