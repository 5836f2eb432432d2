//! Unified error handling with Sentry integration.
//!
//! Every route handler returns `Result<T, AppError>`. Errors render as
//! `{"error": "<message>"}`; server errors are captured to Sentry and the
//! client only sees "Internal server error".

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::{OrderStateError, ValidationError};
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Cart(#[from] CartError),

    #[error("{0}")]
    Checkout(#[from] CheckoutError),

    /// Payload failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    OrderState(#[from] OrderStateError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::MissingToken
                | AuthError::InvalidToken
                | AuthError::TokenExpired
                | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::AccountDisabled | AuthError::AdminRequired => StatusCode::FORBIDDEN,
                AuthError::InvalidCredentials
                | AuthError::UserAlreadyExists
                | AuthError::MissingFields(_)
                | AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch
                | AuthError::IncorrectPassword
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidName(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenIssue(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(err) => match err {
                CartError::ProductNotFound | CartError::CartNotFound | CartError::ItemNotFound => {
                    StatusCode::NOT_FOUND
                }
                CartError::InvalidQuantity | CartError::InsufficientStock { .. } => {
                    StatusCode::BAD_REQUEST
                }
                CartError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Checkout(err) => match err {
                CheckoutError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                CheckoutError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Validation(_) | Self::OrderState(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry; don't expose details to clients
        let message = if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(format!("Invalid query: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(format!("Invalid id: {}", rejection.body_text()))
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
