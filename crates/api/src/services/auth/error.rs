//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
///
/// Display strings are client-facing.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Neither `Authorization: Bearer` nor `x-auth-token` was sent.
    #[error("No authentication token provided")]
    MissingToken,

    /// Bad signature or malformed token.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    /// Token names a user that no longer exists.
    #[error("User not found")]
    UserNotFound,

    #[error("Account is deactivated")]
    AccountDisabled,

    #[error("Admin access required")]
    AdminRequired,

    /// Wrong password or unknown email.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User with this email already exists")]
    UserAlreadyExists,

    #[error("{0}")]
    MissingFields(&'static str),

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Current password is incorrect")]
    IncorrectPassword,

    /// Invalid email format.
    #[error("Please provide a valid email: {0}")]
    InvalidEmail(#[from] emporium_core::EmailError),

    /// Invalid display name.
    #[error("{0}")]
    InvalidName(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    #[error("token signing error: {0}")]
    TokenIssue(String),
}
