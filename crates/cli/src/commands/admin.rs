//! Admin account management.
//!
//! # Usage
//!
//! ```bash
//! emp-cli admin create -e admin@example.com -n "Admin Name" -p "s3cret-pass"
//! ```

use emporium_api::db::{PgDatabase, RepositoryError, UserStore};
use emporium_api::models::NewUser;
use emporium_api::models::user::validate_name;
use emporium_api::services::auth::{AuthError, hash_password, validate_password};
use emporium_core::{Email, EmailError, Role, UserId};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Password(#[from] AuthError),
}

/// Create an admin account with a password.
///
/// An existing account with the same email is promoted to admin instead;
/// its name and password are left unchanged.
///
/// # Returns
///
/// The ID of the created or promoted user.
///
/// # Errors
///
/// Returns an error for invalid input or a database failure.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, AdminError> {
    let email = Email::parse(email)?;
    let name = validate_name(name).map_err(|e| AdminError::InvalidName(e.to_string()))?;
    validate_password(password)?;

    let db = PgDatabase::new(connect().await?);

    if let Some(mut existing) = db.find_user_by_email(&email).await? {
        if existing.role == Role::Admin {
            tracing::info!("{} is already an admin (ID: {})", existing.email, existing.id);
            return Ok(existing.id);
        }
        existing.role = Role::Admin;
        let user = db.update_user(&existing).await?;
        tracing::info!("Promoted existing user to admin. ID: {}, Email: {}", user.id, user.email);
        return Ok(user.id);
    }

    let user = db
        .create_user(NewUser {
            name,
            email,
            password_hash: hash_password(password)?,
            role: Role::Admin,
        })
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}
