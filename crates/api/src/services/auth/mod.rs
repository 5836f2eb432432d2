//! Authentication service.
//!
//! Password accounts with argon2id hashes and stateless bearer tokens.

mod error;
mod token;

pub use error::AuthError;
pub use token::{Claims, TokenService};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use tracing::instrument;

use emporium_core::{Email, Role};

use crate::db::{Database, RepositoryError};
use crate::models::user::validate_name;
use crate::models::{NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Registration form. Missing fields deserialize as empty strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: Option<String>,
}

/// Authentication service.
///
/// Handles registration, login, password changes and token authentication.
pub struct AuthService<'a> {
    db: &'a dyn Database,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if name, email or password is blank.
    /// Returns `AuthError::InvalidName`, `AuthError::InvalidEmail` or
    /// `AuthError::WeakPassword` for invalid input.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: Registration) -> Result<User, AuthError> {
        if form.name.trim().is_empty() || form.email.trim().is_empty() || form.password.is_empty()
        {
            return Err(AuthError::MissingFields("All fields are required"));
        }

        let name = validate_name(&form.name).map_err(|e| AuthError::InvalidName(e.0))?;
        let email = Email::parse(&form.email)?;
        validate_password(&form.password)?;
        if form
            .confirm_password
            .as_ref()
            .is_some_and(|c| *c != form.password)
        {
            return Err(AuthError::PasswordMismatch);
        }

        let password_hash = hash_password(&form.password)?;

        let user = self
            .db
            .create_user(NewUser {
                name,
                email,
                password_hash,
                role: Role::User,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Login with email and password, recording the login time.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::AccountDisabled` if the account is deactivated.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields("Email and password are required"));
        }

        // A malformed email can't belong to anyone
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .db
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        // Only an account that is still active when the login is written
        // gets a token
        let user = self
            .db
            .record_login(user.id)
            .await?
            .ok_or(AuthError::AccountDisabled)?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(user)
    }

    /// Replace the password of `user` after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if either password is blank.
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    /// Returns `AuthError::IncorrectPassword` if `current` doesn't match.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn change_password(
        &self,
        user: &User,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        if current.is_empty() || new.is_empty() {
            return Err(AuthError::MissingFields("Both passwords are required"));
        }
        if new.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword(format!(
                "New password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        verify_password(current, &user.password_hash).map_err(|e| match e {
            AuthError::InvalidCredentials => AuthError::IncorrectPassword,
            other => other,
        })?;

        let hash = hash_password(new)?;
        if !self.db.set_password_hash(user.id, &hash).await? {
            return Err(AuthError::AccountDisabled);
        }

        tracing::info!("password changed");
        Ok(())
    }

    // =========================================================================
    // Token Authentication
    // =========================================================================

    /// Resolve a bearer token to an active user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` or `AuthError::TokenExpired` for a
    /// bad token, `AuthError::UserNotFound` if the user was deleted and
    /// `AuthError::AccountDisabled` if the account is deactivated.
    pub async fn authenticate(&self, token: &str, tokens: &TokenService) -> Result<User, AuthError> {
        let claims = tokens.verify(token)?;
        let user = self
            .db
            .get_user(claims.user_id()?)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }
        Ok(user)
    }
}

// =============================================================================
// Password Helpers
// =============================================================================

/// Validate password requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if shorter than the minimum length.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch and
/// `AuthError::PasswordHash` if the stored hash can't be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{MemoryDatabase, UserStore};

    fn form(email: &str, password: &str) -> Registration {
        Registration {
            name: "Grace Hopper".into(),
            email: email.into(),
            password: password.into(),
            confirm_password: None,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &hash).is_ok());
        assert!(matches!(
            verify_password("hunter23", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email_case_insensitively() {
        let db = MemoryDatabase::new();
        let auth = AuthService::new(&db);
        auth.register(form("grace@example.com", "secret1")).await.unwrap();
        assert!(matches!(
            auth.register(form("GRACE@example.com", "secret1")).await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let db = MemoryDatabase::new();
        let auth = AuthService::new(&db);
        assert!(matches!(
            auth.register(form("", "secret1")).await,
            Err(AuthError::MissingFields(_))
        ));
        assert!(matches!(
            auth.register(form("grace@example.com", "short")).await,
            Err(AuthError::WeakPassword(_))
        ));
        let mut mismatched = form("grace@example.com", "secret1");
        mismatched.confirm_password = Some("secret2".into());
        assert!(matches!(
            auth.register(mismatched).await,
            Err(AuthError::PasswordMismatch)
        ));
    }

    #[tokio::test]
    async fn test_login_records_last_login_and_rejects_wrong_password() {
        let db = MemoryDatabase::new();
        let auth = AuthService::new(&db);
        auth.register(form("grace@example.com", "secret1")).await.unwrap();

        assert!(matches!(
            auth.login("grace@example.com", "wrong-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "secret1").await,
            Err(AuthError::InvalidCredentials)
        ));

        let user = auth.login(" Grace@Example.com ", "secret1").await.unwrap();
        assert!(user.last_login.is_some());
    }

    #[tokio::test]
    async fn test_login_keeps_role_and_active_flag() {
        let db = MemoryDatabase::new();
        let auth = AuthService::new(&db);
        let mut user = auth.register(form("grace@example.com", "secret1")).await.unwrap();

        // Admin edits made while a login is in flight survive it
        user.role = Role::Admin;
        db.update_user(&user).await.unwrap();
        let logged_in = db.record_login(user.id).await.unwrap().unwrap();
        assert_eq!(logged_in.role, Role::Admin);
        assert!(logged_in.last_login.is_some());

        user.is_active = false;
        db.update_user(&user).await.unwrap();
        assert!(db.record_login(user.id).await.unwrap().is_none());
        assert!(!db.get_user(user.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_change_password_rejected_once_deactivated() {
        let db = MemoryDatabase::new();
        let auth = AuthService::new(&db);
        let mut user = auth.register(form("grace@example.com", "secret1")).await.unwrap();
        let snapshot = user.clone();

        user.is_active = false;
        db.update_user(&user).await.unwrap();

        assert!(matches!(
            auth.change_password(&snapshot, "secret1", "secret2").await,
            Err(AuthError::AccountDisabled)
        ));
        let stored = db.get_user(user.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert!(verify_password("secret1", &stored.password_hash).is_ok());
    }

    #[tokio::test]
    async fn test_change_password() {
        let db = MemoryDatabase::new();
        let auth = AuthService::new(&db);
        let user = auth.register(form("grace@example.com", "secret1")).await.unwrap();

        assert!(matches!(
            auth.change_password(&user, "nope-nope", "secret2").await,
            Err(AuthError::IncorrectPassword)
        ));
        auth.change_password(&user, "secret1", "secret2").await.unwrap();
        assert!(auth.login("grace@example.com", "secret2").await.is_ok());
    }
}
