//! Signed bearer tokens (HS256 JWT).

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use emporium_core::{Role, UserId};

use super::AuthError;
use crate::models::User;

/// Token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a string, per JWT convention.
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// The user this token was issued to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if `sub` is not a user id.
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Issues and verifies tokens with one shared secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
            ttl,
        }
    }

    /// Sign a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenIssue` if signing fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenIssue(e.to_string()))
    }

    /// Check signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` for an expired token and
    /// `AuthError::InvalidToken` for anything else wrong with it.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::Email;

    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    fn user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(42),
            name: "Ada".into(),
            email: Email::parse("ada@example.com").unwrap(),
            password_hash: String::new(),
            role: Role::Admin,
            address: None,
            phone: None,
            is_active: true,
            email_verified: false,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = TokenService::new(&secret("k9#Vx2!mQ7@pL4$wR8^tY1&zB6*nH3(c"), Duration::hours(1));
        let token = tokens.issue(&user()).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), UserId::new(42));
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_expired_token() {
        let tokens = TokenService::new(&secret("k9#Vx2!mQ7@pL4$wR8^tY1&zB6*nH3(c"), Duration::hours(-1));
        let token = tokens.issue(&user()).unwrap();
        assert!(matches!(tokens.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let a = TokenService::new(&secret("k9#Vx2!mQ7@pL4$wR8^tY1&zB6*nH3(c"), Duration::hours(1));
        let b = TokenService::new(&secret("Zq8!rT5@wE2#yU9$iO6%pA3^sD7&fG4*"), Duration::hours(1));
        let token = a.issue(&user()).unwrap();
        assert!(matches!(b.verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(a.verify("not-a-token"), Err(AuthError::InvalidToken)));
    }
}
