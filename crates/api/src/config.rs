//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `EMPORIUM_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//! - `EMPORIUM_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; not needed with `EMPORIUM_STORE=memory`)
//!
//! ## Optional
//! - `EMPORIUM_STORE` - `postgres` (default) or `memory`
//! - `EMPORIUM_HOST` - Bind address (default: 127.0.0.1)
//! - `EMPORIUM_PORT` - Listen port (default: 5000)
//! - `EMPORIUM_CORS_ORIGINS` - Comma-separated SPA origins
//!   (default: `http://localhost:3000,http://localhost:3001`)
//! - `EMPORIUM_TOKEN_TTL_HOURS` - Bearer token lifetime (default: 168)
//! - `EMPORIUM_CART_IDLE_SECS` - Idle time before a cart is dropped (default: 604800)
//! - `EMPORIUM_RATE_LIMIT` - Rate limit auth endpoints (default: true)
//! - `EMPORIUM_LOG_FORMAT` - `json` or `text` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:3001";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where data lives.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Postgres {
        /// Connection URL (contains password)
        database_url: SecretString,
    },
    /// Process memory; contents vanish on restart.
    Memory,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'json' or 'text', got '{other}'")),
        }
    }
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Storage backend
    pub store: StoreBackend,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Token signing secret
    pub jwt_secret: SecretString,
    /// Bearer token lifetime
    pub token_ttl: chrono::Duration,
    /// How long an untouched cart is kept
    pub cart_idle: Duration,
    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
    /// Whether login/register are rate limited per client IP
    pub rate_limit: bool,
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let store = match get_env_or_default("EMPORIUM_STORE", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: get_database_url("EMPORIUM_DATABASE_URL")?,
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "EMPORIUM_STORE".to_string(),
                    format!("expected 'postgres' or 'memory', got '{other}'"),
                ));
            }
        };

        let host = parse_env("EMPORIUM_HOST", "127.0.0.1")?;
        let port = parse_env("EMPORIUM_PORT", "5000")?;

        let jwt_secret = get_validated_secret("EMPORIUM_JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret, "EMPORIUM_JWT_SECRET")?;

        let ttl_hours: i64 = parse_env("EMPORIUM_TOKEN_TTL_HOURS", "168")?;
        if ttl_hours <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "EMPORIUM_TOKEN_TTL_HOURS".to_string(),
                "must be positive".to_string(),
            ));
        }
        let cart_idle_secs: u64 = parse_env("EMPORIUM_CART_IDLE_SECS", "604800")?;

        let cors_origins = split_origins(&get_env_or_default(
            "EMPORIUM_CORS_ORIGINS",
            DEFAULT_CORS_ORIGINS,
        ));

        Ok(Self {
            store,
            host,
            port,
            jwt_secret,
            token_ttl: chrono::Duration::hours(ttl_hours),
            cart_idle: Duration::from_secs(cart_idle_secs),
            cors_origins,
            rate_limit: parse_env("EMPORIUM_RATE_LIMIT", "true")?,
            log_format: parse_env("EMPORIUM_LOG_FORMAT", "text")?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// In-memory configuration with default settings and no rate limiting.
    ///
    /// Used by tests and local demos; `jwt_secret` is not strength-checked.
    #[must_use]
    pub fn in_memory(jwt_secret: &str) -> Self {
        Self {
            store: StoreBackend::Memory,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            jwt_secret: SecretString::from(jwt_secret.to_owned()),
            token_ttl: chrono::Duration::hours(168),
            cart_idle: Duration::from_secs(604_800),
            cors_origins: split_origins(DEFAULT_CORS_ORIGINS),
            rate_limit: false,
            log_format: LogFormat::Text,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

/// Validate that the token secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
