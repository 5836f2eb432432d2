//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (propagate or generate `x-request-id`)
//! 4. Panic catcher (500 JSON instead of a dropped connection)
//! 5. CORS (configured SPA origins)
//! 6. Security headers
//! 7. Rate limiting on credential endpoints (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{CurrentUser, RequireAdmin};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
