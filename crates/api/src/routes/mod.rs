//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                  - API index
//! GET  /health                            - Health check with store counts
//! GET  /health/live                       - Liveness probe
//! GET  /health/ready                      - Readiness probe
//!
//! # Auth
//! POST /api/auth/register                 - Create account (rate limited)
//! POST /api/auth/login                    - Issue token (rate limited)
//! GET  /api/auth/me                       - Current user
//! PUT  /api/auth/profile                  - Update own profile
//! PUT  /api/auth/change-password          - Change own password
//! POST /api/auth/logout                   - Acknowledge logout
//! GET  /api/auth/users                    - All users (admin)
//! PUT  /api/auth/users/{id}/role          - Change role (admin)
//!
//! # Products
//! GET    /api/products                    - Active catalog, filtered and paged
//! GET    /api/products/{id}               - Product with related products
//! POST   /api/products                    - Create (admin)
//! PUT    /api/products/{id}               - Update (admin)
//! DELETE /api/products/{id}               - Delete (admin)
//!
//! # Cart (requires auth)
//! GET    /api/cart                        - Current cart
//! POST   /api/cart/add                    - Add a line
//! PUT    /api/cart/item/{productId}       - Set line quantity
//! DELETE /api/cart/item/{productId}       - Remove a line
//! DELETE /api/cart                        - Clear
//!
//! # Orders (requires auth)
//! POST /api/orders                        - Checkout
//! GET  /api/orders/my/orders              - Own orders
//! GET  /api/orders/{id}                   - Order (owner or admin)
//! PUT  /api/orders/{id}/pay               - Record payment (owner or admin)
//!
//! # Profile (requires auth)
//! GET  /api/profile                       - Profile with latest orders
//! PUT  /api/profile                       - Update profile
//! PUT  /api/profile/change-password       - Change password
//! GET  /api/profile/orders                - Own orders, paged
//! GET  /api/profile/orders/{orderId}      - One own order
//!
//! # Admin (requires admin)
//! GET  /api/admin/dashboard/stats         - Dashboard aggregates
//! ...  /api/admin/users[/{id}[/role]]     - User management
//! ...  /api/admin/products[/{id}]         - Catalog management
//! GET  /api/admin/categories              - All categories
//! GET  /api/admin/analytics/{sales,products}
//! ...  /api/admin/orders[/{id}/{status,deliver}]
//! GET  /api/admin/settings                - Store settings
//! PUT  /api/admin/settings                - Update store settings
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod profile;

use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Plain `{success, message}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct Message {
    pub success: bool,
    pub message: String,
}

/// `?page=&limit=` query.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub(crate) fn message(msg: impl Into<String>) -> Json<Message> {
    Json(Message {
        success: true,
        message: msg.into(),
    })
}

/// Build the full `/api` router.
pub fn api_routes(rate_limit: bool) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(rate_limit))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/profile", profile_routes())
        .nest("/admin", admin::routes())
}

/// Create the auth routes router.
///
/// Only the credential endpoints sit behind the rate limiter.
pub fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let mut credentials = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));
    if rate_limit {
        credentials = credentials.layer(auth_rate_limiter());
    }

    Router::new()
        .route("/me", get(auth::me))
        .route("/profile", put(profile::update))
        .route("/change-password", put(profile::change_password))
        .route("/logout", post(auth::logout))
        .route("/users", get(auth::list_users))
        .route("/users/{id}/role", put(auth::update_role))
        .merge(credentials)
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/add", post(cart::add))
        .route(
            "/item/{product_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/my/orders", get(orders::mine))
        .route("/{id}", get(orders::show))
        .route("/{id}/pay", put(orders::pay))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).put(profile::update))
        .route("/change-password", put(profile::change_password))
        .route("/orders", get(profile::orders))
        .route("/orders/{order_id}", get(profile::order))
}
