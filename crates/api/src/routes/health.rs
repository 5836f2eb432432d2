//! Service index and health probes.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde_json::{Value, json};

use crate::db::{OrderFilter, ProductFilter, RepositoryError};
use crate::state::AppState;

/// API index with the resource map.
///
/// GET /
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": "Emporium API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "auth": "/api/auth",
            "products": "/api/products",
            "cart": "/api/cart",
            "orders": "/api/orders",
            "profile": "/api/profile",
            "admin": "/api/admin",
            "health": "/health",
        },
    }))
}

/// Health check with store counts.
///
/// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db = state.db();
    let counts = async {
        let users = db.count_users().await?;
        let products = db.count_products(&ProductFilter::default()).await?;
        let orders = db.count_orders(&OrderFilter::default()).await?;
        Ok::<_, RepositoryError>((users, products, orders))
    };

    match counts.await {
        Ok((users, products, orders)) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "timestamp": Utc::now(),
                "database": "connected",
                "counts": { "users": users, "products": products, "orders": orders },
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "unhealthy", "error": "Database unavailable" })),
            )
        }
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn live() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
pub async fn ready(State(state): State<AppState>) -> StatusCode {
    match state.db().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
