//! Checkout and order route handlers.
//!
//! These endpoints answer with the bare order (or order list) rather than
//! a `{success, ...}` envelope; storefront clients depend on that shape.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use tracing::instrument;

use emporium_core::OrderId;

use crate::db::OrderFilter;
use crate::error::{AppError, Result};
use crate::extract::{JsonBody, PathParam};
use crate::middleware::CurrentUser;
use crate::models::{Order, PaymentResult, User};
use crate::services::checkout::{self, CheckoutRequest};
use crate::state::AppState;

/// Place an order from the submitted lines.
///
/// POST /api/orders
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(request): JsonBody<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = checkout::place_order(state.db(), state.carts(), user.id, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// The caller's orders, newest first.
///
/// GET /api/orders/my/orders
pub async fn mine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Order>>> {
    let orders = state
        .db()
        .list_orders(&OrderFilter::for_user(user.id), None)
        .await?;
    Ok(Json(orders))
}

/// GET /api/orders/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<OrderId>,
) -> Result<Json<Order>> {
    let order = load_order(&state, id).await?;
    ensure_access(&user, &order, "Not authorized to view this order")?;
    Ok(Json(order))
}

/// Record a payment confirmation.
///
/// PUT /api/orders/{id}/pay
#[instrument(skip(state, user, payment), fields(user_id = %user.id))]
pub async fn pay(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<OrderId>,
    JsonBody(payment): JsonBody<PaymentResult>,
) -> Result<Json<Order>> {
    let mut order = load_order(&state, id).await?;
    ensure_access(&user, &order, "Not authorized to pay for this order")?;

    order.mark_paid(payment, Utc::now())?;
    let order = state.db().update_order(&order).await?;

    tracing::info!(order_id = %order.id, "order paid");
    Ok(Json(order))
}

pub(crate) async fn load_order(state: &AppState, id: OrderId) -> Result<Order> {
    state
        .db()
        .get_order(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))
}

/// Only the order's owner or an admin may touch it.
fn ensure_access(user: &User, order: &Order, denied: &str) -> Result<()> {
    if order.user_id == user.id || user.is_admin() {
        Ok(())
    } else {
        tracing::warn!(order_id = %order.id, user_id = %user.id, "order access denied");
        Err(AppError::Forbidden(denied.to_owned()))
    }
}
