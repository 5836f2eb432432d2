//! Order fulfillment.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use emporium_core::{OrderId, OrderStatus};

use super::{CustomerOrder, with_customers};
use crate::db::OrderFilter;
use crate::error::{AppError, Result};
use crate::extract::{JsonBody, PathParam};
use crate::middleware::RequireAdmin;
use crate::models::Order;
use crate::routes::orders::load_order;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderList {
    pub success: bool,
    pub orders: Vec<CustomerOrder>,
}

#[derive(Debug, Serialize)]
pub struct OrderUpdated {
    pub success: bool,
    pub message: String,
    pub order: Order,
}

/// Every order, newest first, with its customer.
///
/// GET /api/admin/orders
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<OrderList>> {
    let orders = state
        .db()
        .list_orders(&OrderFilter::default(), None)
        .await?;
    Ok(Json(OrderList {
        success: true,
        orders: with_customers(state.db(), orders).await?,
    }))
}

/// PUT /api/admin/orders/{id}/status
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<OrderId>,
    JsonBody(body): JsonBody<StatusRequest>,
) -> Result<Json<OrderUpdated>> {
    let status: OrderStatus = body
        .status
        .as_deref()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| AppError::BadRequest("Valid status is required".into()))?;

    let mut order = load_order(&state, id).await?;
    order.set_status(status, Utc::now());
    let order = state.db().update_order(&order).await?;

    tracing::info!(order_id = %order.id, status = %status, "order status changed");
    Ok(Json(OrderUpdated {
        success: true,
        message: format!("Order status updated to {status}"),
        order,
    }))
}

/// PUT /api/admin/orders/{id}/deliver
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn deliver(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<OrderId>,
) -> Result<Json<OrderUpdated>> {
    let mut order = load_order(&state, id).await?;
    order.mark_delivered(Utc::now());
    let order = state.db().update_order(&order).await?;

    tracing::info!(order_id = %order.id, "order delivered");
    Ok(Json(OrderUpdated {
        success: true,
        message: "Order marked as delivered".to_owned(),
        order,
    }))
}
