//! Cart route handlers. Every route requires a signed-in user.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use emporium_core::ProductId;

use crate::error::{AppError, Result};
use crate::extract::{JsonBody, PathParam};
use crate::middleware::CurrentUser;
use crate::models::Cart;
use crate::services::cart::CartError;
use crate::state::AppState;

/// Add-to-cart form.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddItemRequest {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuantityRequest {
    pub quantity: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub cart: Cart,
}

fn respond(message: Option<&'static str>, cart: Cart) -> Json<CartResponse> {
    Json(CartResponse {
        success: true,
        message,
        cart,
    })
}

/// GET /api/cart
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<CartResponse> {
    respond(None, state.carts().get(user.id).await)
}

/// POST /api/cart/add
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(body): JsonBody<AddItemRequest>,
) -> Result<Json<CartResponse>> {
    let product_id = body
        .product_id
        .ok_or_else(|| AppError::BadRequest("Product details are required".into()))?;

    let cart = state
        .carts()
        .add(
            state.db(),
            user.id,
            product_id,
            body.quantity.unwrap_or(1),
        )
        .await?;
    Ok(respond(Some("Item added to cart"), cart))
}

/// PUT /api/cart/item/{productId}
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(product_id): PathParam<ProductId>,
    JsonBody(body): JsonBody<QuantityRequest>,
) -> Result<Json<CartResponse>> {
    let quantity = body.quantity.ok_or(CartError::InvalidQuantity)?;
    let cart = state
        .carts()
        .update_quantity(state.db(), user.id, product_id, quantity)
        .await?;
    Ok(respond(Some("Item quantity updated"), cart))
}

/// DELETE /api/cart/item/{productId}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(product_id): PathParam<ProductId>,
) -> Result<Json<CartResponse>> {
    let cart = state.carts().remove(user.id, product_id).await?;
    Ok(respond(Some("Item removed from cart"), cart))
}

/// DELETE /api/cart
pub async fn clear(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<CartResponse> {
    state.carts().clear(user.id).await;
    respond(Some("Cart cleared"), Cart::default())
}
