//! Catalog route handlers.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use emporium_core::ProductId;

use super::{Message, message};
use crate::db::{Page, ProductFilter, ProductSort};
use crate::error::{AppError, Result};
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::middleware::RequireAdmin;
use crate::models::{Product, ProductInput, ProductPatch};
use crate::state::AppState;

/// Storefront page size when the client doesn't ask for one.
const DEFAULT_LIMIT: u32 = 12;
/// Related products shown on a detail page.
const RELATED_LIMIT: u32 = 4;

/// Catalog query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<Product>,
    pub total: i64,
    pub pages: i64,
    pub current_page: u32,
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailResponse {
    pub success: bool,
    pub product: Product,
    pub related_products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub success: bool,
    pub message: &'static str,
    pub product: Product,
}

/// Drop blank query values.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Active products, filtered, sorted and paged.
///
/// GET /api/products
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ProductQuery>,
) -> Result<Json<ProductListResponse>> {
    let filter = ProductFilter {
        category: non_blank(query.category),
        min_price: query.min_price,
        max_price: query.max_price,
        search: non_blank(query.search),
        ..ProductFilter::storefront()
    };
    let sort = ProductSort::from_query(query.sort.as_deref());
    let page = Page::new(query.page, query.limit, DEFAULT_LIMIT);

    let db = state.db();
    let total = db.count_products(&filter).await?;
    let products = db.list_products(&filter, sort, Some(page)).await?;
    let categories = db.product_categories(true).await?;

    Ok(Json(ProductListResponse {
        success: true,
        products,
        total,
        pages: page.pages_for(total),
        current_page: page.page,
        categories,
    }))
}

/// One active product plus others from its category.
///
/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<ProductId>,
) -> Result<Json<ProductDetailResponse>> {
    let db = state.db();
    let product = db
        .get_product(id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;

    let related = ProductFilter {
        category: Some(product.category.clone()),
        exclude: Some(product.id),
        ..ProductFilter::storefront()
    };
    let related_products = db
        .list_products(
            &related,
            ProductSort::Newest,
            Some(Page {
                page: 1,
                limit: RELATED_LIMIT,
            }),
        )
        .await?;

    Ok(Json(ProductDetailResponse {
        success: true,
        product,
        related_products,
    }))
}

/// POST /api/products
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    JsonBody(input): JsonBody<ProductInput>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let product = state.db().create_product(input.validate()?).await?;
    tracing::info!(product_id = %product.id, admin_id = %admin.id, "product created");

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            success: true,
            message: "Product created successfully",
            product,
        }),
    ))
}

/// PUT /api/products/{id}
#[instrument(skip(state, _admin, patch))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    PathParam(id): PathParam<ProductId>,
    JsonBody(patch): JsonBody<ProductPatch>,
) -> Result<Json<ProductResponse>> {
    let db = state.db();
    let mut product = db
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
    patch.apply(&mut product)?;
    let product = db.update_product(&product).await?;

    Ok(Json(ProductResponse {
        success: true,
        message: "Product updated successfully",
        product,
    }))
}

/// DELETE /api/products/{id}
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    PathParam(id): PathParam<ProductId>,
) -> Result<Json<Message>> {
    if !state.db().delete_product(id).await? {
        return Err(AppError::NotFound("Product not found".into()));
    }
    tracing::info!(product_id = %id, "product deleted");
    Ok(message("Product deleted successfully"))
}
