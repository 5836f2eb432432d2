//! Catalog views that include inactive products.
//!
//! Create, update and delete share the handlers under `/api/products`.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::DEFAULT_LIMIT;
use crate::db::{Page, ProductFilter, ProductSort, StockStatus};
use crate::error::Result;
use crate::extract::QueryParams;
use crate::middleware::RequireAdmin;
use crate::models::Product;
use crate::routes::products::non_blank;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminProductQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    /// `low` or `out`; anything else is ignored.
    pub stock_status: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub success: bool,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct CategoryList {
    pub success: bool,
    pub categories: Vec<String>,
}

/// GET /api/admin/products
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    QueryParams(query): QueryParams<AdminProductQuery>,
) -> Result<Json<ProductPage>> {
    let stock = match query.stock_status.as_deref() {
        Some("low") => Some(StockStatus::Low),
        Some("out") => Some(StockStatus::Out),
        _ => None,
    };
    let filter = ProductFilter {
        is_active: query.is_active,
        category: non_blank(query.category),
        stock,
        ..ProductFilter::default()
    };
    let page = Page::new(query.page, query.limit, DEFAULT_LIMIT);

    let db = state.db();
    let total = db.count_products(&filter).await?;
    let products = db
        .list_products(&filter, ProductSort::Newest, Some(page))
        .await?;

    Ok(Json(ProductPage {
        success: true,
        page: page.page,
        limit: page.limit,
        total,
        pages: page.pages_for(total),
        products,
    }))
}

/// Every category, including those of inactive products.
///
/// GET /api/admin/categories
pub async fn categories(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<CategoryList>> {
    let categories = state.db().product_categories(false).await?;
    Ok(Json(CategoryList {
        success: true,
        categories,
    }))
}
