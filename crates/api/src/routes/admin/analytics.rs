//! Sales and product reports.

use axum::{Json, extract::State};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::{OrderFilter, Page};
use crate::error::{AppError, Result};
use crate::extract::QueryParams;
use crate::middleware::RequireAdmin;
use crate::services::analytics::{self, ProductSales, SalesBucket, SalesPeriod};
use crate::state::AppState;

const DEFAULT_TOP_PRODUCTS: u32 = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SalesQuery {
    pub period: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TopProductsQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub success: bool,
    pub period: SalesPeriod,
    pub sales_data: Vec<SalesBucket>,
}

/// Best seller with its current catalog state.
///
/// `stock` and `category` are absent once the product is deleted.
#[derive(Debug, Serialize)]
pub struct ProductStats {
    #[serde(flatten)]
    pub sales: ProductSales,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReport {
    pub success: bool,
    pub top_products: Vec<ProductStats>,
}

/// Calendar year `[Jan 1, Jan 1 next year)` in UTC.
fn year_filter(year: i32) -> Result<OrderFilter> {
    let start = |y: i32| {
        Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| AppError::BadRequest(format!("Invalid year: {year}")))
    };
    Ok(OrderFilter {
        paid_only: true,
        since: Some(start(year)?),
        until: Some(start(year.saturating_add(1))?),
        ..OrderFilter::default()
    })
}

/// Paid sales grouped by day, month or year.
///
/// GET /api/admin/analytics/sales
#[instrument(skip(state, _admin))]
pub async fn sales(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    QueryParams(query): QueryParams<SalesQuery>,
) -> Result<Json<SalesReport>> {
    let period = SalesPeriod::from_query(query.period.as_deref()).ok_or_else(|| {
        AppError::BadRequest("Invalid period. Use daily, monthly or yearly".into())
    })?;
    let filter = match query.year {
        Some(year) => year_filter(year)?,
        None => OrderFilter {
            paid_only: true,
            ..OrderFilter::default()
        },
    };

    let orders = state.db().list_orders(&filter, None).await?;
    Ok(Json(SalesReport {
        success: true,
        period,
        sales_data: analytics::sales_by_period(&orders, period),
    }))
}

/// Best sellers by units across all orders.
///
/// GET /api/admin/analytics/products
#[instrument(skip(state, _admin))]
pub async fn products(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    QueryParams(query): QueryParams<TopProductsQuery>,
) -> Result<Json<ProductReport>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TOP_PRODUCTS)
        .clamp(1, Page::MAX_LIMIT);

    let db = state.db();
    let orders = db.list_orders(&OrderFilter::default(), None).await?;
    let ranked = analytics::top_products(&orders, usize::try_from(limit).unwrap_or(usize::MAX));

    let mut top_products = Vec::with_capacity(ranked.len());
    for sales in ranked {
        let product = db.get_product(sales.product_id).await?;
        top_products.push(ProductStats {
            stock: product.as_ref().map(|p| p.stock),
            category: product.map(|p| p.category),
            sales,
        });
    }

    Ok(Json(ProductReport {
        success: true,
        top_products,
    }))
}
