//! Dashboard aggregates.

use axum::{Json, extract::State};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use super::{CustomerOrder, with_customers};
use crate::db::{OrderFilter, Page, ProductFilter};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::analytics::{self, ProductSales, SalesBucket, SalesPeriod, StatusCount};
use crate::state::AppState;

/// Window for the sales chart and `totalSales`.
const SALES_WINDOW_DAYS: i64 = 30;
const RECENT_ORDERS: u32 = 10;
const TOP_PRODUCTS: usize = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub users: i64,
    pub products: i64,
    pub orders: i64,
    pub recent_orders: usize,
    /// Paid sales inside the window.
    pub total_sales: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub success: bool,
    pub stats: Counts,
    pub recent_orders: Vec<CustomerOrder>,
    pub recent_sales: Vec<SalesBucket>,
    pub top_products: Vec<ProductSales>,
    pub order_status: Vec<StatusCount>,
}

/// GET /api/admin/dashboard/stats
#[instrument(skip_all)]
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<DashboardStats>> {
    let db = state.db();

    let users = db.count_users().await?;
    let products = db.count_products(&ProductFilter::default()).await?;
    let orders = db.count_orders(&OrderFilter::default()).await?;

    let recent = db
        .list_orders(
            &OrderFilter::default(),
            Some(Page::new(Some(1), Some(RECENT_ORDERS), RECENT_ORDERS)),
        )
        .await?;
    let recent_orders = with_customers(db, recent).await?;

    let window = OrderFilter {
        paid_only: true,
        since: Some(Utc::now() - Duration::days(SALES_WINDOW_DAYS)),
        ..OrderFilter::default()
    };
    let paid = db.list_orders(&window, None).await?;
    let recent_sales = analytics::sales_by_period(&paid, SalesPeriod::Daily);
    let total_sales = recent_sales.iter().map(|day| day.total_sales).sum();

    let all = db.list_orders(&OrderFilter::default(), None).await?;

    Ok(Json(DashboardStats {
        success: true,
        stats: Counts {
            users,
            products,
            orders,
            recent_orders: recent_orders.len(),
            total_sales,
        },
        recent_orders,
        recent_sales,
        top_products: analytics::top_products(&all, TOP_PRODUCTS),
        order_status: analytics::status_counts(&all),
    }))
}
