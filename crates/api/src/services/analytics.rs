//! Sales and product aggregates for the admin console.
//!
//! Computed over order lists fetched from the store, so both storage
//! adapters share one implementation.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;

use emporium_core::{OrderStatus, ProductId, round_money};

use crate::models::Order;

/// Grouping granularity for sales reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesPeriod {
    Daily,
    #[default]
    Monthly,
    Yearly,
}

impl SalesPeriod {
    /// Parse the `period` query value.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Option<Self> {
        match value {
            None | Some("monthly") => Some(Self::Monthly),
            Some("daily") => Some(Self::Daily),
            Some("yearly") => Some(Self::Yearly),
            Some(_) => None,
        }
    }

    const fn format(self) -> &'static str {
        match self {
            Self::Daily => "%Y-%m-%d",
            Self::Monthly => "%Y-%m",
            Self::Yearly => "%Y",
        }
    }
}

/// Sales within one period bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesBucket {
    pub period: String,
    pub total_sales: Decimal,
    pub order_count: i64,
    pub avg_order_value: Decimal,
}

/// Units and revenue for one product across orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: ProductId,
    pub name: String,
    pub total_sold: i64,
    pub total_revenue: Decimal,
    /// Mean unit price across the order lines.
    pub avg_price: Decimal,
}

/// Number of orders in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Group orders by `created_at` into period buckets, ascending.
///
/// Callers pass whichever orders should count (normally paid only).
#[must_use]
pub fn sales_by_period(orders: &[Order], period: SalesPeriod) -> Vec<SalesBucket> {
    let mut buckets: BTreeMap<String, (Decimal, i64)> = BTreeMap::new();
    for order in orders {
        let key = order.created_at.format(period.format()).to_string();
        let entry = buckets.entry(key).or_insert((Decimal::ZERO, 0));
        entry.0 += order.total_price;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(period, (total_sales, order_count))| SalesBucket {
            period,
            total_sales,
            order_count,
            avg_order_value: round_money(total_sales / Decimal::from(order_count)),
        })
        .collect()
}

/// Best sellers by units sold, then revenue.
#[must_use]
pub fn top_products(orders: &[Order], limit: usize) -> Vec<ProductSales> {
    struct Acc {
        name: String,
        sold: i64,
        revenue: Decimal,
        price_sum: Decimal,
        lines: i64,
    }

    let mut by_product: HashMap<ProductId, Acc> = HashMap::new();
    for item in orders.iter().flat_map(|o| &o.items) {
        let acc = by_product.entry(item.product_id).or_insert_with(|| Acc {
            name: item.name.clone(),
            sold: 0,
            revenue: Decimal::ZERO,
            price_sum: Decimal::ZERO,
            lines: 0,
        });
        acc.sold += i64::from(item.quantity);
        acc.revenue += item.line_total();
        acc.price_sum += item.price;
        acc.lines += 1;
    }

    let mut ranked: Vec<ProductSales> = by_product
        .into_iter()
        .map(|(product_id, acc)| ProductSales {
            product_id,
            name: acc.name,
            total_sold: acc.sold,
            total_revenue: acc.revenue,
            avg_price: round_money(acc.price_sum / Decimal::from(acc.lines)),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.total_sold
            .cmp(&a.total_sold)
            .then_with(|| b.total_revenue.cmp(&a.total_revenue))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Order count for every status, in lifecycle order.
#[must_use]
pub fn status_counts(orders: &[Order]) -> Vec<StatusCount> {
    OrderStatus::ALL
        .iter()
        .map(|&status| StatusCount {
            status,
            count: orders
                .iter()
                .filter(|o| o.status == status)
                .count()
                .try_into()
                .unwrap_or(i64::MAX),
        })
        .collect()
}
