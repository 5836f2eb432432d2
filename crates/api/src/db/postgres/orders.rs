use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};

use emporium_core::{Address, OrderId, OrderStatus, ProductId, UserId};

use super::PgDatabase;
use crate::db::{OrderFilter, OrderStore, Page, RepositoryError};
use crate::models::{NewOrder, Order, OrderItem, PaymentResult};

const ORDER_COLUMNS: &str = "id, user_id, items, shipping_address, payment_method, \
                             payment_result, items_price, tax_price, shipping_price, \
                             total_price, is_paid, paid_at, is_delivered, delivered_at, \
                             status, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    items: Json<Vec<OrderItem>>,
    shipping_address: Json<Address>,
    payment_method: String,
    payment_result: Option<Json<PaymentResult>>,
    items_price: Decimal,
    tax_price: Decimal,
    shipping_price: Decimal,
    total_price: Decimal,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|e| RepositoryError::corrupt("order status", e))?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            items: row.items.0,
            shipping_address: row.shipping_address.0,
            payment_method: row.payment_method,
            payment_result: row.payment_result.map(|Json(p)| p),
            items_price: row.items_price,
            tax_price: row.tax_price,
            shipping_price: row.shipping_price,
            total_price: row.total_price,
            is_paid: row.is_paid,
            paid_at: row.paid_at,
            is_delivered: row.is_delivered,
            delivered_at: row.delivered_at,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    qb.push(" WHERE TRUE");
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if filter.paid_only {
        qb.push(" AND is_paid");
    }
    if let Some(since) = filter.since {
        qb.push(" AND created_at >= ").push_bind(since);
    }
    if let Some(until) = filter.until {
        qb.push(" AND created_at < ").push_bind(until);
    }
}

#[async_trait]
impl OrderStore for PgDatabase {
    async fn place_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Conditional decrement: a row only changes while the product is
        // active with enough stock left, so concurrent checkouts can never
        // oversell. Rows are locked in id order so two checkouts of the
        // same products cannot deadlock.
        let mut lines: Vec<&OrderItem> = order.items.iter().collect();
        lines.sort_by_key(|item| item.product_id);

        for item in lines {
            let updated = sqlx::query(
                r"
                UPDATE products
                SET stock = stock - $1, updated_at = NOW()
                WHERE id = $2 AND is_active AND stock >= $1
                ",
            )
            .bind(item.quantity)
            .bind(item.product_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                let current: Option<(String, i32, bool)> =
                    sqlx::query_as("SELECT name, stock, is_active FROM products WHERE id = $1")
                        .bind(item.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                // Dropping `tx` rolls back the decrements made so far
                return Err(stock_error(item.product_id, current));
            }
        }

        let row: OrderRow = sqlx::query_as(&format!(
            r"
            INSERT INTO orders (user_id, items, shipping_address, payment_method,
                                items_price, tax_price, shipping_price, total_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id)
        .bind(Json(&order.items))
        .bind(Json(&order.shipping_address))
        .bind(&order.payment_method)
        .bind(order.items_price)
        .bind(order.tax_price)
        .bind(order.shipping_price)
        .bind(order.total_price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: Option<Page>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut qb = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id DESC");
        if let Some(page) = page {
            qb.push(" LIMIT ")
                .push_bind(i64::from(page.limit))
                .push(" OFFSET ")
                .push_bind(page.offset());
        }

        let rows: Vec<OrderRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn count_orders(&self, filter: &OrderFilter) -> Result<i64, RepositoryError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM orders");
        push_filter(&mut qb, filter);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn update_order(&self, order: &Order) -> Result<Order, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            r"
            UPDATE orders
            SET payment_result = $2, is_paid = $3, paid_at = $4, is_delivered = $5,
                delivered_at = $6, status = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.id)
        .bind(order.payment_result.as_ref().map(Json))
        .bind(order.is_paid)
        .bind(order.paid_at)
        .bind(order.is_delivered)
        .bind(order.delivered_at)
        .bind(order.status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }
}

fn stock_error(product_id: ProductId, current: Option<(String, i32, bool)>) -> RepositoryError {
    match current {
        Some((name, available, true)) => RepositoryError::InsufficientStock {
            product_id,
            name,
            available,
        },
        _ => RepositoryError::ProductMissing(product_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_error_distinguishes_missing_products() {
        let id = ProductId::new(4);
        assert!(matches!(
            stock_error(id, None),
            RepositoryError::ProductMissing(p) if p == id
        ));
        assert!(matches!(
            stock_error(id, Some(("Mug".into(), 1, true))),
            RepositoryError::InsufficientStock { available: 1, .. }
        ));
    }

    #[test]
    fn test_stock_error_treats_inactive_products_as_missing() {
        let id = ProductId::new(4);
        assert!(matches!(
            stock_error(id, Some(("Mug".into(), 50, false))),
            RepositoryError::ProductMissing(p) if p == id
        ));
    }
}
