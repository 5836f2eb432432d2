//! Order types.
//!
//! An order is written once at checkout. Afterwards only its payment,
//! delivery and fulfillment status change; line items and prices are frozen.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use emporium_core::{Address, OrderId, OrderStatus, ProductId, UserId};

/// One purchased line, snapshotted from the catalog at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "product")]
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub image: String,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Payment confirmation as reported by the payment provider.
///
/// Field names follow the provider's wire format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentResult {
    pub id: String,
    pub status: String,
    pub update_time: String,
    pub email_address: String,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    #[serde(rename = "orderItems")]
    pub items: Vec<OrderItem>,
    pub shipping_address: Address,
    pub payment_method: String,
    pub payment_result: Option<PaymentResult>,
    pub items_price: Decimal,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
    pub total_price: Decimal,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Errors from order state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderStateError {
    #[error("Order is already paid")]
    AlreadyPaid,
    #[error("Cannot pay for a cancelled order")]
    Cancelled,
}

impl Order {
    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i64::from(i.quantity)).sum()
    }

    /// Record a successful payment.
    ///
    /// # Errors
    ///
    /// Returns `OrderStateError` if the order is already paid or cancelled.
    pub fn mark_paid(
        &mut self,
        result: PaymentResult,
        now: DateTime<Utc>,
    ) -> Result<(), OrderStateError> {
        if self.is_paid {
            return Err(OrderStateError::AlreadyPaid);
        }
        if self.status == OrderStatus::Cancelled {
            return Err(OrderStateError::Cancelled);
        }
        self.is_paid = true;
        self.paid_at = Some(now);
        self.payment_result = Some(result);
        self.updated_at = now;
        Ok(())
    }

    /// Mark the order delivered. Idempotent.
    pub fn mark_delivered(&mut self, now: DateTime<Utc>) {
        if !self.is_delivered {
            self.is_delivered = true;
            self.delivered_at = Some(now);
        }
        self.status = OrderStatus::Delivered;
        self.updated_at = now;
    }

    /// Move the order to `status`.
    ///
    /// Delivering also stamps the delivery flags; moving away from
    /// `delivered` clears them.
    pub fn set_status(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        if status == OrderStatus::Delivered {
            self.mark_delivered(now);
            return;
        }
        self.is_delivered = false;
        self.delivered_at = None;
        self.status = status;
        self.updated_at = now;
    }
}

/// A priced order ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: Address,
    pub payment_method: String,
    pub items_price: Decimal,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
    pub total_price: Decimal,
}

impl NewOrder {
    /// Build the stored order from this request.
    #[must_use]
    pub fn into_order(self, id: OrderId, now: DateTime<Utc>) -> Order {
        Order {
            id,
            user_id: self.user_id,
            items: self.items,
            shipping_address: self.shipping_address,
            payment_method: self.payment_method,
            payment_result: None,
            items_price: self.items_price,
            tax_price: self.tax_price,
            shipping_price: self.shipping_price,
            total_price: self.total_price,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order() -> Order {
        NewOrder {
            user_id: UserId::new(3),
            items: vec![OrderItem {
                product_id: ProductId::new(9),
                name: "Mug".into(),
                quantity: 2,
                price: Decimal::new(1250, 2),
                image: "/mug.jpg".into(),
            }],
            shipping_address: Address::default(),
            payment_method: "card".into(),
            items_price: Decimal::new(2500, 2),
            tax_price: Decimal::new(375, 2),
            shipping_price: Decimal::new(4500, 2),
            total_price: Decimal::new(7375, 2),
        }
        .into_order(OrderId::new(1), Utc::now())
    }

    #[test]
    fn test_new_order_starts_pending_and_unpaid() {
        let o = order();
        assert_eq!(o.status, OrderStatus::Pending);
        assert!(!o.is_paid && !o.is_delivered);
        assert_eq!(o.item_count(), 2);
        assert_eq!(o.items[0].line_total(), Decimal::new(2500, 2));
    }

    #[test]
    fn test_mark_paid_once() {
        let mut o = order();
        o.mark_paid(PaymentResult::default(), Utc::now()).unwrap();
        assert!(o.is_paid && o.paid_at.is_some());
        assert_eq!(
            o.mark_paid(PaymentResult::default(), Utc::now()),
            Err(OrderStateError::AlreadyPaid)
        );
    }

    #[test]
    fn test_cancelled_order_cannot_be_paid() {
        let mut o = order();
        o.set_status(OrderStatus::Cancelled, Utc::now());
        assert_eq!(
            o.mark_paid(PaymentResult::default(), Utc::now()),
            Err(OrderStateError::Cancelled)
        );
    }

    #[test]
    fn test_status_delivered_sets_flags() {
        let mut o = order();
        o.set_status(OrderStatus::Delivered, Utc::now());
        assert!(o.is_delivered && o.delivered_at.is_some());
        o.set_status(OrderStatus::Shipped, Utc::now());
        assert!(!o.is_delivered);
        assert_eq!(o.status, OrderStatus::Shipped);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(order()).unwrap();
        assert!(json.get("orderItems").is_some());
        assert_eq!(json["user"], 3);
        assert_eq!(json["orderItems"][0]["product"], 9);
        assert_eq!(json["status"], "pending");
    }
}
