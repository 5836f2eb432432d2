//! Checkout: turn a request into a priced, persisted order.
//!
//! Prices always come from the catalog at the moment of purchase; any
//! prices a client sends are ignored. Stock is checked here for friendly
//! errors and again inside the store's atomic `place_order`.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use emporium_core::{Address, ProductId, UserId, round_money};

use super::cart::CartStore;
use crate::db::{Database, RepositoryError};
use crate::models::{NewOrder, Order, OrderItem, StoreSettings};

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("No order items provided")]
    NoItems,

    #[error("Shipping address is required")]
    MissingShippingAddress,

    #[error("Shipping address must include street, city, zip code and country")]
    IncompleteShippingAddress,

    #[error("Payment method is required")]
    MissingPaymentMethod,

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Insufficient stock for {name}. Available: {available}")]
    InsufficientStock { name: String, available: i32 },

    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CheckoutError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ProductMissing(id) => Self::ProductNotFound(id),
            RepositoryError::InsufficientStock {
                name, available, ..
            } => Self::InsufficientStock { name, available },
            other => Self::Repository(other),
        }
    }
}

/// One requested line.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutLine {
    pub product: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// Body of `POST /api/orders`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutRequest {
    pub order_items: Vec<CheckoutLine>,
    pub shipping_address: Option<Address>,
    pub payment_method: Option<String>,
}

// =============================================================================
// Pricing
// =============================================================================

/// Computed order totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub items_price: Decimal,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
    pub total_price: Decimal,
}

/// Shipping and tax rules taken from store settings.
#[derive(Debug, Clone, Copy)]
pub struct PricingPolicy {
    pub shipping_fee: Decimal,
    pub free_shipping_threshold: Option<Decimal>,
    /// Percent, e.g. `15` for 15 %.
    pub vat_rate: Decimal,
}

impl PricingPolicy {
    #[must_use]
    pub const fn from_settings(settings: &StoreSettings) -> Self {
        Self {
            shipping_fee: settings.default_shipping_fee,
            free_shipping_threshold: settings.free_shipping_threshold,
            vat_rate: settings.vat_rate,
        }
    }

    /// Price a set of lines.
    #[must_use]
    pub fn price(&self, items: &[OrderItem]) -> Totals {
        let items_price: Decimal = items.iter().map(OrderItem::line_total).sum();
        let tax_price = round_money(items_price * self.vat_rate / Decimal::ONE_HUNDRED);
        let shipping_price = match self.free_shipping_threshold {
            Some(threshold) if items_price >= threshold => Decimal::ZERO,
            _ => self.shipping_fee,
        };
        Totals {
            items_price,
            tax_price,
            shipping_price,
            total_price: items_price + shipping_price + tax_price,
        }
    }
}

// =============================================================================
// Placing Orders
// =============================================================================

/// Merge lines for the same product, keeping first-seen order.
fn merge_lines(lines: &[CheckoutLine]) -> Result<Vec<(ProductId, i32)>, CheckoutError> {
    let mut merged: Vec<(ProductId, i32)> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity < 1 {
            return Err(CheckoutError::InvalidQuantity);
        }
        match merged.iter_mut().find(|(id, _)| *id == line.product) {
            Some((_, quantity)) => *quantity = quantity.saturating_add(line.quantity),
            None => merged.push((line.product, line.quantity)),
        }
    }
    Ok(merged)
}

/// Validate, price and persist an order for `user`, then clear their cart.
///
/// # Errors
///
/// Returns a `CheckoutError` describing the first problem found; no stock
/// is decremented unless the order is stored.
#[instrument(skip(db, carts, request), fields(lines = request.order_items.len()))]
pub async fn place_order(
    db: &dyn Database,
    carts: &CartStore,
    user: UserId,
    request: CheckoutRequest,
) -> Result<Order, CheckoutError> {
    if request.order_items.is_empty() {
        return Err(CheckoutError::NoItems);
    }
    let address = request
        .shipping_address
        .ok_or(CheckoutError::MissingShippingAddress)?
        .trimmed();
    if !address.is_complete() {
        return Err(CheckoutError::IncompleteShippingAddress);
    }
    let payment_method = request
        .payment_method
        .map(|m| m.trim().to_owned())
        .filter(|m| !m.is_empty())
        .ok_or(CheckoutError::MissingPaymentMethod)?;

    let mut items = Vec::new();
    for (product_id, quantity) in merge_lines(&request.order_items)? {
        let product = db
            .get_product(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(CheckoutError::ProductNotFound(product_id))?;

        if product.stock < quantity {
            return Err(CheckoutError::InsufficientStock {
                name: product.name,
                available: product.stock,
            });
        }

        items.push(OrderItem {
            product_id,
            name: product.name,
            quantity,
            price: product.price,
            image: product.image,
        });
    }

    let settings = db.settings().await?;
    let totals = PricingPolicy::from_settings(&settings).price(&items);

    let order = db
        .place_order(NewOrder {
            user_id: user,
            items,
            shipping_address: address,
            payment_method,
            items_price: totals.items_price,
            tax_price: totals.tax_price,
            shipping_price: totals.shipping_price,
            total_price: totals.total_price,
        })
        .await?;

    carts.clear(user).await;

    tracing::info!(order_id = %order.id, total = %order.total_price, "order placed");
    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use emporium_core::Currency;

    use super::*;
    use crate::db::{OrderFilter, OrderStore, ProductStore};
    use crate::models::{NewProduct, Product};

    fn item(cents: i64, quantity: i32) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(1),
            name: "Thing".into(),
            quantity,
            price: Decimal::new(cents, 2),
            image: String::new(),
        }
    }

    fn address() -> Address {
        Address {
            street: "1 Main Rd".into(),
            city: "Cape Town".into(),
            state: "WC".into(),
            zip_code: "8001".into(),
            country: "South Africa".into(),
        }
    }

    async fn product(db: &dyn Database, cents: i64, stock: i32) -> Product {
        db.create_product(NewProduct {
            name: "Kettle".into(),
            description: "Boils water".into(),
            price: Decimal::new(cents, 2),
            currency: Currency::Zar,
            category: "Kitchen".into(),
            image: "/kettle.jpg".into(),
            stock,
            rating: 0.0,
            num_reviews: 0,
            is_active: true,
            discount: 0,
            features: vec![],
            brand: None,
            colors: vec![],
            sizes: vec![],
        })
        .await
        .unwrap()
    }

    fn request(lines: Vec<CheckoutLine>) -> CheckoutRequest {
        CheckoutRequest {
            order_items: lines,
            shipping_address: Some(address()),
            payment_method: Some("card".into()),
        }
    }

    #[test]
    fn test_totals_formula() {
        let policy = PricingPolicy::from_settings(&StoreSettings::default());
        let totals = policy.price(&[item(10000, 2), item(2550, 1)]);
        assert_eq!(totals.items_price, Decimal::new(22550, 2));
        // 15 % of 225.50 = 33.825, rounded away from zero
        assert_eq!(totals.tax_price, Decimal::new(3383, 2));
        assert_eq!(totals.shipping_price, Decimal::new(4500, 2));
        assert_eq!(
            totals.total_price,
            totals.items_price + totals.shipping_price + totals.tax_price
        );
    }

    #[test]
    fn test_free_shipping_threshold() {
        let policy = PricingPolicy {
            shipping_fee: Decimal::new(4500, 2),
            free_shipping_threshold: Some(Decimal::from(500)),
            vat_rate: Decimal::ZERO,
        };
        assert_eq!(policy.price(&[item(50000, 1)]).shipping_price, Decimal::ZERO);
        assert_eq!(
            policy.price(&[item(49999, 1)]).shipping_price,
            Decimal::new(4500, 2)
        );
    }

    #[test]
    fn test_merge_lines() {
        let p = ProductId::new(3);
        let q = ProductId::new(4);
        let merged = merge_lines(&[
            CheckoutLine { product: p, quantity: 1 },
            CheckoutLine { product: q, quantity: 2 },
            CheckoutLine { product: p, quantity: 3 },
        ])
        .unwrap();
        assert_eq!(merged, vec![(p, 4), (q, 2)]);
        assert!(merge_lines(&[CheckoutLine { product: p, quantity: 0 }]).is_err());
    }

    #[tokio::test]
    async fn test_place_order_decrements_stock_and_clears_cart() {
        let db = crate::db::MemoryDatabase::new();
        let carts = CartStore::new(Duration::from_secs(60));
        let user = UserId::new(1);
        let p = product(&db, 20000, 5).await;
        carts.add(&db, user, p.id, 2).await.unwrap();

        let order = place_order(
            &db,
            &carts,
            user,
            request(vec![CheckoutLine { product: p.id, quantity: 2 }]),
        )
        .await
        .unwrap();

        assert_eq!(order.items_price, Decimal::new(40000, 2));
        assert_eq!(db.get_product(p.id).await.unwrap().unwrap().stock, 3);
        assert!(carts.get(user).await.is_empty());
    }

    #[tokio::test]
    async fn test_place_order_rejects_insufficient_stock() {
        let db = crate::db::MemoryDatabase::new();
        let carts = CartStore::new(Duration::from_secs(60));
        let p = product(&db, 20000, 1).await;

        let err = place_order(
            &db,
            &carts,
            UserId::new(1),
            request(vec![
                CheckoutLine { product: p.id, quantity: 1 },
                CheckoutLine { product: p.id, quantity: 1 },
            ]),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Insufficient stock for Kettle. Available: 1");
        assert_eq!(db.get_product(p.id).await.unwrap().unwrap().stock, 1);
        assert_eq!(db.count_orders(&OrderFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_place_order_validation() {
        let db = crate::db::MemoryDatabase::new();
        let carts = CartStore::new(Duration::from_secs(60));
        let user = UserId::new(1);

        assert!(matches!(
            place_order(&db, &carts, user, CheckoutRequest::default()).await,
            Err(CheckoutError::NoItems)
        ));

        let mut no_address = request(vec![CheckoutLine {
            product: ProductId::new(1),
            quantity: 1,
        }]);
        no_address.shipping_address = None;
        assert!(matches!(
            place_order(&db, &carts, user, no_address).await,
            Err(CheckoutError::MissingShippingAddress)
        ));

        assert!(matches!(
            place_order(
                &db,
                &carts,
                user,
                request(vec![CheckoutLine { product: ProductId::new(77), quantity: 1 }])
            )
            .await,
            Err(CheckoutError::ProductNotFound(_))
        ));
    }
}
