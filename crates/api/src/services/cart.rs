//! Per-user shopping carts held in process memory.
//!
//! Carts live in a `moka` cache keyed by user id; each entry is a
//! `tokio::sync::Mutex` so concurrent requests from one user serialise while
//! different users never contend. Idle carts expire and everything is lost
//! on restart.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::instrument;

use emporium_core::{ProductId, UserId};

use crate::db::{Database, RepositoryError};
use crate::models::{Cart, CartItem};

/// Upper bound on live carts.
const MAX_CARTS: u64 = 100_000;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Valid quantity is required")]
    InvalidQuantity,

    #[error("Insufficient stock. Available: {available}")]
    InsufficientStock { available: i32 },

    #[error("Cart not found")]
    CartNotFound,

    #[error("Item not found in cart")]
    ItemNotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Process-wide cart map.
#[derive(Clone)]
pub struct CartStore {
    carts: Cache<UserId, Arc<Mutex<Cart>>>,
}

impl CartStore {
    /// Create a store whose carts expire after `idle` without access.
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        Self {
            carts: Cache::builder()
                .max_capacity(MAX_CARTS)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Snapshot of the user's cart; empty if none exists.
    pub async fn get(&self, user: UserId) -> Cart {
        match self.carts.get(&user).await {
            Some(cart) => cart.lock().await.clone(),
            None => Cart::default(),
        }
    }

    async fn entry(&self, user: UserId) -> Arc<Mutex<Cart>> {
        self.carts
            .get_with(user, async { Arc::new(Mutex::new(Cart::default())) })
            .await
    }

    /// Add `quantity` of a product, merging with an existing line.
    ///
    /// The product must exist and be active, and the merged quantity must
    /// not exceed current stock.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a quantity below 1,
    /// `CartError::ProductNotFound` for a missing or inactive product and
    /// `CartError::InsufficientStock` when stock can't cover the line.
    #[instrument(skip(self, db))]
    pub async fn add(
        &self,
        db: &dyn Database,
        user: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Cart, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let product = db
            .get_product(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(CartError::ProductNotFound)?;

        let entry = self.entry(user).await;
        let mut cart = entry.lock().await;

        let wanted = cart.quantity_of(product_id).saturating_add(quantity);
        if wanted > product.stock {
            return Err(CartError::InsufficientStock {
                available: product.stock,
            });
        }

        cart.add(CartItem {
            product_id,
            name: product.name,
            price: product.price,
            image: product.image,
            quantity,
        });
        Ok(cart.clone())
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a quantity below 1,
    /// `CartError::CartNotFound` / `CartError::ItemNotFound` when there is
    /// nothing to update and `CartError::InsufficientStock` when stock can't
    /// cover the new quantity.
    #[instrument(skip(self, db))]
    pub async fn update_quantity(
        &self,
        db: &dyn Database,
        user: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Cart, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let entry = self.carts.get(&user).await.ok_or(CartError::CartNotFound)?;
        let mut cart = entry.lock().await;
        if cart.quantity_of(product_id) == 0 {
            return Err(CartError::ItemNotFound);
        }

        if let Some(product) = db.get_product(product_id).await?
            && quantity > product.stock
        {
            return Err(CartError::InsufficientStock {
                available: product.stock,
            });
        }

        cart.set_quantity(product_id, quantity);
        Ok(cart.clone())
    }

    /// Remove a line. Removing an absent line is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the user has no cart.
    pub async fn remove(&self, user: UserId, product_id: ProductId) -> Result<Cart, CartError> {
        let entry = self.carts.get(&user).await.ok_or(CartError::CartNotFound)?;
        let mut cart = entry.lock().await;
        cart.remove(product_id);
        Ok(cart.clone())
    }

    /// Empty the user's cart.
    pub async fn clear(&self, user: UserId) {
        if let Some(entry) = self.carts.get(&user).await {
            entry.lock().await.clear();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use emporium_core::Currency;

    use super::*;
    use crate::db::{MemoryDatabase, ProductStore};
    use crate::models::{NewProduct, Product};

    async fn product(db: &MemoryDatabase, cents: i64, stock: i32, active: bool) -> Product {
        db.create_product(NewProduct {
            name: "Lamp".into(),
            description: "A lamp".into(),
            price: Decimal::new(cents, 2),
            currency: Currency::Zar,
            category: "Home".into(),
            image: "/lamp.jpg".into(),
            stock,
            rating: 0.0,
            num_reviews: 0,
            is_active: active,
            discount: 0,
            features: vec![],
            brand: None,
            colors: vec![],
            sizes: vec![],
        })
        .await
        .unwrap()
    }

    fn store() -> CartStore {
        CartStore::new(Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_add_merges_and_checks_stock() {
        let db = MemoryDatabase::new();
        let p = product(&db, 1000, 3, true).await;
        let carts = store();
        let user = UserId::new(1);

        carts.add(&db, user, p.id, 2).await.unwrap();
        let cart = carts.add(&db, user, p.id, 1).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total, Decimal::new(3000, 2));

        assert!(matches!(
            carts.add(&db, user, p.id, 1).await,
            Err(CartError::InsufficientStock { available: 3 })
        ));
    }

    #[tokio::test]
    async fn test_add_rejects_inactive_and_bad_quantity() {
        let db = MemoryDatabase::new();
        let hidden = product(&db, 1000, 3, false).await;
        let carts = store();
        let user = UserId::new(1);

        assert!(matches!(
            carts.add(&db, user, hidden.id, 1).await,
            Err(CartError::ProductNotFound)
        ));
        assert!(matches!(
            carts.add(&db, user, hidden.id, 0).await,
            Err(CartError::InvalidQuantity)
        ));
    }

    #[tokio::test]
    async fn test_update_and_remove_need_a_cart() {
        let db = MemoryDatabase::new();
        let p = product(&db, 500, 10, true).await;
        let carts = store();
        let user = UserId::new(7);

        assert!(matches!(
            carts.update_quantity(&db, user, p.id, 2).await,
            Err(CartError::CartNotFound)
        ));
        assert!(matches!(
            carts.remove(user, p.id).await,
            Err(CartError::CartNotFound)
        ));

        carts.add(&db, user, p.id, 1).await.unwrap();
        let cart = carts.update_quantity(&db, user, p.id, 4).await.unwrap();
        assert_eq!(cart.total, Decimal::new(2000, 2));
        assert!(matches!(
            carts.update_quantity(&db, user, ProductId::new(99), 1).await,
            Err(CartError::ItemNotFound)
        ));

        let cart = carts.remove(user, p.id).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let db = MemoryDatabase::new();
        let p = product(&db, 500, 10, true).await;
        let carts = store();

        carts.add(&db, UserId::new(1), p.id, 1).await.unwrap();
        assert!(carts.get(UserId::new(2)).await.is_empty());

        carts.clear(UserId::new(1)).await;
        assert!(carts.get(UserId::new(1)).await.is_empty());
    }
}
