//! Persistence for the API.
//!
//! Storage is reached through the [`Database`] port, a set of object-safe
//! async traits grouped by aggregate. Two adapters implement it:
//!
//! - [`postgres::PgDatabase`] - `PostgreSQL` via sqlx (production)
//! - [`memory::MemoryDatabase`] - process-local maps (tests, local demos)
//!
//! ## Tables
//!
//! - `users` - Accounts with embedded address (`JSONB`)
//! - `products` - Catalog with tag lists (`TEXT[]`)
//! - `orders` - Orders with embedded line items and shipping address (`JSONB`)
//! - `settings` - Store settings documents keyed by section
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p emporium-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use emporium_core::{Email, OrderId, ProductId, UserId};

use crate::models::{
    NewOrder, NewProduct, NewUser, Order, ProfileChanges, Product, StoreSettings, User,
};

pub use memory::MemoryDatabase;
pub use postgres::PgDatabase;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A product no longer exists while placing an order.
    #[error("product not found: {0}")]
    ProductMissing(ProductId),

    /// A stock decrement would take a product below zero.
    #[error("insufficient stock for {name}: {available} available")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: i32,
    },
}

impl RepositoryError {
    pub(crate) fn corrupt(what: &str, err: impl std::fmt::Display) -> Self {
        Self::DataCorruption(format!("invalid {what} in database: {err}"))
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Query types
// =============================================================================

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    /// Largest page size a client may request.
    pub const MAX_LIMIT: u32 = 100;

    /// Build a page from optional query values, clamping to sane bounds.
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, Self::MAX_LIMIT),
        }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    /// Number of pages needed to show `total` rows.
    #[must_use]
    pub fn pages_for(&self, total: i64) -> i64 {
        let limit = i64::from(self.limit);
        (total + limit - 1) / limit
    }

    /// Slice an in-memory, already ordered collection.
    #[must_use]
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .iter()
            .skip(start)
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

/// Stock level filter for the admin product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    /// Fewer than [`crate::models::product::LOW_STOCK_THRESHOLD`] units.
    Low,
    /// No units left.
    Out,
}

/// Product listing filter. Empty fields don't constrain.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub is_active: Option<bool>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Case-insensitive substring match on name, description or category.
    pub search: Option<String>,
    pub stock: Option<StockStatus>,
    pub exclude: Option<ProductId>,
}

impl ProductFilter {
    /// Filter for what shoppers may see.
    #[must_use]
    pub fn storefront() -> Self {
        Self {
            is_active: Some(true),
            ..Self::default()
        }
    }

    /// Whether `product` passes the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        use crate::models::product::LOW_STOCK_THRESHOLD;

        if self.is_active.is_some_and(|a| a != product.is_active) {
            return false;
        }
        if self
            .category
            .as_ref()
            .is_some_and(|c| *c != product.category)
        {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = [&product.name, &product.description, &product.category]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        match self.stock {
            Some(StockStatus::Low) if product.stock >= LOW_STOCK_THRESHOLD => return false,
            Some(StockStatus::Out) if product.stock != 0 => return false,
            _ => {}
        }
        self.exclude != Some(product.id)
    }
}

/// Product list ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
}

impl ProductSort {
    /// Parse the `sort` query value; unknown values fall back to newest.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            Some("rating") => Self::Rating,
            _ => Self::Newest,
        }
    }
}

/// Order listing filter. Results are always newest first.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<UserId>,
    pub paid_only: bool,
    /// Inclusive lower bound on `created_at`.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub until: Option<DateTime<Utc>>,
}

impl OrderFilter {
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        self.user_id.is_none_or(|u| u == order.user_id)
            && (!self.paid_only || order.is_paid)
            && self.since.is_none_or(|s| order.created_at >= s)
            && self.until.is_none_or(|u| order.created_at < u)
    }
}

// =============================================================================
// Ports
// =============================================================================

/// Account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn count_users(&self) -> Result<i64, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Insert a user.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Persist the account fields of `user` (name, email, role, address,
    /// phone, active and verified flags) and bump `updated_at`.
    ///
    /// The password hash and last login are only written by
    /// [`Self::set_password_hash`] and [`Self::record_login`].
    ///
    /// Returns `RepositoryError::NotFound` for an unknown id and
    /// `RepositoryError::Conflict` if the new email is taken.
    async fn update_user(&self, user: &User) -> Result<User, RepositoryError>;

    /// Stamp `last_login` on an active account.
    ///
    /// Returns `None` if the account is gone or deactivated.
    async fn record_login(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Replace the password hash of an active account.
    ///
    /// Returns `false` if the account is gone or deactivated.
    async fn set_password_hash(&self, id: UserId, hash: &str) -> Result<bool, RepositoryError>;

    /// Apply self-service profile changes to an active account.
    ///
    /// Returns `None` if the account is gone or deactivated.
    async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<Option<User>, RepositoryError>;

    /// Returns `true` if a row was deleted.
    async fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError>;

    /// Users newest first; `None` returns everyone.
    async fn list_users(&self, page: Option<Page>) -> Result<Vec<User>, RepositoryError>;
}

/// Catalog persistence.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn count_products(&self, filter: &ProductFilter) -> Result<i64, RepositoryError>;

    async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: Option<Page>,
    ) -> Result<Vec<Product>, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Persist every mutable field of `product` and bump `updated_at`.
    async fn update_product(&self, product: &Product) -> Result<Product, RepositoryError>;

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;

    /// Distinct categories, sorted.
    async fn product_categories(&self, active_only: bool) -> Result<Vec<String>, RepositoryError>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Decrement stock for every line and insert the order, atomically.
    ///
    /// Either every decrement and the insert happen, or nothing does.
    /// Returns `RepositoryError::InsufficientStock` when a line cannot be
    /// covered and `RepositoryError::ProductMissing` when a product is gone.
    async fn place_order(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: Option<Page>,
    ) -> Result<Vec<Order>, RepositoryError>;

    async fn count_orders(&self, filter: &OrderFilter) -> Result<i64, RepositoryError>;

    /// Persist payment, delivery and status fields of `order`.
    async fn update_order(&self, order: &Order) -> Result<Order, RepositoryError>;
}

/// Store settings persistence.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Stored settings, or `None` if never saved.
    async fn load_settings(&self) -> Result<Option<StoreSettings>, RepositoryError>;

    async fn save_settings(&self, settings: &StoreSettings) -> Result<(), RepositoryError>;
}

/// Everything the API needs from storage.
#[async_trait]
pub trait Database: UserStore + ProductStore + OrderStore + SettingsStore {
    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Settings with defaults for anything never saved.
    async fn settings(&self) -> Result<StoreSettings, RepositoryError> {
        Ok(self.load_settings().await?.unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamps_and_counts() {
        let page = Page::new(Some(0), Some(500), 12);
        assert_eq!(page, Page { page: 1, limit: 100 });

        let page = Page::new(Some(3), None, 12);
        assert_eq!(page.offset(), 24);
        assert_eq!(page.pages_for(0), 0);
        assert_eq!(page.pages_for(12), 1);
        assert_eq!(page.pages_for(25), 3);
    }

    #[test]
    fn test_page_slice() {
        let items: Vec<i32> = (1..=25).collect();
        assert_eq!(Page::new(Some(3), Some(10), 10).slice(&items), vec![21, 22, 23, 24, 25]);
        assert!(Page::new(Some(9), Some(10), 10).slice(&items).is_empty());
    }

    #[test]
    fn test_sort_from_query() {
        assert_eq!(ProductSort::from_query(Some("price_desc")), ProductSort::PriceDesc);
        assert_eq!(ProductSort::from_query(Some("bogus")), ProductSort::Newest);
        assert_eq!(ProductSort::from_query(None), ProductSort::Newest);
    }
}
