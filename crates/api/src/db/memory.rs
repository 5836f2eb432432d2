//! In-memory storage adapter.
//!
//! Backs the router tests and `EMPORIUM_STORE=memory` demos. All tables sit
//! behind one `RwLock`, which makes `place_order` trivially atomic: stock is
//! checked and decremented under the same write guard that inserts the order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use emporium_core::{Email, OrderId, ProductId, UserId};

use super::{
    Database, OrderFilter, OrderStore, Page, ProductFilter, ProductSort, ProductStore,
    RepositoryError, SettingsStore, UserStore,
};
use crate::models::{
    NewOrder, NewProduct, NewUser, Order, ProfileChanges, Product, StoreSettings, User,
};

/// Storage kept entirely in process memory.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    settings: Option<StoreSettings>,
    last_user_id: i32,
    last_product_id: i32,
    last_order_id: i32,
}

impl MemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare_products(sort: ProductSort, a: &Product, b: &Product) -> Ordering {
    match sort {
        ProductSort::Newest => b
            .created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id)),
        ProductSort::PriceAsc => a.price.cmp(&b.price).then_with(|| a.id.cmp(&b.id)),
        ProductSort::PriceDesc => b.price.cmp(&a.price).then_with(|| a.id.cmp(&b.id)),
        ProductSort::Rating => b
            .rating
            .total_cmp(&a.rating)
            .then_with(|| a.id.cmp(&b.id)),
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, i32)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn active_user(tables: &mut Tables, id: UserId) -> Option<&mut User> {
    tables.users.get_mut(&id).filter(|u| u.is_active)
}

fn paged<T: Clone>(items: &[T], page: Option<Page>) -> Vec<T> {
    page.map_or_else(|| items.to_vec(), |p| p.slice(items))
}

#[async_trait]
impl UserStore for MemoryDatabase {
    async fn count_users(&self) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(i64::try_from(tables.users.len()).unwrap_or(i64::MAX))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| &u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        tables.last_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: UserId::new(tables.last_user_id),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            address: None,
            phone: None,
            is_active: true,
            email_verified: false,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_user(&self, user: &User) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or(RepositoryError::NotFound)?;
        stored.name.clone_from(&user.name);
        stored.email = user.email.clone();
        stored.role = user.role;
        stored.address.clone_from(&user.address);
        stored.phone.clone_from(&user.phone);
        stored.is_active = user.is_active;
        stored.email_verified = user.email_verified;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn record_login(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(active_user(&mut tables, id).map(|user| {
            user.last_login = Some(Utc::now());
            user.clone()
        }))
    }

    async fn set_password_hash(&self, id: UserId, hash: &str) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(active_user(&mut tables, id)
            .map(|user| {
                hash.clone_into(&mut user.password_hash);
                user.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(active_user(&mut tables, id).map(|user| {
            changes.apply(user);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError> {
        Ok(self.tables.write().await.users.remove(&id).is_some())
    }

    async fn list_users(&self, page: Option<Page>) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        newest_first(&mut users, |u| (u.created_at, u.id.as_i32()));
        Ok(paged(&users, page))
    }
}

#[async_trait]
impl ProductStore for MemoryDatabase {
    async fn count_products(&self, filter: &ProductFilter) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        let count = tables.products.values().filter(|p| filter.matches(p)).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: Option<Page>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| compare_products(sort, a, b));
        Ok(paged(&products, page))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.last_product_id += 1;
        let now = Utc::now();
        let created = Product {
            id: ProductId::new(tables.last_product_id),
            name: product.name,
            description: product.description,
            price: product.price,
            currency: product.currency,
            category: product.category,
            image: product.image,
            stock: product.stock,
            rating: product.rating,
            num_reviews: product.num_reviews,
            is_active: product.is_active,
            discount: product.discount,
            features: product.features,
            brand: product.brand,
            colors: product.colors,
            sizes: product.sizes,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_product(&self, product: &Product) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .products
            .get_mut(&product.id)
            .ok_or(RepositoryError::NotFound)?;
        let created_at = stored.created_at;
        *stored = Product {
            created_at,
            updated_at: Utc::now(),
            ..product.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        Ok(self.tables.write().await.products.remove(&id).is_some())
    }

    async fn product_categories(&self, active_only: bool) -> Result<Vec<String>, RepositoryError> {
        let tables = self.tables.read().await;
        let categories: BTreeSet<String> = tables
            .products
            .values()
            .filter(|p| !active_only || p.is_active)
            .map(|p| p.category.clone())
            .collect();
        Ok(categories.into_iter().collect())
    }
}

#[async_trait]
impl OrderStore for MemoryDatabase {
    async fn place_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;

        let mut wanted: HashMap<ProductId, i32> = HashMap::new();
        for item in &order.items {
            *wanted.entry(item.product_id).or_insert(0) += item.quantity;
        }

        // Check every line before touching anything
        for (&product_id, &quantity) in &wanted {
            let product = tables
                .products
                .get(&product_id)
                .filter(|p| p.is_active)
                .ok_or(RepositoryError::ProductMissing(product_id))?;
            if product.stock < quantity {
                return Err(RepositoryError::InsufficientStock {
                    product_id,
                    name: product.name.clone(),
                    available: product.stock,
                });
            }
        }

        let now = Utc::now();
        for (product_id, quantity) in wanted {
            if let Some(product) = tables.products.get_mut(&product_id) {
                product.stock -= quantity;
                product.updated_at = now;
            }
        }

        tables.last_order_id += 1;
        let placed = order.into_order(OrderId::new(tables.last_order_id), now);
        tables.orders.insert(placed.id, placed.clone());
        Ok(placed)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: Option<Page>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        newest_first(&mut orders, |o| (o.created_at, o.id.as_i32()));
        Ok(paged(&orders, page))
    }

    async fn count_orders(&self, filter: &OrderFilter) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        let count = tables.orders.values().filter(|o| filter.matches(o)).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn update_order(&self, order: &Order) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .orders
            .get_mut(&order.id)
            .ok_or(RepositoryError::NotFound)?;
        stored.payment_result.clone_from(&order.payment_result);
        stored.is_paid = order.is_paid;
        stored.paid_at = order.paid_at;
        stored.is_delivered = order.is_delivered;
        stored.delivered_at = order.delivered_at;
        stored.status = order.status;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}

#[async_trait]
impl SettingsStore for MemoryDatabase {
    async fn load_settings(&self) -> Result<Option<StoreSettings>, RepositoryError> {
        Ok(self.tables.read().await.settings.clone())
    }

    async fn save_settings(&self, settings: &StoreSettings) -> Result<(), RepositoryError> {
        self.tables.write().await.settings = Some(settings.clone());
        Ok(())
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use emporium_core::{Address, Currency, Role};

    use super::*;
    use crate::models::OrderItem;

    fn new_product(name: &str, cents: i64, stock: i32) -> NewProduct {
        NewProduct {
            name: name.into(),
            description: "desc".into(),
            price: Decimal::new(cents, 2),
            currency: Currency::Zar,
            category: "General".into(),
            image: "/img.jpg".into(),
            stock,
            rating: 0.0,
            num_reviews: 0,
            is_active: true,
            discount: 0,
            features: vec![],
            brand: None,
            colors: vec![],
            sizes: vec![],
        }
    }

    fn new_order(lines: &[(&Product, i32)]) -> NewOrder {
        NewOrder {
            user_id: UserId::new(1),
            items: lines
                .iter()
                .map(|(p, q)| OrderItem {
                    product_id: p.id,
                    name: p.name.clone(),
                    quantity: *q,
                    price: p.price,
                    image: p.image.clone(),
                })
                .collect(),
            shipping_address: Address::default(),
            payment_method: "card".into(),
            items_price: Decimal::ZERO,
            tax_price: Decimal::ZERO,
            shipping_price: Decimal::ZERO,
            total_price: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let db = MemoryDatabase::new();
        let user = NewUser {
            name: "Jo".into(),
            email: Email::parse("jo@example.com").unwrap(),
            password_hash: "h".into(),
            role: Role::User,
        };
        db.create_user(user.clone()).await.unwrap();
        assert!(matches!(
            db.create_user(user).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_place_order_is_all_or_nothing() {
        let db = MemoryDatabase::new();
        let plenty = db.create_product(new_product("Plenty", 100, 10)).await.unwrap();
        let scarce = db.create_product(new_product("Scarce", 100, 1)).await.unwrap();

        let err = db
            .place_order(new_order(&[(&plenty, 3), (&scarce, 2)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::InsufficientStock { available: 1, .. }
        ));

        // Nothing was decremented
        assert_eq!(db.get_product(plenty.id).await.unwrap().unwrap().stock, 10);
        assert_eq!(db.count_orders(&OrderFilter::default()).await.unwrap(), 0);

        db.place_order(new_order(&[(&plenty, 3), (&scarce, 1)]))
            .await
            .unwrap();
        assert_eq!(db.get_product(plenty.id).await.unwrap().unwrap().stock, 7);
        assert_eq!(db.get_product(scarce.id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_duplicate_lines_count_against_stock_together() {
        let db = MemoryDatabase::new();
        let p = db.create_product(new_product("Pair", 100, 3)).await.unwrap();
        let err = db
            .place_order(new_order(&[(&p, 2), (&p, 2)]))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InsufficientStock { .. }));
    }

    #[tokio::test]
    async fn test_inactive_product_cannot_be_ordered() {
        let db = MemoryDatabase::new();
        let mut retired = db.create_product(new_product("Retired", 100, 5)).await.unwrap();
        retired.is_active = false;
        db.update_product(&retired).await.unwrap();

        let err = db
            .place_order(new_order(&[(&retired, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ProductMissing(p) if p == retired.id));
        assert_eq!(db.get_product(retired.id).await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_list_products_sorted_by_price() {
        let db = MemoryDatabase::new();
        db.create_product(new_product("B", 500, 1)).await.unwrap();
        db.create_product(new_product("A", 100, 1)).await.unwrap();
        db.create_product(new_product("C", 900, 1)).await.unwrap();

        let names: Vec<String> = db
            .list_products(&ProductFilter::default(), ProductSort::PriceAsc, None)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        let newest = db
            .list_products(&ProductFilter::default(), ProductSort::Newest, None)
            .await
            .unwrap();
        assert_eq!(newest[0].name, "C");
    }
}
