//! Seed the database with demo accounts, a catalog and two orders.
//!
//! Unless `--keep-existing` is given, users, products and orders are
//! cleared first. Store settings are left alone.
//!
//! Demo logins:
//!
//! | Email              | Password      | Role  |
//! |--------------------|---------------|-------|
//! | admin@example.com  | `admin123`    | admin |
//! | john@example.com   | `user123`     | user  |
//! | jane@example.com   | `password123` | user  |

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use emporium_api::db::{
    Database, OrderStore, PgDatabase, ProductStore, RepositoryError, UserStore,
};
use emporium_api::models::{
    NewOrder, NewProduct, NewUser, Order, OrderItem, OrderStateError, PaymentResult, Product, User,
};
use emporium_api::services::auth::{AuthError, hash_password};
use emporium_api::services::checkout::PricingPolicy;
use emporium_core::{Address, Currency, Email, EmailError, OrderStatus, Phone, Role};
use thiserror::Error;

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid seed email: {0}")]
    Email(#[from] EmailError),

    #[error(transparent)]
    Password(#[from] AuthError),

    #[error(transparent)]
    OrderState(#[from] OrderStateError),
}

struct DemoUser {
    name: &'static str,
    email: &'static str,
    password: &'static str,
    role: Role,
    phone: &'static str,
    address: [&'static str; 5],
}

const USERS: &[DemoUser] = &[
    DemoUser {
        name: "Admin User",
        email: "admin@example.com",
        password: "admin123",
        role: Role::Admin,
        phone: "123-456-7890",
        address: ["123 Admin St", "Admin City", "AC", "12345", "Adminland"],
    },
    DemoUser {
        name: "John Doe",
        email: "john@example.com",
        password: "user123",
        role: Role::User,
        phone: "987-654-3210",
        address: ["456 User Ave", "User City", "UC", "67890", "Userland"],
    },
    DemoUser {
        name: "Jane Smith",
        email: "jane@example.com",
        password: "password123",
        role: Role::User,
        phone: "555-123-4567",
        address: ["789 Main St", "Somewhere", "ST", "54321", "USA"],
    },
];

/// (name, description, price in cents, category, stock, rating, reviews, features)
type DemoProduct = (
    &'static str,
    &'static str,
    i64,
    &'static str,
    i32,
    f64,
    i32,
    &'static [&'static str],
);

#[rustfmt::skip]
const PRODUCTS: &[DemoProduct] = &[
    ("iPhone 15 Pro", "Latest Apple smartphone with A17 Pro chip", 1_499_999, "Electronics", 50, 4.8, 120, &[]),
    ("MacBook Pro 16\"", "Professional laptop with M3 Max chip", 2_249_999, "Electronics", 25, 4.9, 89, &[]),
    ("Sony Headphones", "Noise cancelling wireless headphones", 129_999, "Electronics", 100, 4.6, 210, &[]),
    ("Nike Air Max", "Comfortable running shoes", 312_999, "Fashion", 200, 4.5, 450, &[]),
    ("Leather Backpack", "Premium leather laptop backpack", 78_999, "Fashion", 75, 4.4, 120, &[]),
    ("Smart Watch Series 5", "Advanced smart watch with fitness tracking and notifications.", 319_999, "Electronics", 15, 4.3, 89, &["Heart Rate Monitor", "GPS", "Water Resistant", "Sleep Tracking"]),
    ("Running Shoes", "Comfortable running shoes with excellent arch support.", 228_999, "Sports", 40, 4.7, 210, &["Lightweight", "Breathable", "Shock Absorbing", "Non-slip"]),
    ("Laptop Backpack", "Waterproof laptop backpack with multiple compartments.", 24_999, "Accessories", 30, 4.2, 75, &["Waterproof", "Laptop Compartment", "USB Port", "Anti-theft"]),
    ("Coffee Maker", "Programmable coffee maker with thermal carafe.", 87_999, "Home", 20, 4.4, 95, &["Programmable", "Thermal Carafe", "24-hour Timer", "Auto Shut-off"]),
    ("Yoga Mat", "Eco-friendly yoga mat with excellent grip.", 92_999, "Sports", 50, 4.6, 150, &["Non-slip", "Eco-friendly", "Easy to Clean", "Lightweight"]),
    ("Wireless Mouse", "Ergonomic wireless mouse with long battery life.", 52_499, "Electronics", 60, 4.1, 85, &["Wireless", "Ergonomic", "Long Battery Life", "Silent Click"]),
    ("Desk Lamp", "LED desk lamp with adjustable brightness and color temperature.", 73_999, "Home", 35, 4.3, 65, &["LED", "Adjustable Brightness", "Color Temperature Control", "USB Charging"]),
    ("Wireless Earbuds", "True wireless earbuds with noise cancellation", 94_999, "Electronics", 100, 4.3, 210, &[]),
];

/// Seed demo data.
///
/// # Errors
///
/// Returns an error if no database URL is set or any insert fails.
pub async fn run(keep_existing: bool) -> Result<(), SeedError> {
    let pool = connect().await?;

    if !keep_existing {
        sqlx::query("TRUNCATE orders, products, users RESTART IDENTITY CASCADE")
            .execute(&pool)
            .await?;
        tracing::info!("Cleared existing data");
    }

    let db = PgDatabase::new(pool);

    let mut users = Vec::with_capacity(USERS.len());
    for demo in USERS {
        users.push(seed_user(&db, demo).await?);
    }
    tracing::info!(count = users.len(), "Seeded users");

    let mut products = Vec::with_capacity(PRODUCTS.len());
    for demo in PRODUCTS {
        products.push(db.create_product(new_product(demo)).await?);
    }
    tracing::info!(count = products.len(), "Seeded products");

    let orders = seed_orders(&db, &users, &products).await?;
    tracing::info!(count = orders, "Seeded orders");

    tracing::info!("Database seeded successfully!");
    for demo in USERS {
        tracing::info!("  {} / {} ({})", demo.email, demo.password, demo.role);
    }
    Ok(())
}

/// Insert a demo user, or reuse the existing account with that email.
async fn seed_user(db: &PgDatabase, demo: &DemoUser) -> Result<User, SeedError> {
    let email = Email::parse(demo.email)?;
    if let Some(existing) = db.find_user_by_email(&email).await? {
        tracing::info!(email = %email, "User exists, skipping");
        return Ok(existing);
    }

    let mut user = db
        .create_user(NewUser {
            name: demo.name.to_owned(),
            email,
            password_hash: hash_password(demo.password)?,
            role: demo.role,
        })
        .await?;

    let [street, city, state, zip_code, country] = demo.address;
    user.address = Some(Address {
        street: street.to_owned(),
        city: city.to_owned(),
        state: state.to_owned(),
        zip_code: zip_code.to_owned(),
        country: country.to_owned(),
    });
    user.phone = Phone::parse(demo.phone).ok();
    Ok(db.update_user(&user).await?)
}

fn new_product(
    &(name, description, cents, category, stock, rating, num_reviews, features): &DemoProduct,
) -> NewProduct {
    NewProduct {
        name: name.to_owned(),
        description: description.to_owned(),
        price: Decimal::new(cents, 2),
        currency: Currency::Zar,
        category: category.to_owned(),
        image: format!("/images/products/{}.jpg", slug(name)),
        stock,
        rating,
        num_reviews,
        is_active: true,
        discount: 0,
        features: features.iter().map(|&f| f.to_owned()).collect(),
        brand: None,
        colors: vec![],
        sizes: vec![],
    }
}

fn slug(name: &str) -> String {
    name.chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c == ' ' {
                Some('-')
            } else {
                None
            }
        })
        .collect()
}

/// One delivered order for John and one shipped order for Jane.
async fn seed_orders(
    db: &PgDatabase,
    users: &[User],
    products: &[Product],
) -> Result<usize, SeedError> {
    let (Some(john), Some(jane)) = (users.get(1), users.get(2)) else {
        return Ok(0);
    };
    let (Some(first), Some(second), Some(third)) =
        (products.first(), products.get(1), products.get(2))
    else {
        return Ok(0);
    };

    let policy = PricingPolicy::from_settings(&db.settings().await?);
    let now = Utc::now();

    let mut delivered = place(db, &policy, john, &[(first, 1), (second, 2)], "Credit Card").await?;
    delivered.mark_paid(demo_payment(john), now - Duration::days(7))?;
    delivered.set_status(OrderStatus::Delivered, now - Duration::days(5));
    db.update_order(&delivered).await?;

    let mut shipped = place(db, &policy, jane, &[(third, 1)], "PayPal").await?;
    shipped.mark_paid(demo_payment(jane), now - Duration::days(2))?;
    shipped.set_status(OrderStatus::Shipped, now - Duration::days(2));
    db.update_order(&shipped).await?;

    Ok(2)
}

async fn place(
    db: &PgDatabase,
    policy: &PricingPolicy,
    user: &User,
    lines: &[(&Product, i32)],
    payment_method: &str,
) -> Result<Order, SeedError> {
    let items: Vec<OrderItem> = lines
        .iter()
        .map(|&(product, quantity)| OrderItem {
            product_id: product.id,
            name: product.name.clone(),
            quantity,
            price: product.price,
            image: product.image.clone(),
        })
        .collect();
    let totals = policy.price(&items);

    Ok(db
        .place_order(NewOrder {
            user_id: user.id,
            items,
            shipping_address: user.address.clone().unwrap_or_default(),
            payment_method: payment_method.to_owned(),
            items_price: totals.items_price,
            tax_price: totals.tax_price,
            shipping_price: totals.shipping_price,
            total_price: totals.total_price,
        })
        .await?)
}

fn demo_payment(user: &User) -> PaymentResult {
    PaymentResult {
        id: format!("DEMO-{}", user.id),
        status: "COMPLETED".to_owned(),
        update_time: Utc::now().to_rfc3339(),
        email_address: user.email.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(slug("MacBook Pro 16\""), "macbook-pro-16");
        assert_eq!(slug("Yoga Mat"), "yoga-mat");
    }

    #[test]
    fn test_demo_products_are_valid() {
        for demo in PRODUCTS {
            let product = new_product(demo);
            assert!(product.price > Decimal::ZERO, "{}", product.name);
            assert!(product.stock >= 0, "{}", product.name);
        }
    }
}
