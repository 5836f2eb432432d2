//! Shared harness for router-level tests.
//!
//! Each test builds its own app over a fresh in-memory store, so tests never
//! share users, carts or stock.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use emporium_api::app;
use emporium_api::config::ApiConfig;
use emporium_api::db::{MemoryDatabase, ProductStore, UserStore};
use emporium_api::models::{NewProduct, NewUser, Product, User};
use emporium_api::services::auth::hash_password;
use emporium_api::state::AppState;
use emporium_core::{Currency, Email, Role};

const TEST_SECRET: &str = "router-tests-signing-key-0123456789abcdef";

#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub db: Arc<MemoryDatabase>,
}

impl TestApp {
    pub fn new() -> Self {
        let db = Arc::new(MemoryDatabase::new());
        let state = AppState::new(ApiConfig::in_memory(TEST_SECRET), db.clone());
        Self {
            router: app(state.clone()),
            state,
            db,
        }
    }

    /// Send a request and decode the JSON body (`Null` when not JSON).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Insert a user directly and return it with a signed token.
    pub async fn user_with_role(&self, email: &str, password: &str, role: Role) -> (User, String) {
        let user = self
            .db
            .create_user(NewUser {
                name: "Test User".into(),
                email: Email::parse(email).unwrap(),
                password_hash: hash_password(password).unwrap(),
                role,
            })
            .await
            .unwrap();
        let token = self.state.tokens().issue(&user).unwrap();
        (user, token)
    }

    pub async fn shopper(&self, email: &str) -> (User, String) {
        self.user_with_role(email, "user123", Role::User).await
    }

    pub async fn admin(&self) -> (User, String) {
        self.user_with_role("admin@example.com", "admin123", Role::Admin)
            .await
    }

    /// Insert an active product priced in cents.
    pub async fn product(&self, name: &str, cents: i64, stock: i32, category: &str) -> Product {
        self.db
            .create_product(NewProduct {
                name: name.into(),
                description: format!("{name} description"),
                price: Decimal::new(cents, 2),
                currency: Currency::Zar,
                category: category.into(),
                image: format!("/images/{name}.jpg"),
                stock,
                rating: 4.0,
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
}

/// A complete shipping address.
pub fn address() -> Value {
    serde_json::json!({
        "street": "12 Long Street",
        "city": "Cape Town",
        "state": "Western Cape",
        "zipCode": "8001",
        "country": "South Africa",
    })
}

/// Compare a JSON money value with an expected amount.
pub fn assert_money(value: &Value, expected: f64) {
    let actual = value
        .as_f64()
        .unwrap_or_else(|| panic!("not a number: {value}"));
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
