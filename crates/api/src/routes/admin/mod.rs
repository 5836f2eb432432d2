//! Admin console route handlers.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin), so
//! missing tokens reject with 401 and non-admins with 403.

pub mod analytics;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;

use std::collections::HashMap;

use axum::{
    Router,
    routing::{get, put},
};
use serde::Serialize;

use emporium_core::{Email, UserId};

use crate::db::Database;
use crate::error::Result;
use crate::models::Order;
use crate::routes::products as catalog;
use crate::state::AppState;

/// Admin list page size when the client doesn't ask for one.
pub(crate) const DEFAULT_LIMIT: u32 = 20;

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(dashboard::stats))
        // Users
        .route("/users", get(users::list))
        .route(
            "/users/{id}",
            get(users::show).put(users::update).delete(users::delete),
        )
        .route("/users/{id}/role", put(users::update_role))
        // Catalog
        .route(
            "/products",
            get(products::list).post(catalog::create),
        )
        .route(
            "/products/{id}",
            put(catalog::update).delete(catalog::delete),
        )
        .route("/categories", get(products::categories))
        // Analytics
        .route("/analytics/sales", get(analytics::sales))
        .route("/analytics/products", get(analytics::products))
        // Orders
        .route("/orders", get(orders::list))
        .route("/orders/{id}/status", put(orders::update_status))
        .route("/orders/{id}/deliver", put(orders::deliver))
        // Settings
        .route("/settings", get(settings::show).put(settings::update))
}

/// Who placed an order.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

/// An order together with its customer.
///
/// `customer` is `null` once the account has been deleted.
#[derive(Debug, Serialize)]
pub struct CustomerOrder {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Option<Customer>,
}

/// Attach customer name and email to each order.
pub(crate) async fn with_customers(
    db: &dyn Database,
    orders: Vec<Order>,
) -> Result<Vec<CustomerOrder>> {
    let mut customers: HashMap<UserId, Option<Customer>> = HashMap::new();
    let mut out = Vec::with_capacity(orders.len());

    for order in orders {
        let customer = match customers.get(&order.user_id) {
            Some(known) => known.clone(),
            None => {
                let found = db.get_user(order.user_id).await?.map(|u| Customer {
                    id: u.id,
                    name: u.name,
                    email: u.email,
                });
                customers.insert(order.user_id, found.clone());
                found
            }
        };
        out.push(CustomerOrder { order, customer });
    }

    Ok(out)
}
