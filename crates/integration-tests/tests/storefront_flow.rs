//! End-to-end shopper and admin flows.
//!
//! These tests require:
//! - The API running (cargo run -p emporium-api)
//! - A seeded database (emp-cli seed) for the admin tests
//!
//! Run with: cargo test -p emporium-integration-tests -- --ignored

use emporium_integration_tests::ApiClient;
use reqwest::StatusCode;
use serde_json::json;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_health_endpoints() {
    let client = ApiClient::new();

    let (status, body) = client.get("/health").await.expect("health request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = client
        .get("/health/ready")
        .await
        .expect("readiness request failed");
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Shopper Flow
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server with products"]
async fn test_register_browse_cart_and_checkout() {
    let mut client = ApiClient::new();
    let registered = client.register_unique().await.expect("register failed");
    assert_eq!(registered["success"], true);

    let (status, listing) = client
        .get("/api/products?limit=1")
        .await
        .expect("product list failed");
    assert_eq!(status, StatusCode::OK);
    let product = listing["products"][0].clone();
    assert!(product.is_object(), "no products in catalog; run emp-cli seed");

    let (status, cart) = client
        .post(
            "/api/cart/add",
            &json!({ "productId": product["id"], "quantity": 1 }),
        )
        .await
        .expect("add to cart failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["cart"]["items"][0]["productId"], product["id"]);

    let (status, order) = client
        .post(
            "/api/orders",
            &json!({
                "orderItems": [{ "product": product["id"], "quantity": 1 }],
                "shippingAddress": {
                    "street": "1 Test Road",
                    "city": "Cape Town",
                    "state": "WC",
                    "zipCode": "8001",
                    "country": "South Africa",
                },
                "paymentMethod": "card",
            }),
        )
        .await
        .expect("checkout failed");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["isPaid"], false);

    let (status, paid) = client
        .put(
            &format!("/api/orders/{}/pay", order["id"]),
            &json!({ "id": "E2E", "status": "COMPLETED" }),
        )
        .await
        .expect("pay failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["isPaid"], true);

    let (_, cart) = client.get("/api/cart").await.expect("cart failed");
    assert_eq!(cart["cart"]["items"], json!([]));

    let (_, mine) = client
        .get("/api/orders/my/orders")
        .await
        .expect("my orders failed");
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and seeded admin account"]
async fn test_admin_dashboard_with_seeded_admin() {
    let mut client = ApiClient::new();
    let login = client
        .login("admin@example.com", "admin123")
        .await
        .expect("login failed");
    assert_eq!(login["user"]["role"], "admin");

    let (status, body) = client
        .get("/api/admin/dashboard/stats")
        .await
        .expect("dashboard failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body["stats"]["users"].as_i64().unwrap_or_default() >= 1);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_shopper_cannot_reach_admin_console() {
    let mut client = ApiClient::new();
    client.register_unique().await.expect("register failed");

    let (status, body) = client
        .get("/api/admin/users")
        .await
        .expect("admin request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");
}
