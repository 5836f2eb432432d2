//! Catalog browsing and management.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use serde_json::json;

use emporium_api::db::ProductStore;
use common::{TestApp, assert_money};

#[tokio::test]
async fn test_list_shows_only_active_products_with_paging() {
    let app = TestApp::new();
    for i in 0..5 {
        app.product(&format!("Mug {i}"), 1000 + i, 10, "Kitchen").await;
    }
    let mut hidden = app.product("Hidden Lamp", 5000, 3, "Lighting").await;
    hidden.is_active = false;
    app.db.update_product(&hidden).await.unwrap();

    let (status, body) = app.get("/api/products?limit=2&page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["pages"], 3);
    assert_eq!(body["currentPage"], 2);
    assert_eq!(body["products"].as_array().unwrap().len(), 2);
    assert_eq!(body["categories"], json!(["Kitchen"]));
}

#[tokio::test]
async fn test_list_filters_and_sorts() {
    let app = TestApp::new();
    app.product("Desk Lamp", 45000, 3, "Lighting").await;
    app.product("Coffee Mug", 9900, 10, "Kitchen").await;
    app.product("Tea Mug", 12000, 10, "Kitchen").await;

    let (_, body) = app
        .get("/api/products?category=Kitchen&sort=price_desc", None)
        .await;
    let names: Vec<&str> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Tea Mug", "Coffee Mug"]);

    let (_, body) = app.get("/api/products?search=LAMP", None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["products"][0]["name"], "Desk Lamp");

    let (_, body) = app
        .get("/api/products?minPrice=100&maxPrice=200", None)
        .await;
    assert_eq!(body["total"], 1);
    assert_money(&body["products"][0]["price"], 120.0);
}

#[tokio::test]
async fn test_detail_includes_related_products_from_same_category() {
    let app = TestApp::new();
    let main = app.product("Chef Knife", 60000, 5, "Kitchen").await;
    for i in 0..5 {
        app.product(&format!("Pan {i}"), 30000, 5, "Kitchen").await;
    }
    app.product("Desk Lamp", 45000, 3, "Lighting").await;

    let (status, body) = app
        .get(&format!("/api/products/{}", main.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["name"], "Chef Knife");

    let related = body["relatedProducts"].as_array().unwrap();
    assert_eq!(related.len(), 4);
    assert!(related.iter().all(|p| p["category"] == "Kitchen"));
    assert!(related.iter().all(|p| p["id"] != main.id.as_i32()));
}

#[tokio::test]
async fn test_detail_hides_inactive_and_missing_products() {
    let app = TestApp::new();
    let mut product = app.product("Old Stock", 1000, 1, "Misc").await;
    product.is_active = false;
    app.db.update_product(&product).await.unwrap();

    let (status, body) = app
        .get(&format!("/api/products/{}", product.id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");

    let (status, _) = app.get("/api/products/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/products/not-a-number", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_admins_manage_the_catalog() {
    let app = TestApp::new();
    let (_, shopper) = app.shopper("john@example.com").await;
    let (_, admin) = app.admin().await;

    let payload = json!({
        "name": "Trail Shoe",
        "description": "Grippy",
        "price": 1299.99,
        "category": "Footwear",
        "image": "/img/shoe.jpg",
        "stock": 8,
    });

    let (status, _) = app.post("/api/products", None, payload.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .post("/api/products", Some(&shopper), payload.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");

    let (status, body) = app.post("/api/products", Some(&admin), payload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Product created successfully");
    let id = body["product"]["id"].as_i64().unwrap();

    let (status, body) = app
        .put(
            &format!("/api/products/{id}"),
            Some(&admin),
            json!({ "stock": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["stock"], 2);
    assert_eq!(body["product"]["name"], "Trail Shoe");

    let (status, _) = app
        .delete(&format!("/api/products/{id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .delete(&format!("/api/products/{id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_rejects_invalid_payload() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;

    let (status, body) = app
        .post(
            "/api/products",
            Some(&admin),
            json!({ "description": "no name", "price": 10, "category": "X", "image": "/x.jpg" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Product name is required");
}
