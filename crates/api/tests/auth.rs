//! Registration, login and token handling through the router.

#![allow(clippy::unwrap_used)]

mod common;

use std::time::Duration;

use axum::http::{Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use emporium_api::db::UserStore;
use emporium_core::Role;
use common::TestApp;

fn registration(email: &str) -> serde_json::Value {
    json!({
        "name": "Jane Doe",
        "email": email,
        "password": "secret12",
        "confirmPassword": "secret12",
    })
}

#[tokio::test]
async fn test_register_returns_token_and_public_profile() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/auth/register", None, registration("Jane@Example.com"))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Registration successful");
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["email"], "jane@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_rejects_duplicate_email_case_insensitively() {
    let app = TestApp::new();
    let (status, _) = app
        .post("/api/auth/register", None, registration("jane@example.com"))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post("/api/auth/register", None, registration("JANE@example.COM"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User with this email already exists");
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/auth/register", None, json!({ "email": "a@b.co" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "All fields are required");

    let mut short = registration("short@example.com");
    short["password"] = json!("abc");
    short["confirmPassword"] = json!("abc");
    let (status, _) = app.post("/api/auth/register", None, short).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut mismatch = registration("mismatch@example.com");
    mismatch["confirmPassword"] = json!("different");
    let (status, body) = app.post("/api/auth/register", None, mismatch).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Passwords do not match");
}

#[tokio::test]
async fn test_login_rejects_wrong_password_and_records_last_login() {
    let app = TestApp::new();
    app.post("/api/auth/register", None, registration("jane@example.com"))
        .await;

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "jane@example.com", "password": "wrong-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": "secret12" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "jane@example.com", "password": "secret12" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert!(body["user"]["lastLogin"].is_string());
}

#[tokio::test]
async fn test_deactivated_account_cannot_log_in_or_use_token() {
    let app = TestApp::new();
    let (mut user, token) = app.shopper("john@example.com").await;
    user.is_active = false;
    app.db.update_user(&user).await.unwrap();

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "john@example.com", "password": "user123" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Account is deactivated");

    let (status, _) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_token_errors_are_401() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No authentication token provided");

    let (status, body) = app.get("/api/auth/me", Some("not.a.token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn test_token_for_deleted_user_is_rejected() {
    let app = TestApp::new();
    let (user, token) = app.shopper("gone@example.com").await;
    app.db.delete_user(user.id).await.unwrap();

    let (status, body) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn test_me_accepts_legacy_token_header() {
    let app = TestApp::new();
    let (_, token) = app.shopper("john@example.com").await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/auth/me")
        .header("x-auth-token", token)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_change_password_requires_current_password() {
    let app = TestApp::new();
    let (_, token) = app.shopper("john@example.com").await;

    let (status, body) = app
        .put(
            "/api/auth/change-password",
            Some(&token),
            json!({ "currentPassword": "nope123", "newPassword": "fresh-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password is incorrect");

    let (status, _) = app
        .put(
            "/api/auth/change-password",
            Some(&token),
            json!({ "currentPassword": "user123", "newPassword": "fresh-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "john@example.com", "password": "fresh-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_profile_update_and_logout() {
    let app = TestApp::new();
    let (_, token) = app.shopper("john@example.com").await;

    let (status, body) = app
        .put(
            "/api/auth/profile",
            Some(&token),
            json!({ "name": "John Smith", "phone": "+27 82 555 0100" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "John Smith");
    assert_eq!(body["user"]["phone"], "+27 82 555 0100");

    let (status, body) = app.post("/api/auth/logout", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout successful (remove token client-side)");
}

#[tokio::test]
async fn test_both_profile_paths_apply_the_same_rules() {
    let app = TestApp::new();
    let (_, token) = app.shopper("john@example.com").await;

    for path in ["/api/auth/profile", "/api/profile"] {
        let (status, body) = app
            .put(path, Some(&token), json!({ "phone": "call me" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Please provide a valid phone number"),
            "{path}"
        );
    }

    let (status, body) = app
        .put(
            "/api/profile",
            Some(&token),
            json!({ "address": { "street": "1 Main Rd", "city": "Durban" } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile updated successfully");
    assert_eq!(body["user"]["address"]["country"], "United States");
    assert_eq!(body["user"]["name"], "Test User");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_login_racing_deactivation_keeps_account_disabled() {
    for _ in 0..5 {
        let app = TestApp::new();
        let (_, admin_token) = app.admin().await;
        let (user, _) = app.shopper("john@example.com").await;

        let login = {
            let app = app.clone();
            tokio::spawn(async move {
                app.post(
                    "/api/auth/login",
                    None,
                    json!({ "email": "john@example.com", "password": "user123" }),
                )
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(2)).await;

        let (status, _) = app
            .put(
                &format!("/api/admin/users/{}", user.id),
                Some(&admin_token),
                json!({ "isActive": false }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = login.await.unwrap();
        let stored = app.db.get_user(user.id).await.unwrap().unwrap();
        assert!(!stored.is_active, "login re-activated the account");

        // A login that finished first still holds a token that no longer works
        if status == StatusCode::OK {
            let token = body["token"].as_str().unwrap();
            let (status, _) = app.get("/api/auth/me", Some(token)).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        } else {
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert_eq!(body["error"], "Account is deactivated");
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_profile_edit_racing_role_change_keeps_both() {
    for _ in 0..5 {
        let app = TestApp::new();
        let (_, admin_token) = app.admin().await;
        let (user, token) = app.shopper("john@example.com").await;

        let edit = {
            let app = app.clone();
            tokio::spawn(async move {
                app.put("/api/profile", Some(&token), json!({ "name": "John Smith" }))
                    .await
            })
        };
        let (status, _) = app
            .put(
                &format!("/api/admin/users/{}/role", user.id),
                Some(&admin_token),
                json!({ "role": "admin" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = edit.await.unwrap();
        assert_eq!(status, StatusCode::OK);

        let stored = app.db.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "John Smith");
        assert_eq!(stored.role, Role::Admin);
    }
}

#[tokio::test]
async fn test_password_change_survives_stale_account_write() {
    let app = TestApp::new();
    let (stale, token) = app.shopper("john@example.com").await;

    let (status, _) = app
        .put(
            "/api/auth/change-password",
            Some(&token),
            json!({ "currentPassword": "user123", "newPassword": "fresh-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // An account edit built from a read taken before the change
    let mut edited = stale.clone();
    edited.name = "Johnny".into();
    app.db.update_user(&edited).await.unwrap();

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "john@example.com", "password": "fresh-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Johnny");
}
