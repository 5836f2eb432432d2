//! End-to-end tests for the Emporium API.
//!
//! These talk HTTP to a running server, so every test is `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the API against a seeded database (or EMPORIUM_STORE=memory)
//! emp-cli migrate && emp-cli seed
//! cargo run -p emporium-api
//!
//! # Run the ignored tests
//! cargo test -p emporium-integration-tests -- --ignored
//! ```
//!
//! `EMPORIUM_API_URL` overrides the default `http://localhost:5000`.

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// Base URL of the API under test.
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("EMPORIUM_API_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// Thin JSON client that remembers the bearer token.
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: api_base_url(),
            token: None,
        }
    }

    /// Send a request and return the status with the decoded body.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the server can't be reached.
    pub async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&Value>,
    ) -> reqwest::Result<(StatusCode, Value)> {
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    /// # Errors
    ///
    /// Returns the transport error if the server can't be reached.
    pub async fn get(&self, path: &str) -> reqwest::Result<(StatusCode, Value)> {
        self.send(reqwest::Method::GET, path, None).await
    }

    /// # Errors
    ///
    /// Returns the transport error if the server can't be reached.
    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Result<(StatusCode, Value)> {
        self.send(reqwest::Method::POST, path, Some(body)).await
    }

    /// # Errors
    ///
    /// Returns the transport error if the server can't be reached.
    pub async fn put(&self, path: &str, body: &Value) -> reqwest::Result<(StatusCode, Value)> {
        self.send(reqwest::Method::PUT, path, Some(body)).await
    }

    /// Log in and keep the returned token for later requests.
    ///
    /// Returns the login response body.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the server can't be reached.
    pub async fn login(&mut self, email: &str, password: &str) -> reqwest::Result<Value> {
        let (_, body) = self
            .post(
                "/api/auth/login",
                &json!({ "email": email, "password": password }),
            )
            .await?;
        self.token = body["token"].as_str().map(str::to_owned);
        Ok(body)
    }

    /// Register a fresh account with a unique email and keep its token.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the server can't be reached.
    pub async fn register_unique(&mut self) -> reqwest::Result<Value> {
        let email = format!("e2e-{}@example.com", uuid::Uuid::new_v4().simple());
        let (_, body) = self
            .post(
                "/api/auth/register",
                &json!({
                    "name": "E2E Shopper",
                    "email": email,
                    "password": "e2e-secret",
                    "confirmPassword": "e2e-secret",
                }),
            )
            .await?;
        self.token = body["token"].as_str().map(str::to_owned);
        Ok(body)
    }
}
