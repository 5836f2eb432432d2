//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Database;
use crate::services::auth::TokenService;
use crate::services::cart::CartStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// storage, token signing, carts and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    db: Arc<dyn Database>,
    tokens: TokenService,
    carts: CartStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `db` - Storage adapter
    #[must_use]
    pub fn new(config: ApiConfig, db: Arc<dyn Database>) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);
        let carts = CartStore::new(config.cart_idle);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                tokens,
                carts,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the storage adapter.
    #[must_use]
    pub fn db(&self) -> &dyn Database {
        self.inner.db.as_ref()
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    #[must_use]
    pub fn carts(&self) -> &CartStore {
        &self.inner.carts
    }
}
