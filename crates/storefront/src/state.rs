//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use techmart_core::catalog::Category;

use crate::config::StorefrontConfig;
use crate::db::{CategoryRepository, RepositoryError};

const CATEGORY_NAV_KEY: &str = "categories";

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    /// Category navigation, shown on every page (1 minute TTL).
    nav_cache: Cache<&'static str, Arc<Vec<Category>>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let nav_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(60))
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                nav_cache,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Categories for the navigation bar.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the categories cannot be loaded.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(categories) = self.inner.nav_cache.get(&CATEGORY_NAV_KEY).await {
            debug!("Cache hit for category navigation");
            return Ok(categories);
        }

        let categories = Arc::new(CategoryRepository::new(self.pool()).list().await?);
        self.inner
            .nav_cache
            .insert(CATEGORY_NAV_KEY, Arc::clone(&categories))
            .await;
        Ok(categories)
    }
}
