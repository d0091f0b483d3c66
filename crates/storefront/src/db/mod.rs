//! Database operations for the storefront.
//!
//! # Schema: `shop`
//!
//! ## Tables
//!
//! - `category` - Product categories
//! - `notebook`, `smartphone` - One table per product kind
//! - `customer` - Shop customers, keyed by email
//! - `cart` - Shopping carts and their cached totals
//! - `cart_product` - Cart lines, pointing at a product by `(kind, id)`
//! - `session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p techmart-cli -- migrate storefront
//! ```

pub mod carts;
pub mod categories;
pub mod customers;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use carts::CartRepository;
pub use categories::CategoryRepository;
pub use customers::CustomerRepository;
pub use products::ProductRepository;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Query or connection failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value no longer satisfies its domain rules.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The row to change does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The change would leave a value the schema cannot hold.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl RepositoryError {
    /// Map a unique violation to [`RepositoryError::Conflict`].
    pub(crate) fn from_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
