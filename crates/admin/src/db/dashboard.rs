//! Row counts for the admin index.

use serde::Serialize;
use sqlx::PgPool;

use super::RepositoryError;

/// Number of rows per model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ModelCounts {
    pub categories: i64,
    pub notebooks: i64,
    pub smartphones: i64,
    pub carts: i64,
    pub cart_products: i64,
    pub customers: i64,
}

impl ModelCounts {
    /// Load all counts in one round trip.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn load(pool: &PgPool) -> Result<Self, RepositoryError> {
        let counts = sqlx::query_as::<_, Self>(
            r"
            SELECT
                (SELECT COUNT(*) FROM shop.category) AS categories,
                (SELECT COUNT(*) FROM shop.notebook) AS notebooks,
                (SELECT COUNT(*) FROM shop.smartphone) AS smartphones,
                (SELECT COUNT(*) FROM shop.cart) AS carts,
                (SELECT COUNT(*) FROM shop.cart_product) AS cart_products,
                (SELECT COUNT(*) FROM shop.customer) AS customers
            ",
        )
        .fetch_one(pool)
        .await?;
        Ok(counts)
    }
}
