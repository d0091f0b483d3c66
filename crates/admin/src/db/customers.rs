//! Customer repository.

use sqlx::PgPool;

use techmart_core::customer::{Customer, CustomerDetails};

use super::RepositoryError;

const CUSTOMER_COLUMNS: &str = "id, email, first_name, last_name, phone, address, created_at";

/// Database access for customers.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All customers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Customer>, RepositoryError> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM shop.customer ORDER BY id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(customers)
    }

    /// Create a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn create(&self, details: &CustomerDetails) -> Result<Customer, RepositoryError> {
        sqlx::query_as::<_, Customer>(&format!(
            "INSERT INTO shop.customer (email, first_name, last_name, phone, address) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(&details.email)
        .bind(&details.first_name)
        .bind(&details.last_name)
        .bind(&details.phone)
        .bind(&details.address)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "customer with this email"))
    }
}
