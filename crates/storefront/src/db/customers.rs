//! Customer repository.

use sqlx::PgPool;

use techmart_core::customer::{Customer, CustomerDetails};

use super::RepositoryError;

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

    /// Create the customer, or update the details of the one with this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, details: &CustomerDetails) -> Result<Customer, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(
            r"
            INSERT INTO shop.customer (email, first_name, last_name, phone, address)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                phone = EXCLUDED.phone,
                address = EXCLUDED.address
            RETURNING id, email, first_name, last_name, phone, address, created_at
            ",
        )
        .bind(&details.email)
        .bind(&details.first_name)
        .bind(&details.last_name)
        .bind(&details.phone)
        .bind(&details.address)
        .fetch_one(self.pool)
        .await?;
        Ok(customer)
    }
}
