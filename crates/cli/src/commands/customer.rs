//! Customer management commands.
//!
//! # Usage
//!
//! ```bash
//! tm-cli customer create -e jane@example.com -f Jane -l Doe \
//!     -p "+1 555 0100" -a "1 Main St, Springfield"
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use thiserror::Error;

use techmart_admin::db::{self, CustomerRepository, RepositoryError};
use techmart_core::customer::{Customer, CustomerDetails, CustomerError};

use super::database_url;

/// Errors that can occur during customer operations.
#[derive(Debug, Error)]
pub enum CustomerCommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0} (or DATABASE_URL)")]
    MissingEnvVar(&'static str),

    /// Input did not validate.
    #[error("Invalid customer: {0}")]
    Invalid(#[from] CustomerError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Create a customer.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is already
/// registered, or the database is unreachable.
pub async fn create(
    email: &str,
    first_name: &str,
    last_name: &str,
    phone: &str,
    address: &str,
) -> Result<Customer, CustomerCommandError> {
    // Validate before connecting
    let details = CustomerDetails::parse(email, first_name, last_name, phone, address)?;

    let database_url = database_url("ADMIN_DATABASE_URL")
        .ok_or(CustomerCommandError::MissingEnvVar("ADMIN_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let customer = CustomerRepository::new(&pool).create(&details).await?;
    tracing::info!(
        "Customer created successfully! ID: {}, Email: {}",
        customer.id,
        customer.email
    );
    Ok(customer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_input_fails_before_connecting() {
        let err = create("not-an-email", "Jane", "Doe", "+1 555 0100", "1 Main St")
            .await
            .err();
        assert!(matches!(err, Some(CustomerCommandError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_missing_name_is_reported() {
        let err = create("jane@example.com", "  ", "Doe", "+1 555 0100", "1 Main St")
            .await
            .err();
        assert!(matches!(
            err,
            Some(CustomerCommandError::Invalid(CustomerError::Missing {
                field: "first_name"
            }))
        ));
    }
}
