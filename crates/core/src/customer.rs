//! Customers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CustomerId, Email, PhoneNumber};

/// A shop customer.
///
/// Customers are identified by their email address; there are no accounts or
/// passwords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: CustomerId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: PhoneNumber,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl std::fmt::Display for Customer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Customer: {} {}", self.first_name, self.last_name)
    }
}

/// Validated input for creating or updating a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDetails {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: PhoneNumber,
    pub address: String,
}

/// Errors for customer input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CustomerError {
    #[error("invalid email: {0}")]
    Email(#[from] crate::types::EmailError),
    #[error("invalid phone: {0}")]
    Phone(#[from] crate::types::PhoneError),
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

impl CustomerDetails {
    /// Validate raw form or command-line input.
    ///
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn parse(
        email: &str,
        first_name: &str,
        last_name: &str,
        phone: &str,
        address: &str,
    ) -> Result<Self, CustomerError> {
        Ok(Self {
            email: Email::parse(email)?,
            first_name: required_text("first_name", first_name)?,
            last_name: required_text("last_name", last_name)?,
            phone: PhoneNumber::parse(phone)?,
            address: required_text("address", address)?,
        })
    }
}

fn required_text(field: &'static str, value: &str) -> Result<String, CustomerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CustomerError::Missing { field });
    }
    let max = crate::catalog::MAX_TEXT_LENGTH;
    if value.chars().count() > max {
        return Err(CustomerError::TooLong { field, max });
    }
    Ok(value.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_normalizes() {
        let details = CustomerDetails::parse(
            " Ada@Example.com ",
            " Ada ",
            "Lovelace",
            "+44 20 7946 0958",
            "12 St James's Square",
        )
        .unwrap();
        assert_eq!(details.email.as_str(), "ada@example.com");
        assert_eq!(details.first_name, "Ada");
        assert_eq!(details.phone.as_str(), "+442079460958");
    }

    #[test]
    fn test_parse_reports_missing_field() {
        let err = CustomerDetails::parse("a@b.co", "Ada", "  ", "12345", "addr").unwrap_err();
        assert_eq!(err, CustomerError::Missing { field: "last_name" });
    }

    #[test]
    fn test_parse_rejects_bad_email() {
        let err = CustomerDetails::parse("nope", "Ada", "L", "12345", "addr").unwrap_err();
        assert!(matches!(err, CustomerError::Email(_)));
    }

    #[test]
    fn test_display() {
        let customer = Customer {
            id: CustomerId::new(1),
            email: Email::parse("ada@example.com").unwrap(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            phone: PhoneNumber::parse("12345").unwrap(),
            address: "London".to_owned(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        assert_eq!(customer.to_string(), "Customer: Ada Lovelace");
        assert_eq!(customer.full_name(), "Ada Lovelace");
    }
}
