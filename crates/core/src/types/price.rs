//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(9, 2)`: at most nine significant digits,
//! two of them after the decimal point.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// The amount is negative.
    #[error("price cannot be negative")]
    Negative,
    /// More than two digits after the decimal point.
    #[error("price can have at most {max} decimal places")]
    TooPrecise {
        /// Maximum decimal places.
        max: u32,
    },
    /// The amount does not fit in the column.
    #[error("price must be below {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A non-negative amount of money with two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Digits after the decimal point.
    pub const SCALE: u32 = 2;
    /// Total significant digits.
    pub const MAX_DIGITS: u32 = 9;

    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Exclusive upper bound: `10^(MAX_DIGITS - SCALE)`.
    #[must_use]
    pub fn upper_bound() -> Decimal {
        Decimal::from(10_i64.pow(Self::MAX_DIGITS - Self::SCALE))
    }

    /// Validate an amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative, has more than two decimal
    /// places, or does not fit in nine digits.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let normalized = amount.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(PriceError::TooPrecise { max: Self::SCALE });
        }
        if amount >= Self::upper_bound() {
            return Err(PriceError::TooLarge {
                max: Self::upper_bound(),
            });
        }
        Ok(Self(amount.round_dp(Self::SCALE)))
    }

    /// Parse user input such as `"1299.90"`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotANumber`] for non-numeric input, or any error
    /// from [`Price::new`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount: Decimal = s.trim().parse().map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        (self.0 * Decimal::from(quantity)).round_dp(Self::SCALE)
    }

    /// Format for display, e.g. `"$1,299.90"`.
    #[must_use]
    pub fn display(&self) -> String {
        format_money(self.0)
    }
}

/// Format any amount with a currency sign, thousands separators and two
/// decimal places.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(Price::SCALE);
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{frac}")
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(Price::parse("0").unwrap(), Price::ZERO);
        assert_eq!(
            Price::parse(" 1299.9 ").unwrap().amount(),
            Decimal::new(129_990, 2)
        );
        assert_eq!(
            Price::parse("9999999.99").unwrap().amount(),
            Decimal::new(999_999_999, 2)
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(Price::parse("abc"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
        assert_eq!(
            Price::parse("1.999"),
            Err(PriceError::TooPrecise { max: 2 })
        );
        assert!(matches!(
            Price::parse("10000000"),
            Err(PriceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_trailing_zeros_are_not_extra_precision() {
        assert!(Price::parse("10.5000").is_ok());
    }

    #[test]
    fn test_times() {
        let price = Price::parse("19.99").unwrap();
        assert_eq!(price.times(3), Decimal::new(5997, 2));
        assert_eq!(price.times(0), Decimal::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::parse("5").unwrap().display(), "$5.00");
        assert_eq!(Price::parse("1299.9").unwrap().display(), "$1,299.90");
        assert_eq!(
            Price::parse("1234567.05").unwrap().to_string(),
            "$1,234,567.05"
        );
        assert_eq!(format_money(Decimal::new(-150, 2)), "-$1.50");
    }
}
