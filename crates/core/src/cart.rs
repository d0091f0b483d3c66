//! Cart arithmetic.
//!
//! A cart line's price is always `quantity × unit price`; a cart's totals are
//! derived from its lines. Both are recomputed from current product prices
//! whenever a cart changes, so stored totals never drift from the lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{CartId, CartProductId, CustomerId, Price, ProductKind, ProductRef};

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Total digits of the stored line and cart price columns, `NUMERIC(14, 2)`.
pub const STORED_TOTAL_DIGITS: u32 = 14;

/// Exclusive upper bound for a stored line or cart price.
#[must_use]
pub fn stored_total_bound() -> Decimal {
    Decimal::from(10_i64.pow(STORED_TOTAL_DIGITS - Price::SCALE))
}

/// A cart total too large to store.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("cart total must be below {max}")]
pub struct TotalTooLarge {
    pub max: Decimal,
}

/// Errors for cart quantity input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity must be at least 1")]
    Zero,
    #[error("quantity must be at most {max}")]
    TooLarge { max: u32 },
}

/// Validate a quantity for a cart line.
///
/// # Errors
///
/// Returns an error for zero or more than [`MAX_LINE_QUANTITY`].
pub const fn check_quantity(quantity: u32) -> Result<u32, QuantityError> {
    if quantity == 0 {
        return Err(QuantityError::Zero);
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(QuantityError::TooLarge {
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(quantity)
}

/// Quantity after adding `extra` units to a line, capped at the maximum.
#[must_use]
pub fn merged_quantity(current: u32, extra: u32) -> u32 {
    current.saturating_add(extra).min(MAX_LINE_QUANTITY)
}

/// The inputs needed to price one cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInput {
    pub quantity: u32,
    pub unit_price: Price,
}

impl LineInput {
    /// Price of the whole line.
    #[must_use]
    pub fn final_price(&self) -> Decimal {
        self.unit_price.times(self.quantity)
    }
}

/// Derived totals stored on the cart row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CartTotals {
    /// Sum of line quantities.
    pub total_products: u32,
    /// Sum of line prices.
    pub final_price: Decimal,
}

impl CartTotals {
    /// Compute totals for a set of lines.
    #[must_use]
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a LineInput>) -> Self {
        lines
            .into_iter()
            .fold(Self::default(), |acc, line| Self {
                total_products: acc.total_products.saturating_add(line.quantity),
                final_price: acc.final_price + line.final_price(),
            })
    }

    /// Check the totals fit the stored columns.
    ///
    /// A line price never exceeds its cart's total, so this covers every
    /// line as well.
    ///
    /// # Errors
    ///
    /// Returns [`TotalTooLarge`] if the final price reaches
    /// [`stored_total_bound`].
    pub fn check_storable(&self) -> Result<(), TotalTooLarge> {
        let max = stored_total_bound();
        if self.final_price >= max {
            return Err(TotalTooLarge { max });
        }
        Ok(())
    }

    /// Whether the cart has no items.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_products == 0
    }
}

/// New line prices and cart totals after a reprice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repriced<K> {
    /// `(line key, line final price)` in input order.
    pub lines: Vec<(K, Decimal)>,
    pub totals: CartTotals,
}

/// Price every line at its current unit price and total the cart.
#[must_use]
pub fn reprice<K>(lines: impl IntoIterator<Item = (K, LineInput)>) -> Repriced<K> {
    let (keys, inputs): (Vec<K>, Vec<LineInput>) = lines.into_iter().unzip();
    let totals = CartTotals::from_lines(&inputs);
    Repriced {
        lines: keys
            .into_iter()
            .zip(inputs.iter().map(LineInput::final_price))
            .collect(),
        totals,
    }
}

/// Convert a validated quantity to the database column type.
#[must_use]
pub fn quantity_to_db(quantity: u32) -> i32 {
    i32::try_from(quantity).unwrap_or(i32::MAX)
}

/// A shopping cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: CartId,
    pub owner_id: Option<CustomerId>,
    /// Sum of line quantities.
    pub total_products: i32,
    pub final_price: Decimal,
    /// Set once the cart has been turned into an order; such carts are frozen.
    pub in_order: bool,
    pub for_anonymous_user: bool,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Whether items may still be added or changed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.in_order
    }
}

impl std::fmt::Display for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A cart line row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct CartProduct {
    pub id: CartProductId,
    pub cart_id: CartId,
    pub customer_id: Option<CustomerId>,
    pub product_kind: ProductKind,
    pub product_id: i32,
    pub quantity: i32,
    pub final_price: Decimal,
}

impl CartProduct {
    #[must_use]
    pub const fn product_ref(&self) -> ProductRef {
        ProductRef::from_parts(self.product_kind, self.product_id)
    }
}

/// A cart line together with the product it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub line: CartProduct,
    pub product: Product,
}

impl CartLine {
    /// Pricing inputs for this line at the product's current price.
    #[must_use]
    pub fn input(&self) -> LineInput {
        LineInput {
            quantity: u32::try_from(self.line.quantity).unwrap_or(0),
            unit_price: self.product.base().price,
        }
    }
}

impl std::fmt::Display for CartLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Product: {} (for cart)", self.product.base().title)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(quantity: u32, price: &str) -> LineInput {
        LineInput {
            quantity,
            unit_price: Price::parse(price).unwrap(),
        }
    }

    #[test]
    fn test_empty_cart_totals() {
        let totals = CartTotals::from_lines(&[]);
        assert!(totals.is_empty());
        assert_eq!(totals.final_price, Decimal::ZERO);
    }

    #[test]
    fn test_totals_sum_quantities_and_prices() {
        let lines = [line(2, "999.99"), line(1, "349.50"), line(3, "10")];
        let totals = CartTotals::from_lines(&lines);
        assert_eq!(totals.total_products, 6);
        assert_eq!(totals.final_price, Decimal::new(237_948, 2));
    }

    #[test]
    fn test_reprice_keeps_keys_in_order() {
        let repriced = reprice([(10, line(2, "5.00")), (11, line(1, "0.99"))]);
        assert_eq!(
            repriced.lines,
            vec![(10, Decimal::new(1000, 2)), (11, Decimal::new(99, 2))]
        );
        assert_eq!(repriced.totals.total_products, 3);
        assert_eq!(repriced.totals.final_price, Decimal::new(1099, 2));
    }

    #[test]
    fn test_line_final_price() {
        assert_eq!(line(4, "0.10").final_price(), Decimal::new(40, 2));
    }

    #[test]
    fn test_check_quantity() {
        assert_eq!(check_quantity(0), Err(QuantityError::Zero));
        assert_eq!(check_quantity(1), Ok(1));
        assert_eq!(check_quantity(99), Ok(99));
        assert_eq!(
            check_quantity(100),
            Err(QuantityError::TooLarge { max: 99 })
        );
    }

    #[test]
    fn test_cart_line_display_and_input() {
        use crate::catalog::{Notebook, ProductBase};
        use crate::types::{CategoryId, NotebookId, Slug};

        let notebook = Notebook {
            id: NotebookId::new(7),
            base: ProductBase {
                category_id: CategoryId::new(1),
                title: "ThinkPad X1".to_owned(),
                slug: Slug::parse("x1").unwrap(),
                image: None,
                description: None,
                price: Price::parse("1000.00").unwrap(),
                created_at: DateTime::<Utc>::UNIX_EPOCH,
            },
            diagonal: "14".to_owned(),
            display_type: "IPS".to_owned(),
            processor_freq: "3 GHz".to_owned(),
            ram: "16 GB".to_owned(),
            video: "iGPU".to_owned(),
            time_without_charge: "9 h".to_owned(),
        };
        let line = CartLine {
            line: CartProduct {
                id: CartProductId::new(1),
                cart_id: CartId::new(1),
                customer_id: None,
                product_kind: ProductKind::Notebook,
                product_id: 7,
                quantity: 2,
                final_price: Decimal::ZERO,
            },
            product: notebook.into(),
        };

        assert_eq!(line.to_string(), "Product: ThinkPad X1 (for cart)");
        assert_eq!(line.input().final_price(), Decimal::new(200_000, 2));
        assert_eq!(line.line.product_ref(), ProductRef::Notebook(NotebookId::new(7)));
    }

    #[test]
    fn test_largest_line_is_storable() {
        let largest = line(MAX_LINE_QUANTITY, "9999999.99");
        assert_eq!(largest.final_price(), Decimal::new(98_999_999_901, 2));
        assert!(largest.final_price() < stored_total_bound());
        assert!(CartTotals::from_lines(&[largest]).check_storable().is_ok());
    }

    #[test]
    fn test_cart_total_beyond_stored_digits_is_rejected() {
        let fits = vec![line(MAX_LINE_QUANTITY, "9999999.99"); 1010];
        assert!(CartTotals::from_lines(&fits).check_storable().is_ok());

        let too_many = vec![line(MAX_LINE_QUANTITY, "9999999.99"); 1011];
        let err = CartTotals::from_lines(&too_many).check_storable().unwrap_err();
        assert_eq!(err.max, Decimal::from(1_000_000_000_000_i64));
        assert_eq!(err.to_string(), "cart total must be below 1000000000000");
    }

    #[test]
    fn test_merged_quantity_caps() {
        assert_eq!(merged_quantity(2, 3), 5);
        assert_eq!(merged_quantity(98, 5), MAX_LINE_QUANTITY);
        assert_eq!(merged_quantity(u32::MAX, 1), MAX_LINE_QUANTITY);
    }
}
