//! Type-safe price representation using decimal arithmetic.
//!
//! Product costs arrive from the catalog service as plain JSON numbers.
//! They are held as [`Decimal`] so that cart totals never accumulate
//! floating point error.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::cart::Quantity;

/// A monetary amount in the store's single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of currency units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }
}

impl fmt::Display for Price {
    /// Formats as `$100` for whole amounts and `$19.99` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0.normalize())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<Quantity> for Price {
    type Output = Self;

    fn mul(self, qty: Quantity) -> Self {
        Self(self.0 * Decimal::from(qty.get()))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_deserializes_from_json_number() {
        let price: Price = serde_json::from_str("100").unwrap();
        assert_eq!(price, Price::from_units(100));

        let price: Price = serde_json::from_str("19.99").unwrap();
        assert_eq!(price, Price::new(Decimal::new(1999, 2)));
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_units(100).to_string(), "$100");
        assert_eq!(Price::new(Decimal::new(1999, 2)).to_string(), "$19.99");
    }

    #[test]
    fn test_price_times_quantity() {
        let qty = Quantity::new(3).unwrap();
        assert_eq!(Price::from_units(10) * qty, Price::from_units(30));
    }

    #[test]
    fn test_empty_sum_is_zero() {
        let total: Price = std::iter::empty().sum();
        assert_eq!(total, Price::ZERO);
    }
}
