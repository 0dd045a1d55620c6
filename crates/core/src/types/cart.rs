//! Cart entries as stored by the remote cart service.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantities must be at least one.
    #[error("quantity must be at least 1")]
    Zero,
}

/// An absolute item quantity, always at least one.
///
/// Whether the cart service treats `0` as "remove this item" is not part of
/// its contract, so a zero quantity cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A quantity of one, used for first adds from a product card.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a new quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Zero`] if `qty` is zero.
    pub const fn new(qty: u32) -> Result<Self, QuantityError> {
        match NonZeroU32::new(qty) {
            Some(q) => Ok(Self(q)),
            None => Err(QuantityError::Zero),
        }
    }

    /// Get the quantity as an integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(qty: u32) -> Result<Self, Self::Error> {
        Self::new(qty)
    }
}

impl From<Quantity> for u32 {
    fn from(qty: Quantity) -> Self {
        qty.get()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A `(productId, qty)` pair from the authoritative remote cart.
///
/// Wire format: `{ "productId": "KCRwjF7lN97HnEaY", "qty": 3 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub product_id: ProductId,
    pub qty: Quantity,
}

impl CartEntry {
    /// Create a new cart entry.
    #[must_use]
    pub const fn new(product_id: ProductId, qty: Quantity) -> Self {
        Self { product_id, qty }
    }
}
