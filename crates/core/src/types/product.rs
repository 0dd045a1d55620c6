//! Catalog products.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::id::ProductId;
use crate::types::price::Price;

/// Errors that can occur when constructing a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingError {
    /// Ratings are whole stars out of five.
    #[error("rating must be between 0 and {max} (got {got})")]
    OutOfRange { max: u8, got: u8 },
}

/// Aggregate product rating in whole stars, `0..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Highest possible rating.
    pub const MAX: u8 = 5;

    /// Create a new rating.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::OutOfRange`] if `stars` exceeds [`Rating::MAX`].
    pub const fn new(stars: u8) -> Result<Self, RatingError> {
        if stars > Self::MAX {
            return Err(RatingError::OutOfRange {
                max: Self::MAX,
                got: stars,
            });
        }
        Ok(Self(stars))
    }

    /// Number of stars.
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(stars: u8) -> Result<Self, Self::Error> {
        Self::new(stars)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// A purchasable product as returned by the catalog service.
///
/// Products are immutable once fetched; the catalog is replaced wholesale on
/// every fetch.
///
/// Wire format:
///
/// ```json
/// {
///     "name": "iPhone XR",
///     "category": "Phones",
///     "cost": 100,
///     "rating": 4,
///     "image": "https://i.imgur.com/lulqWzW.jpg",
///     "_id": "v4sLtEcMpzabRyfx"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub cost: Price,
    pub rating: Rating,
    pub image: Url,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_wire_format() {
        let product: Product = serde_json::from_str(
            r#"{
                "name": "Basketball",
                "category": "Sports",
                "cost": 100,
                "rating": 5,
                "image": "https://i.imgur.com/lulqWzW.jpg",
                "_id": "upLK9JbQ4rMhTwt4"
            }"#,
        )
        .unwrap();

        assert_eq!(product.id, ProductId::new("upLK9JbQ4rMhTwt4"));
        assert_eq!(product.cost, Price::from_units(100));
        assert_eq!(product.rating.stars(), 5);
        assert_eq!(product.image.host_str(), Some("i.imgur.com"));
    }

    #[test]
    fn test_rating_out_of_range() {
        assert!(Rating::new(5).is_ok());
        assert_eq!(
            Rating::new(6),
            Err(RatingError::OutOfRange { max: 5, got: 6 })
        );
    }

    #[test]
    fn test_product_with_bad_rating_is_rejected() {
        let result: Result<Product, _> = serde_json::from_str(
            r#"{"name":"X","category":"Y","cost":1,"rating":9,"image":"https://x.test/a.jpg","_id":"A"}"#,
        );
        assert!(result.is_err());
    }
}
