//! Product identifiers.
//!
//! The catalog and cart services key products by an opaque string id
//! (e.g. `"v4sLtEcMpzabRyfx"`). Wrapping it prevents mixing product ids with
//! other strings such as search text or usernames.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of a product in the catalog.
///
/// # Example
///
/// ```rust
/// # use qkart_core::ProductId;
/// let id = ProductId::new("v4sLtEcMpzabRyfx");
/// assert_eq!(id.as_str(), "v4sLtEcMpzabRyfx");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new product id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the id and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
