//! Contracts for the remote QKart catalog, cart and account services.
//!
//! # Architecture
//!
//! - The backend is the source of truth - cart state is never patched locally
//! - Each service is a trait so the engine can run against the REST client
//!   in production and against in-memory fakes in tests
//! - Transport concerns (timeouts, TLS, headers) live in [`RestClient`] only;
//!   nothing above this module sees a `reqwest` type
//!
//! # Endpoints
//!
//! - `GET /products` - full catalog
//! - `GET /products/search?value=<text>` - filtered catalog, 404 on no match
//! - `GET /cart` - bearer-authenticated cart entries
//! - `POST /cart` - bearer-authenticated upsert, returns the whole cart
//! - `POST /auth/register` - account creation

mod rest;

pub use rest::RestClient;

use async_trait::async_trait;
use qkart_core::{CartEntry, Credential, Password, Product, ProductId, Quantity, Username};
use thiserror::Error;

/// Errors that can occur when talking to the QKart backend.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or rejected bearer token (HTTP 401).
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Read access to the product catalog.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Fetch the full product list.
    async fn fetch_catalog(&self) -> Result<Vec<Product>, ServiceError>;

    /// Fetch products matching `text`. An empty `text` means no filter.
    ///
    /// Returns [`ServiceError::NotFound`] when nothing matches.
    async fn search_catalog(&self, text: &str) -> Result<Vec<Product>, ServiceError>;
}

/// The authenticated remote cart.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Fetch the user's cart entries.
    async fn fetch_cart(&self, credential: &Credential) -> Result<Vec<CartEntry>, ServiceError>;

    /// Set the absolute quantity of `product_id` and return the complete
    /// new cart.
    async fn upsert_cart_entry(
        &self,
        credential: &Credential,
        product_id: &ProductId,
        qty: Quantity,
    ) -> Result<Vec<CartEntry>, ServiceError>;
}

/// Account management.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create a new account.
    async fn register(&self, username: &Username, password: &Password)
    -> Result<(), ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_display() {
        let err = ServiceError::NotFound("Product doesn't exist".to_string());
        assert_eq!(err.to_string(), "Not found: Product doesn't exist");

        let err = ServiceError::Api {
            status: 500,
            message: "Something went wrong".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - Something went wrong");
    }
}
