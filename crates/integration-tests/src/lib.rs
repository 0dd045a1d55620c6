//! Integration tests for the QKart storefront engine.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p qkart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `reconciliation` - Cart join, totals and membership through the public API
//! - `cart_workflow` - Authenticated mutations, duplicate guard, races
//! - `search` - Debounced input and out-of-order search responses
//!
//! Every test runs against the in-memory backend from
//! `qkart_storefront::testing`; timing-sensitive tests use a paused Tokio
//! clock.

use std::sync::Arc;

use qkart_core::Credential;
use qkart_storefront::config::{ClientConfig, MutationPolicy};
use qkart_storefront::notify::Notifications;
use qkart_storefront::state::Session;
use qkart_storefront::testing::FakeBackend;
use qkart_storefront::{Services, Storefront};

/// A storefront wired to an in-memory backend.
pub struct TestContext {
    pub backend: Arc<FakeBackend>,
    pub storefront: Storefront,
    pub notifications: Notifications,
}

impl TestContext {
    /// Signed-out storefront with default configuration.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(backend: FakeBackend) -> Self {
        Self::with_policy(backend, MutationPolicy::default())
    }

    /// Signed-out storefront using `policy` for cart mutations.
    #[must_use]
    pub fn with_policy(backend: FakeBackend, policy: MutationPolicy) -> Self {
        let mut config = test_config();
        config.mutation_policy = policy;

        let backend = Arc::new(backend);
        let (storefront, notifications) =
            Storefront::new(config, Services::from_backend(Arc::clone(&backend)));
        Self {
            backend,
            storefront,
            notifications,
        }
    }

    /// Sign in with a test token.
    #[must_use]
    pub fn signed_in(self) -> Self {
        self.storefront
            .login(Session::new(Credential::new("test-token"), Some("crio.do".to_string())));
        self
    }
}

/// Configuration pointing at a local backend with default timings.
#[must_use]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
pub fn test_config() -> ClientConfig {
    ClientConfig::new("http://localhost:8082/api/v1".parse().unwrap())
}
