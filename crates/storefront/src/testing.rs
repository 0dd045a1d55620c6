//! In-memory backend and fixtures for tests.
//!
//! [`FakeBackend`] implements every remote contract, records each call, and
//! can be scripted to fail or to delay responses (use with a paused Tokio
//! clock).

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use qkart_core::{
    CartEntry, Credential, Password, Price, Product, ProductId, Quantity, Rating, Username,
};

use crate::remote::{AccountService, CartService, CatalogService, ServiceError};

/// Build a product with the given id and whole-unit cost.
#[must_use]
pub fn product(id: &str, cost: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        category: "General".to_string(),
        cost: Price::from_units(cost),
        rating: Rating::new(4).unwrap(),
        image: format!("https://i.imgur.com/{id}.jpg").parse().unwrap(),
    }
}

/// Build a named product in a category.
#[must_use]
pub fn named_product(id: &str, name: &str, category: &str, cost: i64) -> Product {
    Product {
        name: name.to_string(),
        category: category.to_string(),
        ..product(id, cost)
    }
}

/// Build a cart entry.
#[must_use]
pub fn entry(id: &str, qty: u32) -> CartEntry {
    CartEntry::new(ProductId::new(id), Quantity::new(qty).unwrap())
}

/// Scripted in-memory QKart backend.
#[derive(Default)]
pub struct FakeBackend {
    catalog: Mutex<Vec<Product>>,
    cart: Mutex<Vec<CartEntry>>,
    usernames: Mutex<Vec<String>>,

    catalog_fetches: Mutex<usize>,
    searches: Mutex<Vec<String>>,
    cart_fetches: Mutex<usize>,
    upserts: Mutex<Vec<(ProductId, u32)>>,

    fail_catalog: Mutex<bool>,
    fail_search: Mutex<bool>,
    failing_searches: Mutex<HashSet<String>>,
    fail_cart: Mutex<bool>,
    reject_credentials: Mutex<bool>,
    search_delays: Mutex<HashMap<String, Duration>>,
    upsert_delay: Mutex<Option<Duration>>,
}

impl FakeBackend {
    /// A backend serving `catalog` with an empty cart.
    #[must_use]
    pub fn with_catalog(catalog: Vec<Product>) -> Self {
        let backend = Self::default();
        *backend.catalog.lock().unwrap() = catalog;
        backend
    }

    /// Seed the remote cart.
    #[must_use]
    pub fn with_cart(self, cart: Vec<CartEntry>) -> Self {
        *self.cart.lock().unwrap() = cart;
        self
    }

    /// Change the remote cart behind the client's back.
    pub fn set_remote_entry(&self, entry: CartEntry) {
        let mut cart = self.cart.lock().unwrap();
        match cart.iter_mut().find(|e| e.product_id == entry.product_id) {
            Some(existing) => existing.qty = entry.qty,
            None => cart.push(entry),
        }
    }

    /// Make catalog fetches fail with a 500.
    pub fn fail_catalog(&self, fail: bool) {
        *self.fail_catalog.lock().unwrap() = fail;
    }

    /// Make searches fail with a 500.
    pub fn fail_search(&self, fail: bool) {
        *self.fail_search.lock().unwrap() = fail;
    }

    /// Make searches for `text` fail with a 500.
    pub fn fail_search_for(&self, text: &str) {
        self.failing_searches
            .lock()
            .unwrap()
            .insert(text.to_string());
    }

    /// Make cart fetches and upserts fail with a 500.
    pub fn fail_cart(&self, fail: bool) {
        *self.fail_cart.lock().unwrap() = fail;
    }

    /// Answer every cart call with 401.
    pub fn reject_credentials(&self, reject: bool) {
        *self.reject_credentials.lock().unwrap() = reject;
    }

    /// Delay the response to a search for `text`.
    pub fn delay_search(&self, text: &str, delay: Duration) {
        self.search_delays
            .lock()
            .unwrap()
            .insert(text.to_string(), delay);
    }

    /// Delay every upsert response.
    pub fn delay_upserts(&self, delay: Duration) {
        *self.upsert_delay.lock().unwrap() = Some(delay);
    }

    /// Register a taken username.
    pub fn take_username(&self, username: &str) {
        self.usernames.lock().unwrap().push(username.to_string());
    }

    /// Search texts received, in arrival order.
    #[must_use]
    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    /// Upserts received, in arrival order.
    #[must_use]
    pub fn upserts(&self) -> Vec<(ProductId, u32)> {
        self.upserts.lock().unwrap().clone()
    }

    /// Number of catalog fetches received.
    #[must_use]
    pub fn catalog_fetches(&self) -> usize {
        *self.catalog_fetches.lock().unwrap()
    }

    /// Number of cart fetches received.
    #[must_use]
    pub fn cart_fetches(&self) -> usize {
        *self.cart_fetches.lock().unwrap()
    }

    /// Current remote cart.
    #[must_use]
    pub fn remote_cart(&self) -> Vec<CartEntry> {
        self.cart.lock().unwrap().clone()
    }

    fn server_error() -> ServiceError {
        ServiceError::Api {
            status: 500,
            message: "Something went wrong".to_string(),
        }
    }

    fn check_credentials(&self) -> Result<(), ServiceError> {
        if *self.reject_credentials.lock().unwrap() {
            return Err(ServiceError::Unauthenticated(
                "Protected route, Oauth2 Bearer token not found".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogService for FakeBackend {
    async fn fetch_catalog(&self) -> Result<Vec<Product>, ServiceError> {
        *self.catalog_fetches.lock().unwrap() += 1;
        if *self.fail_catalog.lock().unwrap() {
            return Err(Self::server_error());
        }
        Ok(self.catalog.lock().unwrap().clone())
    }

    async fn search_catalog(&self, text: &str) -> Result<Vec<Product>, ServiceError> {
        self.searches.lock().unwrap().push(text.to_string());
        let delay = self.search_delays.lock().unwrap().get(text).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let fail = *self.fail_search.lock().unwrap()
            || self.failing_searches.lock().unwrap().contains(text);
        if fail {
            return Err(Self::server_error());
        }

        let needle = text.to_lowercase();
        let matches: Vec<Product> = self
            .catalog
            .lock()
            .unwrap()
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.category.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        if matches.is_empty() {
            return Err(ServiceError::NotFound("No products found".to_string()));
        }
        Ok(matches)
    }
}

#[async_trait]
impl CartService for FakeBackend {
    async fn fetch_cart(&self, _credential: &Credential) -> Result<Vec<CartEntry>, ServiceError> {
        *self.cart_fetches.lock().unwrap() += 1;
        self.check_credentials()?;
        if *self.fail_cart.lock().unwrap() {
            return Err(Self::server_error());
        }
        Ok(self.cart.lock().unwrap().clone())
    }

    async fn upsert_cart_entry(
        &self,
        _credential: &Credential,
        product_id: &ProductId,
        qty: Quantity,
    ) -> Result<Vec<CartEntry>, ServiceError> {
        self.upserts
            .lock()
            .unwrap()
            .push((product_id.clone(), qty.get()));
        let delay = *self.upsert_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_credentials()?;
        if *self.fail_cart.lock().unwrap() {
            return Err(Self::server_error());
        }
        if !self
            .catalog
            .lock()
            .unwrap()
            .iter()
            .any(|p| &p.id == product_id)
        {
            return Err(ServiceError::NotFound("Product doesn't exist".to_string()));
        }

        let mut cart = self.cart.lock().unwrap();
        match cart.iter_mut().find(|e| &e.product_id == product_id) {
            Some(existing) => existing.qty = qty,
            None => cart.push(CartEntry::new(product_id.clone(), qty)),
        }
        Ok(cart.clone())
    }
}

#[async_trait]
impl AccountService for FakeBackend {
    async fn register(&self, username: &Username, _password: &Password) -> Result<(), ServiceError> {
        let mut usernames = self.usernames.lock().unwrap();
        if usernames.iter().any(|u| u == username.as_str()) {
            return Err(ServiceError::Api {
                status: 400,
                message: "Username is already taken".to_string(),
            });
        }
        usernames.push(username.as_str().to_string());
        Ok(())
    }
}
