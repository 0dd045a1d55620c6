//! REST client for the QKart backend.
//!
//! Uses `reqwest` for HTTP with JSON bodies. The full catalog is cached with
//! `moka` (configurable TTL, 5 minutes by default); searches and cart calls
//! are never cached.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use qkart_core::{CartEntry, Credential, Password, Product, ProductId, Quantity, Username};
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{AccountService, CartService, CatalogService, ServiceError};
use crate::config::ClientConfig;

const CATALOG_KEY: &str = "catalog";

/// Error body returned by the backend: `{ "success": false, "message": "..." }`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Upsert request body: `{ "productId": "...", "qty": 2 }`.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct UpsertBody<'a> {
    product_id: &'a ProductId,
    qty: Quantity,
}

/// Registration request body.
#[derive(serde::Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    password: &'a str,
}

/// Client for the QKart REST backend.
///
/// Cheaply cloneable; all clones share one connection pool and one catalog
/// cache.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    endpoint: String,
    catalog_cache: Cache<&'static str, Arc<Vec<Product>>>,
}

impl RestClient {
    /// Create a new REST client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let catalog_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(RestClientInner {
                client,
                endpoint: config.endpoint.as_str().trim_end_matches('/').to_string(),
                catalog_cache,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.endpoint)
    }
}

#[async_trait]
impl CatalogService for RestClient {
    #[instrument(skip(self))]
    async fn fetch_catalog(&self) -> Result<Vec<Product>, ServiceError> {
        if let Some(products) = self.inner.catalog_cache.get(CATALOG_KEY).await {
            debug!("Cache hit for catalog");
            return Ok(products.as_ref().clone());
        }

        let response = self.inner.client.get(self.url("products")).send().await?;
        let products: Vec<Product> = decode(response).await?;

        self.inner
            .catalog_cache
            .insert(CATALOG_KEY, Arc::new(products.clone()))
            .await;

        Ok(products)
    }

    #[instrument(skip(self), fields(text = %text))]
    async fn search_catalog(&self, text: &str) -> Result<Vec<Product>, ServiceError> {
        let url = format!(
            "{}?value={}",
            self.url("products/search"),
            urlencoding::encode(text)
        );

        let response = self.inner.client.get(&url).send().await?;
        decode(response).await
    }
}

#[async_trait]
impl CartService for RestClient {
    #[instrument(skip(self, credential))]
    async fn fetch_cart(&self, credential: &Credential) -> Result<Vec<CartEntry>, ServiceError> {
        let response = self
            .inner
            .client
            .get(self.url("cart"))
            .header(AUTHORIZATION, credential.bearer())
            .send()
            .await?;

        decode(response).await
    }

    #[instrument(skip(self, credential), fields(product_id = %product_id, qty = %qty))]
    async fn upsert_cart_entry(
        &self,
        credential: &Credential,
        product_id: &ProductId,
        qty: Quantity,
    ) -> Result<Vec<CartEntry>, ServiceError> {
        let response = self
            .inner
            .client
            .post(self.url("cart"))
            .header(AUTHORIZATION, credential.bearer())
            .json(&UpsertBody { product_id, qty })
            .send()
            .await?;

        decode(response).await
    }
}

#[async_trait]
impl AccountService for RestClient {
    #[instrument(skip(self, password), fields(username = %username))]
    async fn register(&self, username: &Username, password: &Password) -> Result<(), ServiceError> {
        let response = self
            .inner
            .client
            .post(self.url("auth/register"))
            .json(&RegisterBody {
                username: username.as_str(),
                password: password.expose(),
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await?;
        Err(error_for_status(status, &body))
    }
}

// =============================================================================
// Response Handling
// =============================================================================

/// Decode a JSON success body, or map the failure status to a [`ServiceError`].
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ServiceError> {
    let status = response.status();

    // Get response body as text first for better error diagnostics
    let body = response.text().await?;

    if !status.is_success() {
        return Err(error_for_status(status, &body));
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse QKart backend response"
        );
        ServiceError::Parse(e)
    })
}

fn error_for_status(status: StatusCode, body: &str) -> ServiceError {
    let message = error_message(body);
    match status {
        StatusCode::NOT_FOUND => ServiceError::NotFound(message),
        StatusCode::UNAUTHORIZED => ServiceError::Unauthenticated(message),
        _ => {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "QKart backend returned non-success status"
            );
            ServiceError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

/// Best-effort extraction of the backend's `message` field.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.chars().take(200).collect())
}
