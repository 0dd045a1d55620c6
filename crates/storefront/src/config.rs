//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `QKART_API_ENDPOINT` - Base URL of the QKart backend (e.g. `https://qkart.example.com/api/v1`)
//!
//! ## Optional
//! - `QKART_SEARCH_DEBOUNCE_MS` - Search quiet period in milliseconds (default: 500)
//! - `QKART_REQUEST_TIMEOUT_SECS` - Transport timeout for backend calls (default: 30)
//! - `QKART_CATALOG_CACHE_TTL_SECS` - Lifetime of the cached full catalog (default: 300)
//! - `QKART_MUTATION_POLICY` - `last-response-wins` (default) or `serialize-per-product`
//! - `QKART_TOKEN` - Previously issued bearer token to start the session with
//! - `QKART_USERNAME` - Username belonging to `QKART_TOKEN`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_SEARCH_DEBOUNCE_MS: &str = "500";
const DEFAULT_REQUEST_TIMEOUT_SECS: &str = "30";
const DEFAULT_CATALOG_CACHE_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// How concurrent cart mutations are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationPolicy {
    /// Mutations run concurrently; the last response to resolve overwrites
    /// the local cart.
    #[default]
    LastResponseWins,
    /// At most one upsert per product is in flight; later calls for the same
    /// product queue behind it.
    SerializePerProduct,
}

impl FromStr for MutationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-response-wins" => Ok(Self::LastResponseWins),
            "serialize-per-product" => Ok(Self::SerializePerProduct),
            other => Err(format!(
                "unknown policy '{other}' (expected last-response-wins or serialize-per-product)"
            )),
        }
    }
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL
    pub endpoint: Url,
    /// Quiet period after the last keystroke before a search is issued
    pub search_debounce: Duration,
    /// Transport-level timeout for every backend call
    pub request_timeout: Duration,
    /// Time-to-live of the cached full catalog response
    pub catalog_cache_ttl: Duration,
    /// Ordering of concurrent cart mutations
    pub mutation_policy: MutationPolicy,
    /// Stored session to resume, if any
    pub stored_session: Option<StoredSession>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// A credential persisted from an earlier login.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct StoredSession {
    pub token: SecretString,
    pub username: Option<String>,
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let endpoint = parse_endpoint(&get_required_env("QKART_API_ENDPOINT")?)?;
        let search_debounce = Duration::from_millis(parse_env(
            "QKART_SEARCH_DEBOUNCE_MS",
            DEFAULT_SEARCH_DEBOUNCE_MS,
        )?);
        let request_timeout = Duration::from_secs(parse_env(
            "QKART_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        let catalog_cache_ttl = Duration::from_secs(parse_env(
            "QKART_CATALOG_CACHE_TTL_SECS",
            DEFAULT_CATALOG_CACHE_TTL_SECS,
        )?);
        let mutation_policy = parse_env("QKART_MUTATION_POLICY", "last-response-wins")?;

        let stored_session = get_optional_env("QKART_TOKEN").map(|token| StoredSession {
            token: SecretString::from(token),
            username: get_optional_env("QKART_USERNAME"),
        });

        Ok(Self {
            endpoint,
            search_debounce,
            request_timeout,
            catalog_cache_ttl,
            mutation_policy,
            stored_session,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration with defaults for everything but the endpoint.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            search_debounce: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
            catalog_cache_ttl: Duration::from_secs(300),
            mutation_policy: MutationPolicy::default(),
            stored_session: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional, non-empty environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the backend endpoint, requiring an http(s) URL.
fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| {
        ConfigError::InvalidEnvVar("QKART_API_ENDPOINT".to_string(), e.to_string())
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "QKART_API_ENDPOINT".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}
