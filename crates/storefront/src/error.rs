//! Unified error handling with Sentry integration.
//!
//! Every failure the engine surfaces maps to a fixed, short message for the
//! user; protocol details (status codes, response bodies) stay in logs and
//! Sentry. Transient failures are captured to Sentry before being surfaced.

use qkart_core::{ProductId, RegistrationError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::remote::ServiceError;

/// Shown for any failure the user can only retry.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong. Check the backend console for more details";

/// Failures of cart loading and the cart mutation workflow.
#[derive(Debug, Error)]
pub enum CartError {
    /// No credential is stored; the remote service was not called.
    #[error("Not logged in")]
    Unauthenticated,

    /// The backend rejected the stored credential while loading the cart.
    #[error("Session expired")]
    SessionExpired,

    /// First add of a product that is already in the cart.
    #[error("Product already in cart: {0}")]
    DuplicateItem(ProductId),

    /// The cart service does not know the product.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Network, parse, or unexpected service failure.
    #[error("Cart service failure: {0}")]
    TransientFailure(#[source] ServiceError),
}

impl CartError {
    /// Human-readable notification text.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Login to add an item to the Cart",
            Self::SessionExpired => "Your session has expired. Login again to see your cart",
            Self::DuplicateItem(_) => {
                "Item already in cart. Use the cart sidebar to update quantity or remove item"
            }
            Self::ProductNotFound(_) => "Product doesn't exist",
            Self::TransientFailure(_) => GENERIC_FAILURE_MESSAGE,
        }
    }

    /// Whether this failure should be captured to Sentry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::TransientFailure(_))
    }
}

/// Failures of catalog loading and searching.
///
/// A search with no matches is not an error.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network, parse, or unexpected service failure.
    #[error("Catalog service failure: {0}")]
    TransientFailure(#[source] ServiceError),
}

impl CatalogError {
    /// Human-readable notification text.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::TransientFailure(_) => GENERIC_FAILURE_MESSAGE,
        }
    }
}

/// Failures of account registration.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The form failed local validation; nothing was sent.
    #[error("Invalid registration: {0}")]
    Invalid(#[from] RegistrationError),

    /// The backend refused the registration (e.g. username taken).
    #[error("Registration rejected: {0}")]
    Rejected(String),

    /// Network, parse, or unexpected service failure.
    #[error("Account service failure: {0}")]
    TransientFailure(#[source] ServiceError),
}

impl AccountError {
    /// Human-readable notification text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(err) => err.to_string(),
            Self::Rejected(message) => message.clone(),
            Self::TransientFailure(_) => "Something went wrong. Check that the backend is running, reachable and returns valid JSON.".to_string(),
        }
    }
}

/// Top-level error type for front-ends driving the storefront engine.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend client could not be constructed.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Registration failed.
    #[error("Account error: {0}")]
    Account(#[from] AccountError),
}

impl AppError {
    /// Human-readable message for the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.to_string(),
            Self::Service(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            Self::Cart(err) => err.user_message().to_string(),
            Self::Catalog(err) => err.user_message().to_string(),
            Self::Account(err) => err.user_message(),
        }
    }
}

/// Capture a transient failure to Sentry and log it.
pub fn capture_failure<E: std::error::Error + ?Sized>(err: &E) {
    let event_id = sentry::capture_error(err);
    tracing::error!(
        error = %err,
        sentry_event_id = %event_id,
        "Storefront operation failed"
    );
}

/// Set the Sentry user context from a username.
///
/// Call this after a session is established to associate errors with users.
pub fn set_sentry_user(username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "v4sLtEcMpzabRyfx")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
