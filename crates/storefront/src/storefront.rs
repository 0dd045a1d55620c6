//! The storefront engine facade.
//!
//! [`Storefront`] wires the application state, the remote services and the
//! debounce pump together and exposes the operations a presentation layer
//! drives: loading, searching, adding to the cart, changing quantities and
//! registering. Every failure is reported through [`Notifications`] as well
//! as returned.

use std::sync::Arc;

use qkart_core::{Product, ProductId, Quantity, RegistrationForm, Username};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{
    AccountError, AppError, CartError, CatalogError, add_breadcrumb, capture_failure,
    clear_sentry_user, set_sentry_user,
};
use crate::notify::{self, Notifications};
use crate::remote::{AccountService, CartService, CatalogService, RestClient};
use crate::services::{
    AccountFlow, AddOptions, CartView, CartWorkflow, Debouncer, SearchCoordinator, is_in_cart,
};
use crate::state::{AppState, Session};

/// Remote collaborators the engine talks to.
#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<dyn CatalogService>,
    pub cart: Arc<dyn CartService>,
    pub account: Arc<dyn AccountService>,
}

impl Services {
    /// Use one backend for every contract.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: CatalogService + CartService + AccountService + 'static,
    {
        Self {
            catalog: Arc::clone(&backend) as Arc<dyn CatalogService>,
            cart: Arc::clone(&backend) as Arc<dyn CartService>,
            account: backend,
        }
    }
}

impl From<RestClient> for Services {
    fn from(client: RestClient) -> Self {
        Self::from_backend(Arc::new(client))
    }
}

/// Client-side storefront engine.
pub struct Storefront {
    state: AppState,
    search: SearchCoordinator,
    debouncer: Debouncer,
    cart: CartWorkflow,
    account: AccountFlow,
    pump: JoinHandle<()>,
}

impl Storefront {
    /// Create the engine and start its search pump.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(config: ClientConfig, services: Services) -> (Self, Notifications) {
        let (notifier, notifications) = notify::channel();
        let cart = CartWorkflow::new(services.cart, config.mutation_policy);
        let state = AppState::new(config, notifier);

        if let Some(username) = state.session().username() {
            set_sentry_user(username);
        }

        let search = SearchCoordinator::new(state.clone(), services.catalog);
        let (debouncer, intents) = Debouncer::new();
        let pump = tokio::spawn(search.clone().run(intents));

        let storefront = Self {
            state,
            search,
            debouncer,
            cart,
            account: AccountFlow::new(services.account),
            pump,
        };
        (storefront, notifications)
    }

    /// Create the engine against the REST backend named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Service` if the HTTP client cannot be built.
    pub fn from_config(config: ClientConfig) -> Result<(Self, Notifications), AppError> {
        let client = RestClient::new(&config)?;
        Ok(Self::new(config, client.into()))
    }

    /// Shared application state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetch the catalog and, when signed in, the cart.
    ///
    /// The two fetches run concurrently and may finish in any order.
    ///
    /// # Errors
    ///
    /// Returns the catalog failure if there was one, otherwise the cart
    /// failure. Both are also reported as notifications.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<(), AppError> {
        let (catalog, cart) = tokio::join!(self.search.load_catalog(), self.load_cart());
        catalog?;
        cart?;
        Ok(())
    }

    /// Fetch the remote cart into local state. Does nothing when signed out.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the fetch fails; the local cart is unchanged.
    pub async fn load_cart(&self) -> Result<(), CartError> {
        let credential = self.state.credential();
        match self.cart.fetch_cart(credential.as_ref()).await {
            Ok(Some(entries)) => {
                self.state.replace_cart(entries);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                self.report_cart_error(&err);
                Err(err)
            }
        }
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Record a keystroke in the search box.
    ///
    /// The search runs once the configured quiet period passes without
    /// further input.
    pub fn on_search_input(&self, text: impl Into<String>) {
        self.debouncer
            .on_input(text, self.state.config().search_debounce);
    }

    /// Search immediately, discarding any pending debounced search.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::TransientFailure` if the search fails.
    pub async fn search_now(&self, text: &str) -> Result<Vec<Product>, CatalogError> {
        self.debouncer.cancel();
        self.search.perform_search(text).await
    }

    /// Whether a debounced search is still waiting for its quiet period.
    #[must_use]
    pub fn search_pending(&self) -> bool {
        self.debouncer.is_armed()
    }

    /// Watch the sequence number of the last settled search.
    ///
    /// Changes whenever a search result (or failure) is committed, which is
    /// when [`filtered_products`](Self::filtered_products) may have changed.
    #[must_use]
    pub fn subscribe_searches(&self) -> tokio::sync::watch::Receiver<u64> {
        self.state.subscribe_searches()
    }

    /// The full catalog.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.state.with_catalog(|c| c.products().to_vec())
    }

    /// The current search results.
    #[must_use]
    pub fn filtered_products(&self) -> Vec<Product> {
        self.state.with_catalog(|c| c.filtered().to_vec())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add one unit of a product from its catalog card.
    ///
    /// # Errors
    ///
    /// Fails with `CartError::DuplicateItem` if the product is already in
    /// the cart; see [`CartWorkflow::add_or_update`] for the rest.
    pub async fn add_to_cart(&self, product_id: &ProductId) -> Result<CartView, CartError> {
        self.mutate(product_id, Quantity::ONE, AddOptions::first_add())
            .await
    }

    /// Set the quantity of a product already in the cart.
    ///
    /// # Errors
    ///
    /// See [`CartWorkflow::add_or_update`].
    pub async fn set_quantity(
        &self,
        product_id: &ProductId,
        qty: Quantity,
    ) -> Result<CartView, CartError> {
        self.mutate(product_id, qty, AddOptions::default()).await
    }

    /// The cart joined with the catalog.
    #[must_use]
    pub fn cart_view(&self) -> CartView {
        let entries = self.state.cart();
        self.state
            .with_catalog(|c| CartView::build(&entries, c.products()))
    }

    /// Whether `product_id` is in the local cart.
    #[must_use]
    pub fn is_in_cart(&self, product_id: &ProductId) -> bool {
        is_in_cart(&self.state.cart(), product_id)
    }

    async fn mutate(
        &self,
        product_id: &ProductId,
        qty: Quantity,
        opts: AddOptions,
    ) -> Result<CartView, CartError> {
        let credential = self.state.credential();
        let entries = self.state.cart();

        match self
            .cart
            .add_or_update(credential.as_ref(), &entries, product_id, qty, opts)
            .await
        {
            Ok(cart) => {
                if self.state.credential() != credential {
                    info!(
                        product_id = %product_id,
                        "Session changed during cart update, dropping response"
                    );
                    return Ok(self.cart_view());
                }
                add_breadcrumb(
                    "cart",
                    "Cart updated",
                    Some(&[("product_id", product_id.as_str())]),
                );
                self.state.replace_cart(cart);
                Ok(self.cart_view())
            }
            Err(err) => {
                self.report_cart_error(&err);
                Err(err)
            }
        }
    }

    fn report_cart_error(&self, err: &CartError) {
        if err.is_transient() {
            capture_failure(err);
        } else {
            warn!(error = %err, "Cart operation refused");
        }
        self.state.notifier().error(err.user_message());
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// See [`AccountFlow::register`].
    pub async fn register(&self, form: &RegistrationForm) -> Result<Username, AccountError> {
        match self.account.register(form).await {
            Ok(username) => {
                self.state.notifier().success("Registered successfully");
                Ok(username)
            }
            Err(err) => {
                if matches!(err, AccountError::TransientFailure(_)) {
                    capture_failure(&err);
                }
                self.state.notifier().error(err.user_message());
                Err(err)
            }
        }
    }

    /// Start a session with an issued credential.
    pub fn login(&self, session: Session) {
        if let Some(username) = session.username() {
            set_sentry_user(username);
        }
        self.state.set_session(session);
    }

    /// End the session and clear the local cart.
    pub fn logout(&self) {
        self.state.logout();
        clear_sentry_user();
        info!("Logged out");
    }
}

impl Drop for Storefront {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use qkart_core::Credential;

    use super::*;
    use crate::notify::Severity;
    use crate::testing::{FakeBackend, entry, named_product, product};

    fn config() -> ClientConfig {
        ClientConfig::new("http://localhost:8082/api/v1".parse().unwrap())
    }

    fn signed_in(backend: &Arc<FakeBackend>) -> (Storefront, Notifications) {
        let (storefront, notifications) =
            Storefront::new(config(), Services::from_backend(Arc::clone(backend)));
        storefront.login(Session::new(Credential::new("token"), None));
        (storefront, notifications)
    }

    #[tokio::test]
    async fn test_load_signed_out_skips_cart() {
        let backend = Arc::new(FakeBackend::with_catalog(vec![product("A", 10)]));
        let (storefront, _) = Storefront::new(config(), Services::from_backend(Arc::clone(&backend)));

        storefront.load().await.unwrap();

        assert_eq!(storefront.products().len(), 1);
        assert_eq!(backend.catalog_fetches(), 1);
        assert_eq!(backend.cart_fetches(), 0);
        assert!(storefront.cart_view().is_empty());
    }

    #[tokio::test]
    async fn test_load_signed_in_builds_cart_view() {
        let backend = Arc::new(
            FakeBackend::with_catalog(vec![product("A", 10), product("B", 5)])
                .with_cart(vec![entry("B", 2), entry("A", 1)]),
        );
        let (storefront, _) = signed_in(&backend);

        storefront.load().await.unwrap();

        let view = storefront.cart_view();
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.items[0].product.id.as_str(), "B");
        assert_eq!(view.total.to_string(), "$20");
    }

    #[tokio::test]
    async fn test_add_to_cart_replaces_local_cart() {
        let backend = Arc::new(FakeBackend::with_catalog(vec![product("A", 10)]));
        let (storefront, _) = signed_in(&backend);
        storefront.load().await.unwrap();

        let view = storefront.add_to_cart(&ProductId::new("A")).await.unwrap();

        assert_eq!(view.items.len(), 1);
        assert!(storefront.is_in_cart(&ProductId::new("A")));
    }

    #[tokio::test]
    async fn test_second_add_is_duplicate_and_notified() {
        let backend = Arc::new(FakeBackend::with_catalog(vec![product("A", 10)]));
        let (storefront, mut notifications) = signed_in(&backend);
        storefront.load().await.unwrap();
        storefront.add_to_cart(&ProductId::new("A")).await.unwrap();

        let err = storefront
            .add_to_cart(&ProductId::new("A"))
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::DuplicateItem(_)));
        assert_eq!(backend.upserts().len(), 1);
        let drained = notifications.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].message, err.user_message());
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_cart() {
        let backend = Arc::new(
            FakeBackend::with_catalog(vec![product("A", 10)]).with_cart(vec![entry("A", 1)]),
        );
        let (storefront, _) = signed_in(&backend);
        storefront.load().await.unwrap();

        backend.fail_cart(true);
        let err = storefront
            .set_quantity(&ProductId::new("A"), Quantity::new(4).unwrap())
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(storefront.cart_view().item_count, 1);
    }

    #[tokio::test]
    async fn test_add_signed_out_is_unauthenticated() {
        let backend = Arc::new(FakeBackend::with_catalog(vec![product("A", 10)]));
        let (storefront, mut notifications) =
            Storefront::new(config(), Services::from_backend(Arc::clone(&backend)));

        let err = storefront
            .add_to_cart(&ProductId::new("A"))
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::Unauthenticated));
        assert!(backend.upserts().is_empty());
        assert_eq!(
            notifications.drain()[0].message,
            "Login to add an item to the Cart"
        );
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_typing_runs_one_search() {
        let backend = Arc::new(FakeBackend::with_catalog(vec![
            named_product("1", "Apple Watch", "Electronics", 300),
            named_product("2", "Running Shoes", "Fashion", 80),
        ]));
        let (storefront, _) = Storefront::new(config(), Services::from_backend(Arc::clone(&backend)));
        storefront.load().await.unwrap();

        for text in ["a", "ap", "app"] {
            storefront.on_search_input(text);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(backend.searches(), ["app"]);
        let filtered = storefront.filtered_products();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id.as_str(), "1");
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_logout_during_update_keeps_cart_empty() {
        let backend = Arc::new(FakeBackend::with_catalog(vec![product("A", 10)]));
        let (storefront, _) = signed_in(&backend);
        storefront.load().await.unwrap();
        backend.delay_upserts(Duration::from_millis(50));

        let id = ProductId::new("A");
        let (result, ()) = tokio::join!(storefront.add_to_cart(&id), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            storefront.logout();
        });

        assert!(result.unwrap().is_empty());
        assert_eq!(backend.remote_cart(), vec![entry("A", 1)]);
        assert!(storefront.cart_view().is_empty());
        assert!(!storefront.is_in_cart(&ProductId::new("A")));
    }

    #[tokio::test]
    async fn test_register_notifies_success() {
        let backend = Arc::new(FakeBackend::default());
        let (storefront, mut notifications) =
            Storefront::new(config(), Services::from_backend(Arc::clone(&backend)));
        let form = RegistrationForm {
            username: "crio.do".to_string(),
            password: "learnbydoing".to_string(),
            confirm_password: "learnbydoing".to_string(),
        };

        storefront.register(&form).await.unwrap();

        let drained = notifications.drain();
        assert_eq!(drained[0].severity, Severity::Success);
        assert_eq!(drained[0].message, "Registered successfully");
    }
}
