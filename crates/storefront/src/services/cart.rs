//! Cart mutation workflow.
//!
//! Every successful mutation returns the complete remote cart, which the
//! caller commits in place of its local copy. Local state is never patched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use qkart_core::{CartEntry, Credential, ProductId, Quantity};
use tracing::{debug, instrument};

use crate::config::MutationPolicy;
use crate::error::CartError;
use crate::remote::{CartService, ServiceError};
use crate::services::reconcile::is_in_cart;

/// Options for [`CartWorkflow::add_or_update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Refuse to add a product that is already in the cart.
    ///
    /// Set for a first add from a product card; left unset for quantity
    /// changes from the cart sidebar.
    pub prevent_duplicate: bool,
}

impl AddOptions {
    /// Options for a first add.
    #[must_use]
    pub const fn first_add() -> Self {
        Self {
            prevent_duplicate: true,
        }
    }
}

/// Authenticated add/update operations against the remote cart.
pub struct CartWorkflow {
    service: Arc<dyn CartService>,
    policy: MutationPolicy,
    in_flight: Mutex<HashMap<ProductId, Arc<tokio::sync::Mutex<()>>>>,
}

impl CartWorkflow {
    /// Create a workflow over `service`.
    #[must_use]
    pub fn new(service: Arc<dyn CartService>, policy: MutationPolicy) -> Self {
        Self {
            service,
            policy,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Load the remote cart.
    ///
    /// Returns `Ok(None)` without calling the service when no credential is
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::SessionExpired` if the backend rejects the
    /// credential, or `CartError::TransientFailure` for anything else.
    #[instrument(skip_all)]
    pub async fn fetch_cart(
        &self,
        credential: Option<&Credential>,
    ) -> Result<Option<Vec<CartEntry>>, CartError> {
        let Some(credential) = credential else {
            debug!("No credential stored, skipping cart fetch");
            return Ok(None);
        };

        match self.service.fetch_cart(credential).await {
            Ok(entries) => Ok(Some(entries)),
            Err(ServiceError::Unauthenticated(_)) => Err(CartError::SessionExpired),
            Err(e) => Err(CartError::TransientFailure(e)),
        }
    }

    /// Set the quantity of `product_id` to `qty` in the remote cart.
    ///
    /// `entries` is the current local cart and is only read for the
    /// duplicate check. On success the complete new cart is returned.
    ///
    /// # Errors
    ///
    /// - `CartError::Unauthenticated` if `credential` is `None` (no remote
    ///   call is made) or the backend rejects it
    /// - `CartError::DuplicateItem` if `opts.prevent_duplicate` is set and
    ///   the product is already in `entries` (no remote call is made)
    /// - `CartError::ProductNotFound` if the backend does not know the product
    /// - `CartError::TransientFailure` for any other failure
    #[instrument(skip_all, fields(product_id = %product_id, qty = %qty))]
    pub async fn add_or_update(
        &self,
        credential: Option<&Credential>,
        entries: &[CartEntry],
        product_id: &ProductId,
        qty: Quantity,
        opts: AddOptions,
    ) -> Result<Vec<CartEntry>, CartError> {
        let credential = credential.ok_or(CartError::Unauthenticated)?;

        if opts.prevent_duplicate && is_in_cart(entries, product_id) {
            return Err(CartError::DuplicateItem(product_id.clone()));
        }

        let result = match self.policy {
            MutationPolicy::LastResponseWins => {
                self.service
                    .upsert_cart_entry(credential, product_id, qty)
                    .await
            }
            MutationPolicy::SerializePerProduct => {
                let slot = self.slot(product_id);
                let guard = slot.lock().await;
                let result = self
                    .service
                    .upsert_cart_entry(credential, product_id, qty)
                    .await;
                drop(guard);
                self.release(product_id, &slot);
                result
            }
        };

        result.map_err(|e| match e {
            ServiceError::Unauthenticated(_) => CartError::Unauthenticated,
            ServiceError::NotFound(_) => CartError::ProductNotFound(product_id.clone()),
            other => CartError::TransientFailure(other),
        })
    }

    /// The per-product lock, created on first use.
    fn slot(&self, product_id: &ProductId) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(in_flight.entry(product_id.clone()).or_default())
    }

    /// Forget the lock for `product_id` once nobody else holds or waits on it.
    fn release(&self, product_id: &ProductId, slot: &Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one held by the caller.
        if Arc::strong_count(slot) <= 2 {
            in_flight.remove(product_id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{FakeBackend, entry, product};

    fn workflow(backend: &Arc<FakeBackend>, policy: MutationPolicy) -> CartWorkflow {
        CartWorkflow::new(Arc::clone(backend) as Arc<dyn CartService>, policy)
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_no_credential_makes_no_call() {
        let backend = Arc::new(FakeBackend::with_catalog(vec![product("A", 10)]));
        let wf = workflow(&backend, MutationPolicy::default());

        let err = wf
            .add_or_update(None, &[], &ProductId::new("A"), qty(1), AddOptions::first_add())
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::Unauthenticated));
        assert!(backend.upserts().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_first_add_makes_no_call() {
        let backend = Arc::new(FakeBackend::with_catalog(vec![product("A", 10)]));
        let wf = workflow(&backend, MutationPolicy::default());
        let credential = Credential::new("token");

        let err = wf
            .add_or_update(
                Some(&credential),
                &[entry("A", 1)],
                &ProductId::new("A"),
                qty(1),
                AddOptions::first_add(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::DuplicateItem(ref id) if id.as_str() == "A"));
        assert!(backend.upserts().is_empty());
    }

    #[tokio::test]
    async fn test_quantity_change_skips_duplicate_check() {
        let backend = Arc::new(
            FakeBackend::with_catalog(vec![product("A", 10)]).with_cart(vec![entry("A", 1)]),
        );
        let wf = workflow(&backend, MutationPolicy::default());
        let credential = Credential::new("token");

        let cart = wf
            .add_or_update(
                Some(&credential),
                &[entry("A", 1)],
                &ProductId::new("A"),
                qty(3),
                AddOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(cart, vec![entry("A", 3)]);
    }

    #[tokio::test]
    async fn test_response_is_whole_cart() {
        let backend = Arc::new(
            FakeBackend::with_catalog(vec![product("A", 10), product("B", 5)])
                .with_cart(vec![entry("B", 2)]),
        );
        let wf = workflow(&backend, MutationPolicy::default());
        let credential = Credential::new("token");

        // Local copy is stale; the server's view wins.
        let cart = wf
            .add_or_update(
                Some(&credential),
                &[],
                &ProductId::new("A"),
                qty(1),
                AddOptions::first_add(),
            )
            .await
            .unwrap();

        assert_eq!(cart, vec![entry("B", 2), entry("A", 1)]);
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let backend = Arc::new(FakeBackend::with_catalog(vec![product("A", 10)]));
        let wf = workflow(&backend, MutationPolicy::default());
        let credential = Credential::new("token");
        let add = |id: &'static str| {
            let wf = &wf;
            let credential = &credential;
            async move {
                wf.add_or_update(
                    Some(credential),
                    &[],
                    &ProductId::new(id),
                    qty(1),
                    AddOptions::first_add(),
                )
                .await
            }
        };

        assert!(matches!(add("missing").await, Err(CartError::ProductNotFound(_))));

        backend.fail_cart(true);
        assert!(matches!(add("A").await, Err(CartError::TransientFailure(_))));
        backend.fail_cart(false);

        backend.reject_credentials(true);
        assert!(matches!(add("A").await, Err(CartError::Unauthenticated)));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_last_response_wins_runs_concurrently() {
        let backend = Arc::new(FakeBackend::with_catalog(vec![product("A", 10)]));
        backend.delay_upserts(Duration::from_millis(100));
        let wf = workflow(&backend, MutationPolicy::LastResponseWins);
        let credential = Credential::new("token");
        let id = ProductId::new("A");
        let started = tokio::time::Instant::now();

        let (first, second) = tokio::join!(
            wf.add_or_update(Some(&credential), &[], &id, qty(1), AddOptions::default()),
            wf.add_or_update(Some(&credential), &[], &id, qty(2), AddOptions::default()),
        );

        assert!(started.elapsed() < Duration::from_millis(200));
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(backend.remote_cart(), vec![entry("A", 2)]);
    }

    #[tokio::test]
    async fn test_fetch_cart_without_credential_is_noop() {
        let backend = Arc::new(FakeBackend::default().with_cart(vec![entry("A", 1)]));
        let wf = workflow(&backend, MutationPolicy::default());

        assert!(wf.fetch_cart(None).await.unwrap().is_none());
        assert_eq!(backend.cart_fetches(), 0);

        let credential = Credential::new("token");
        let cart = wf.fetch_cart(Some(&credential)).await.unwrap();
        assert_eq!(cart, Some(vec![entry("A", 1)]));
        assert_eq!(backend.cart_fetches(), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_serialized_policy_orders_same_product() {
        let backend = Arc::new(FakeBackend::with_catalog(vec![product("A", 10)]));
        backend.delay_upserts(Duration::from_millis(100));
        let wf = workflow(&backend, MutationPolicy::SerializePerProduct);
        let credential = Credential::new("token");
        let id = ProductId::new("A");
        let started = tokio::time::Instant::now();

        let first = wf.add_or_update(Some(&credential), &[], &id, qty(1), AddOptions::default());
        let second = wf.add_or_update(Some(&credential), &[], &id, qty(2), AddOptions::default());
        let (first, second) = tokio::join!(first, second);

        // The second upsert only starts once the first has resolved.
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(first.unwrap(), vec![entry("A", 1)]);
        assert_eq!(second.unwrap(), vec![entry("A", 2)]);
        assert_eq!(backend.upserts(), vec![(id.clone(), 1), (id, 2)]);
        assert!(wf.in_flight.lock().unwrap().is_empty());
    }
}
