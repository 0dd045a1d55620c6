//! Catalog loading and search.

use std::sync::Arc;

use qkart_core::Product;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::error::{CatalogError, add_breadcrumb, capture_failure};
use crate::remote::{CatalogService, ServiceError};
use crate::services::debounce::SearchQuery;
use crate::state::AppState;

/// Runs catalog queries and commits their results to the catalog cache.
#[derive(Clone)]
pub struct SearchCoordinator {
    state: AppState,
    catalog: Arc<dyn CatalogService>,
}

impl SearchCoordinator {
    #[must_use]
    pub fn new(state: AppState, catalog: Arc<dyn CatalogService>) -> Self {
        Self { state, catalog }
    }

    /// Fetch the full catalog into the cache.
    ///
    /// On failure the cache is left as it was and the user is notified.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::TransientFailure` if the fetch fails.
    #[instrument(skip(self))]
    pub async fn load_catalog(&self) -> Result<(), CatalogError> {
        match self.catalog.fetch_catalog().await {
            Ok(products) => {
                debug!(count = products.len(), "Catalog loaded");
                self.state.update_catalog(|cache| cache.replace_catalog(products));
                Ok(())
            }
            Err(e) => {
                let err = CatalogError::TransientFailure(e);
                capture_failure(&err);
                self.state.notifier().error(err.user_message());
                Err(err)
            }
        }
    }

    /// Search the catalog for `text`.
    ///
    /// An empty `text` means no filter. A "no matches" answer yields an empty
    /// list and is not an error. The result replaces the filtered list only
    /// if no later query has been issued in the meantime.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::TransientFailure` for any other failure. The
    /// filtered list is left unchanged and the user is notified, unless the
    /// query has already been superseded.
    #[instrument(skip(self))]
    pub async fn perform_search(&self, text: &str) -> Result<Vec<Product>, CatalogError> {
        let ticket = self.state.update_catalog(|cache| cache.issue());
        add_breadcrumb("search", "Catalog search", Some(&[("query", text)]));

        let products = match self.catalog.search_catalog(text).await {
            Ok(products) => products,
            Err(ServiceError::NotFound(_)) => {
                debug!(seq = ticket.seq(), "No products matched");
                Vec::new()
            }
            Err(e) => {
                let err = CatalogError::TransientFailure(e);
                if self.state.with_catalog(|cache| cache.is_current(ticket)) {
                    self.state.publish_search(ticket.seq());
                    capture_failure(&err);
                    self.state.notifier().error(err.user_message());
                } else {
                    debug!(seq = ticket.seq(), error = %err, "Superseded search failed");
                }
                return Err(err);
            }
        };

        if self
            .state
            .update_catalog(|cache| cache.apply_search(ticket, products.clone()))
        {
            self.state.publish_search(ticket.seq());
        }
        Ok(products)
    }

    /// Run a search for every intent received, until the sender closes.
    ///
    /// Each search runs in its own task, so a slow response never holds up a
    /// newer query.
    pub async fn run(self, mut intents: mpsc::UnboundedReceiver<SearchQuery>) {
        while let Some(query) = intents.recv().await {
            let coordinator = self.clone();
            tokio::spawn(async move {
                // Failures are already reported to the user.
                let _ = coordinator.perform_search(&query.text).await;
            });
        }
        debug!("Search intent stream closed");
    }
}
