//! Catalog cache: the full product list and the current search result.
//!
//! Search responses are tagged with the sequence number of the query that
//! produced them. Only the response to the most recently issued query may
//! replace the filtered list; a response to a superseded query is dropped
//! whether it arrives before or after the newer one.

use qkart_core::Product;

/// Sequence number handed out when a search is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchTicket(u64);

impl SearchTicket {
    /// The raw sequence number.
    #[must_use]
    pub const fn seq(self) -> u64 {
        self.0
    }
}

/// Most recently fetched full and filtered product lists.
#[derive(Debug, Default)]
pub struct CatalogCache {
    products: Vec<Product>,
    filtered: Vec<Product>,
    last_issued: u64,
    /// Set once any search result has replaced the filtered list.
    searched: bool,
}

impl CatalogCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The full catalog. Empty until the initial fetch completes.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// The products currently displayed as search results.
    #[must_use]
    pub fn filtered(&self) -> &[Product] {
        &self.filtered
    }

    /// Replace the full catalog.
    ///
    /// The filtered list is seeded with the full catalog unless a search
    /// result has already been applied.
    pub fn replace_catalog(&mut self, products: Vec<Product>) {
        if !self.searched {
            self.filtered.clone_from(&products);
        }
        self.products = products;
    }

    /// Tag a new search request.
    pub const fn issue(&mut self) -> SearchTicket {
        self.last_issued += 1;
        SearchTicket(self.last_issued)
    }

    /// Whether `ticket` belongs to the most recently issued search.
    ///
    /// A failed search leaves the filtered list untouched and is only
    /// surfaced while this holds.
    #[must_use]
    pub const fn is_current(&self, ticket: SearchTicket) -> bool {
        ticket.0 == self.last_issued
    }

    /// Apply a search response.
    ///
    /// Returns `false`, leaving the filtered list untouched, if a newer
    /// search has been issued since `ticket`.
    pub fn apply_search(&mut self, ticket: SearchTicket, products: Vec<Product>) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                seq = ticket.0,
                last_issued = self.last_issued,
                "Dropping stale search response"
            );
            return false;
        }
        self.filtered = products;
        self.searched = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::product;

    #[test]
    fn test_initial_catalog_seeds_filtered() {
        let mut cache = CatalogCache::new();
        cache.replace_catalog(vec![product("A", 10), product("B", 20)]);

        assert_eq!(cache.products().len(), 2);
        assert_eq!(cache.filtered().len(), 2);
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let mut cache = CatalogCache::new();
        let first = cache.issue();
        let second = cache.issue();

        assert!(cache.apply_search(second, vec![product("B", 20)]));
        assert!(!cache.is_current(first));
        assert!(!cache.apply_search(first, vec![product("A", 10)]));

        assert_eq!(cache.filtered().len(), 1);
        assert_eq!(cache.filtered()[0].id.as_str(), "B");
    }

    #[test]
    fn test_in_order_responses_are_applied() {
        let mut cache = CatalogCache::new();
        let first = cache.issue();
        assert!(cache.apply_search(first, vec![product("A", 10)]));
        let second = cache.issue();
        assert!(cache.apply_search(second, Vec::new()));
        assert!(cache.filtered().is_empty());
    }

    #[test]
    fn test_superseded_response_arriving_first_is_dropped() {
        let mut cache = CatalogCache::new();
        cache.replace_catalog(vec![product("A", 10), product("B", 20)]);
        let first = cache.issue();
        let second = cache.issue();

        assert!(!cache.is_current(first));
        assert!(!cache.apply_search(first, vec![product("A", 10)]));
        assert_eq!(cache.filtered().len(), 2);

        assert!(cache.apply_search(second, vec![product("B", 20)]));
        assert_eq!(cache.filtered()[0].id.as_str(), "B");
    }

    #[test]
    fn test_failed_search_does_not_block_catalog_seeding() {
        let mut cache = CatalogCache::new();
        let ticket = cache.issue();
        assert!(cache.is_current(ticket));

        cache.replace_catalog(vec![product("A", 10)]);

        assert_eq!(cache.filtered().len(), 1);
    }

    #[test]
    fn test_late_catalog_does_not_clobber_search_result() {
        let mut cache = CatalogCache::new();
        let ticket = cache.issue();
        cache.apply_search(ticket, vec![product("A", 10)]);

        cache.replace_catalog(vec![product("A", 10), product("B", 20)]);

        assert_eq!(cache.products().len(), 2);
        assert_eq!(cache.filtered().len(), 1);
    }
}
