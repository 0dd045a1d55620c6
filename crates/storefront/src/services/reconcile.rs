//! Cart reconciliation: joins remote cart entries with the cached catalog.
//!
//! Everything here is a pure function of its inputs. The enriched view has
//! no lifecycle of its own and is recomputed whenever the cart or the catalog
//! changes.

use std::collections::HashMap;

use qkart_core::{CartEntry, Price, Product, ProductId, Quantity};
use serde::Serialize;
use tracing::warn;

/// A cart entry joined with its full product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedCartItem {
    pub product: Product,
    pub qty: Quantity,
}

impl EnrichedCartItem {
    /// `product.cost * qty`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.cost * self.qty
    }
}

/// Renderable cart with derived totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub items: Vec<EnrichedCartItem>,
    pub total: Price,
    pub item_count: u32,
}

impl CartView {
    /// Build the view for `entries` against `catalog`.
    #[must_use]
    pub fn build(entries: &[CartEntry], catalog: &[Product]) -> Self {
        let items = reconcile(entries, catalog);
        let total = total_cost(&items);
        let item_count = items.iter().map(|item| item.qty.get()).sum();
        Self {
            items,
            total,
            item_count,
        }
    }

    /// Whether there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Join `entries` against `catalog`, preserving entry order.
///
/// Entries whose product is not in the catalog are dropped from the output
/// and logged. This is expected while the initial catalog load is still
/// running, so an empty catalog logs nothing.
#[must_use]
pub fn reconcile(entries: &[CartEntry], catalog: &[Product]) -> Vec<EnrichedCartItem> {
    let index: HashMap<&ProductId, &Product> = catalog.iter().map(|p| (&p.id, p)).collect();

    entries
        .iter()
        .filter_map(|entry| {
            let Some(product) = index.get(&entry.product_id) else {
                if !catalog.is_empty() {
                    warn!(
                        product_id = %entry.product_id,
                        "Cart entry references a product missing from the catalog"
                    );
                }
                return None;
            };
            Some(EnrichedCartItem {
                product: (*product).clone(),
                qty: entry.qty,
            })
        })
        .collect()
}

/// Sum of `cost * qty` over `items`. Zero for an empty cart.
#[must_use]
pub fn total_cost(items: &[EnrichedCartItem]) -> Price {
    items.iter().map(EnrichedCartItem::line_total).sum()
}

/// Whether exactly one entry has `product_id`.
///
/// More than one match breaks the one-entry-per-product rule; it is logged
/// and reported as `false`.
#[must_use]
pub fn is_in_cart(entries: &[CartEntry], product_id: &ProductId) -> bool {
    match entries.iter().filter(|e| &e.product_id == product_id).count() {
        1 => true,
        0 => false,
        matches => {
            warn!(
                product_id = %product_id,
                matches,
                "Cart holds duplicate entries for one product"
            );
            false
        }
    }
}
