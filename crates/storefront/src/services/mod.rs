//! Storefront engine services.
//!
//! # Services
//!
//! - `reconcile` - Pure join of cart entries with the catalog, plus totals
//! - `cart` - Authenticated add/update against the remote cart
//! - `debounce` - Keystroke to query-intent coordinator
//! - `search` - Catalog loading and sequence-tagged search
//! - `account` - Registration

pub mod account;
pub mod cart;
pub mod debounce;
pub mod reconcile;
pub mod search;

pub use account::AccountFlow;
pub use cart::{AddOptions, CartWorkflow};
pub use debounce::{Debouncer, SearchQuery};
pub use reconcile::{CartView, EnrichedCartItem, is_in_cart, reconcile, total_cost};
pub use search::SearchCoordinator;
