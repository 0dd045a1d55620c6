//! Application state shared across the engine.
//!
//! Each slot has a single writer: the catalog cache is written by
//! [`SearchCoordinator`](crate::services::SearchCoordinator), the cart by
//! the mutation path in [`Storefront`](crate::Storefront), and the session by
//! login/logout. Locks are never held across an `.await`.

use std::sync::{Arc, PoisonError, RwLock};

use qkart_core::{CartEntry, Credential};
use tokio::sync::watch;

use crate::catalog::CatalogCache;
use crate::config::{ClientConfig, StoredSession};
use crate::notify::Notifier;

/// The signed-in user, if any.
#[derive(Debug, Clone, Default)]
pub struct Session {
    credential: Option<Credential>,
    username: Option<String>,
}

impl Session {
    /// A signed-in session.
    #[must_use]
    pub const fn new(credential: Credential, username: Option<String>) -> Self {
        Self {
            credential: Some(credential),
            username,
        }
    }

    /// The bearer credential, if signed in.
    #[must_use]
    pub const fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.credential.is_some()
    }

    /// Forget the credential and username.
    pub fn logout(&mut self) {
        self.credential = None;
        self.username = None;
    }
}

impl From<&StoredSession> for Session {
    fn from(stored: &StoredSession) -> Self {
        Self::new(Credential::from(stored.token.clone()), stored.username.clone())
    }
}

/// Application state shared by every component.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ClientConfig,
    catalog: RwLock<CatalogCache>,
    cart: RwLock<Vec<CartEntry>>,
    session: RwLock<Session>,
    notifier: Notifier,
    /// Sequence number of the last settled search.
    searches: watch::Sender<u64>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The session is resumed from `config.stored_session` when present.
    #[must_use]
    pub fn new(config: ClientConfig, notifier: Notifier) -> Self {
        let session = config
            .stored_session
            .as_ref()
            .map(Session::from)
            .unwrap_or_default();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog: RwLock::new(CatalogCache::new()),
                cart: RwLock::new(Vec::new()),
                session: RwLock::new(session),
                notifier,
                searches: watch::Sender::new(0),
            }),
        }
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get a reference to the notification sender.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Read the catalog cache.
    pub fn with_catalog<R>(&self, f: impl FnOnce(&CatalogCache) -> R) -> R {
        let cache = self
            .inner
            .catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&*cache)
    }

    /// Modify the catalog cache.
    pub fn update_catalog<R>(&self, f: impl FnOnce(&mut CatalogCache) -> R) -> R {
        let mut cache = self
            .inner
            .catalog
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut *cache)
    }

    /// Announce that the search tagged `seq` has settled.
    pub fn publish_search(&self, seq: u64) {
        self.inner.searches.send_replace(seq);
    }

    /// Watch for settled searches.
    #[must_use]
    pub fn subscribe_searches(&self) -> watch::Receiver<u64> {
        self.inner.searches.subscribe()
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Snapshot of the local cart.
    #[must_use]
    pub fn cart(&self) -> Vec<CartEntry> {
        self.inner
            .cart
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the local cart with the server's view.
    pub fn replace_cart(&self, entries: Vec<CartEntry>) {
        *self
            .inner
            .cart
            .write()
            .unwrap_or_else(PoisonError::into_inner) = entries;
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Snapshot of the current session.
    #[must_use]
    pub fn session(&self) -> Session {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The stored credential, if any.
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.session().credential
    }

    /// Start a new session.
    pub fn set_session(&self, session: Session) {
        *self
            .inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// End the session and clear the local cart.
    pub fn logout(&self) {
        self.inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .logout();
        self.replace_cart(Vec::new());
    }
}
