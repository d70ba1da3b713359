//! Entry point: one client per connector, one actor per cart key.
//!
//! The client owns the registry of per-key wrappers. Asking for a cart key's
//! manager lazily spawns that key's actor; asking again reuses it, so all
//! consumers of a key share one serialized cart. Asking with no key at all
//! returns the shared no-op manager.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use shopping_cart_core::cart::CartKey;
use shopping_cart_core::connector::CartConnector;

use crate::manager::ShoppingCartManager;
use crate::subscription::Subscription;
use crate::wrapper::ShoppingCartManagerWrapper;

/// Registry of cart managers over one [`CartConnector`].
pub struct ShoppingCartManagerClient {
    connector: Arc<dyn CartConnector>,
    wrappers: Mutex<HashMap<CartKey, Arc<ShoppingCartManagerWrapper>>>,
    noop_manager: ShoppingCartManager,
}

impl ShoppingCartManagerClient {
    /// Create a client over a server connector.
    #[must_use]
    pub fn new(connector: Arc<dyn CartConnector>) -> Self {
        Self {
            connector,
            wrappers: Mutex::new(HashMap::new()),
            noop_manager: ShoppingCartManager::noop(),
        }
    }

    /// The manager for a cart key, or the no-op manager when no key is
    /// configured yet.
    ///
    /// The first request for a key spawns its actor and schedules the initial
    /// load; this must therefore be called from within a tokio runtime.
    pub fn for_cart_key(&self, cart_key: Option<&CartKey>) -> ShoppingCartManager {
        match cart_key {
            Some(cart_key) => self.wrapper_for(cart_key).current_manager(),
            None => self.noop_manager.clone(),
        }
    }

    /// Register a callback for every state change of a cart key.
    ///
    /// Spawns the key's actor if it does not exist yet, exactly like
    /// [`for_cart_key`](Self::for_cart_key).
    pub fn subscribe_to_cart_key(
        &self,
        cart_key: &CartKey,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Subscription {
        self.wrapper_for(cart_key).subscriptions().subscribe(callback)
    }

    fn wrapper_for(&self, cart_key: &CartKey) -> Arc<ShoppingCartManagerWrapper> {
        let mut wrappers = self
            .wrappers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(wrapper) = wrappers.get(cart_key) {
            return Arc::clone(wrapper);
        }
        tracing::debug!(cart_key = %cart_key, "creating cart manager");
        let wrapper = ShoppingCartManagerWrapper::spawn(cart_key.clone(), Arc::clone(&self.connector));
        wrappers.insert(cart_key.clone(), Arc::clone(&wrapper));
        wrapper
    }
}
