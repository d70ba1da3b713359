//! Publish/subscribe registry for cart change notifications.
//!
//! Consumers subscribe to a cart key and are called (with no arguments) after
//! every state transition; they re-read the memoized manager to see what
//! changed. Unsubscribing removes exactly one callback and leaves the rest.

use std::sync::{Arc, Mutex, PoisonError, Weak};

type Callback = Arc<dyn Fn() + Send + Sync>;

struct Registry {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

/// Subscription registry for one cart key.
#[derive(Clone)]
pub struct SubscriptionManager {
    cart_key: String,
    registry: Arc<Mutex<Registry>>,
}

impl SubscriptionManager {
    /// Create an empty registry, labeled with the cart key for logging.
    #[must_use]
    pub fn new(cart_key: impl std::fmt::Display) -> Self {
        Self {
            cart_key: cart_key.to_string(),
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                callbacks: Vec::new(),
            })),
        }
    }

    /// Register a callback to run after every state change.
    ///
    /// The returned [`Subscription`] removes exactly this callback when
    /// [`Subscription::unsubscribe`] is called; dropping it without
    /// unsubscribing leaves the callback registered for the life of the cart.
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        let mut registry = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.push((id, Arc::new(callback)));
        tracing::debug!(cart_key = %self.cart_key, subscriber_id = id, "adding subscriber");

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Invoke every registered callback.
    ///
    /// Callbacks run outside the registry lock, so a callback may subscribe
    /// or unsubscribe without deadlocking.
    pub fn notify_subscribers(&self) {
        let callbacks: Vec<Callback> = {
            let registry = self
                .registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            registry.callbacks.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        tracing::trace!(
            cart_key = %self.cart_key,
            count = callbacks.len(),
            "notifying subscribers"
        );
        for callback in callbacks {
            callback();
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .len()
    }

    /// True when nothing is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle for removing a registered callback.
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// A subscription attached to nothing, returned by the no-op manager.
    #[must_use]
    pub const fn detached() -> Self {
        Self {
            id: 0,
            registry: Weak::new(),
        }
    }

    /// Remove this subscription's callback. Other subscribers are unaffected.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.callbacks.retain(|(id, _)| *id != self.id);
        }
    }
}
