//! Per-cart-key actor owning the reducer state.
//!
//! Each cart key gets exactly one wrapper. The wrapper spawns an actor task
//! that owns the [`ShoppingCartState`] outright; every dispatch, follow-up
//! action and server response flows through a single unbounded channel into
//! that task, so actions for one cart are strictly serialized without locks
//! around the state itself. After every transition the actor publishes an
//! immutable snapshot that [`current_manager`](ShoppingCartManagerWrapper::current_manager)
//! memoizes by version.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use shopping_cart_core::cart::{CartKey, ResponseCart};
use shopping_cart_core::connector::CartConnector;
use shopping_cart_core::reducer::shopping_cart_reducer;
use shopping_cart_core::state::ShoppingCartState;
use tokio::sync::{mpsc, oneshot};

use crate::dispatcher::StateBasedDispatcher;
use crate::last_valid::LastValidCartCache;
use crate::manager::{ManagerSnapshot, ShoppingCartManager};
use crate::promises::ActionPromises;
use crate::subscription::SubscriptionManager;
use crate::sync::{CartInitMiddleware, CartSyncMiddleware, RequestFence};

/// One dispatch into a cart actor: the action, plus an optional sender that
/// resolves with the settled cart once the action's effects have landed.
pub(crate) struct DispatchMessage {
    pub(crate) action: shopping_cart_core::action::CartAction,
    pub(crate) resolver: Option<oneshot::Sender<ResponseCart>>,
}

impl DispatchMessage {
    /// A dispatch nobody is waiting on (follow-ups, server responses).
    pub(crate) fn internal(action: shopping_cart_core::action::CartAction) -> Self {
        Self {
            action,
            resolver: None,
        }
    }
}

/// Snapshot the actor publishes after each transition.
struct WrapperShared {
    state: ShoppingCartState,
    last_valid_cart: ResponseCart,
    version: u64,
}

/// Owns the actor for one cart key and memoizes its manager facade.
pub(crate) struct ShoppingCartManagerWrapper {
    cart_key: CartKey,
    action_tx: mpsc::UnboundedSender<DispatchMessage>,
    shared: Arc<RwLock<WrapperShared>>,
    subscriptions: SubscriptionManager,
    manager_cache: Mutex<Option<(u64, ShoppingCartManager)>>,
}

impl ShoppingCartManagerWrapper {
    /// Create the wrapper and spawn its actor task.
    ///
    /// Must be called from within a tokio runtime. The actor immediately
    /// schedules the initial fetch; it exits when the wrapper (and every
    /// manager holding its sender) has been dropped.
    pub(crate) fn spawn(cart_key: CartKey, connector: Arc<dyn CartConnector>) -> Arc<Self> {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let state = ShoppingCartState::initial();
        let shared = Arc::new(RwLock::new(WrapperShared {
            last_valid_cart: state.response_cart.clone(),
            state,
            version: 0,
        }));
        let subscriptions = SubscriptionManager::new(cart_key.clone());
        let fence = RequestFence::new();

        tokio::spawn(run_cart_actor(
            cart_key.clone(),
            Arc::clone(&connector),
            fence,
            action_tx.clone(),
            action_rx,
            Arc::clone(&shared),
            subscriptions.clone(),
        ));

        Arc::new(Self {
            cart_key,
            action_tx,
            shared,
            subscriptions,
            manager_cache: Mutex::new(None),
        })
    }

    /// The manager facade for the current snapshot.
    ///
    /// Managers are memoized by snapshot version: while no transition has
    /// happened, repeated calls return clones of the same underlying manager,
    /// so [`ShoppingCartManager::same_snapshot`] lets consumers skip
    /// re-rendering.
    pub(crate) fn current_manager(&self) -> ShoppingCartManager {
        let mut cache = self
            .manager_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let shared = self.shared.read().unwrap_or_else(PoisonError::into_inner);
        if let Some((version, manager)) = cache.as_ref() {
            if *version == shared.version {
                return manager.clone();
            }
        }

        let manager = ShoppingCartManager::active(
            ManagerSnapshot {
                response_cart: shared.last_valid_cart.clone(),
                cache_status: shared.state.cache_status,
                coupon_status: shared.state.coupon_status,
                loading_error: shared.state.loading_error.clone(),
                loading_error_type: shared.state.loading_error_type,
                is_pending_update: shared.state.is_pending_update(),
            },
            self.cart_key.clone(),
            self.action_tx.clone(),
            self.subscriptions.clone(),
        );
        *cache = Some((shared.version, manager.clone()));
        manager
    }

    pub(crate) fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }
}

/// The actor loop. Processes locally queued follow-up actions before pulling
/// from the channel, so a transition's consequences land before any
/// concurrently dispatched action.
#[allow(clippy::too_many_lines)]
async fn run_cart_actor(
    cart_key: CartKey,
    connector: Arc<dyn CartConnector>,
    fence: RequestFence,
    action_tx: mpsc::UnboundedSender<DispatchMessage>,
    mut action_rx: mpsc::UnboundedReceiver<DispatchMessage>,
    shared: Arc<RwLock<WrapperShared>>,
    subscriptions: SubscriptionManager,
) {
    let init_middleware = CartInitMiddleware::new(
        cart_key.clone(),
        Arc::clone(&connector),
        fence.clone(),
        action_tx.clone(),
    );
    let sync_middleware = CartSyncMiddleware::new(
        cart_key.clone(),
        Arc::clone(&connector),
        fence.clone(),
        action_tx,
    );

    let mut state = ShoppingCartState::initial();
    let mut dispatcher = StateBasedDispatcher::new();
    let mut last_valid = LastValidCartCache::new(&state);
    let mut promises = ActionPromises::new();
    let mut inbox: VecDeque<shopping_cart_core::action::CartAction> = VecDeque::new();

    tracing::debug!(cart_key = %cart_key, "cart actor started");

    // Kick off the initial load for the fresh state.
    inbox.extend(dispatcher.follow_up_actions(&state));

    loop {
        let message = if let Some(action) = inbox.pop_front() {
            DispatchMessage::internal(action)
        } else {
            match action_rx.recv().await {
                Some(message) => message,
                None => break,
            }
        };

        if let Some(resolver) = message.resolver {
            promises.add(resolver);
        }
        let action = message.action;

        tracing::trace!(cart_key = %cart_key, kind = action.kind(), "processing cart action");
        metrics::counter!("cart_actions_total", "kind" => action.kind()).increment(1);

        // Middleware inspect the pre-transition state; their status guards
        // make duplicated triggers harmless.
        init_middleware.on_action(&action, &state);
        sync_middleware.on_action(&action, &state);

        if !fence.admits(&action) {
            continue;
        }

        let reduce_started = std::time::Instant::now();
        let next = shopping_cart_reducer(&state, &action);
        metrics::histogram!("cart_reducer_duration_seconds")
            .record(reduce_started.elapsed().as_secs_f64());
        let changed = next != state;
        state = next;

        inbox.extend(dispatcher.follow_up_actions(&state));
        last_valid.update(&state);

        // Callers are only answered once the cart is truly settled: valid,
        // nothing queued, and no follow-up or already-dispatched action still
        // waiting to run.
        if inbox.is_empty() && action_rx.is_empty() {
            promises.resolve_if_valid(&state);
        }

        if changed {
            {
                let mut snapshot = shared.write().unwrap_or_else(PoisonError::into_inner);
                snapshot.state = state.clone();
                snapshot.last_valid_cart = last_valid.cart().clone();
                snapshot.version += 1;
            }
            subscriptions.notify_subscribers();
        }
    }

    tracing::debug!(cart_key = %cart_key, "cart actor stopped");
}
