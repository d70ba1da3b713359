//! State-based follow-up actions.
//!
//! After every reducer transition the wrapper asks this dispatcher what the
//! system should do next, purely as a function of the new state and the
//! previous cache status. The previous status is private, sequential state -
//! it is what prevents re-triggering a fetch or sync on every notification
//! while the status sits unchanged.

use shopping_cart_core::action::CartAction;
use shopping_cart_core::state::ShoppingCartState;
use shopping_cart_core::status::CacheStatus;
use smallvec::SmallVec;

/// Follow-up actions produced by one state inspection.
pub type FollowUpActions = SmallVec<[CartAction; 4]>;

/// Decides follow-up actions from cache-status transitions.
pub struct StateBasedDispatcher {
    last_cache_status: Option<CacheStatus>,
}

impl StateBasedDispatcher {
    /// A dispatcher that has seen no state yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_cache_status: None,
        }
    }

    /// Inspect a state and return the actions to enqueue, in order:
    ///
    /// 1. A cart newly `Fresh` starts the initial load.
    /// 2. A cart newly `Invalid` with nothing queued starts a sync.
    /// 3. A settled `Valid` cart with queued mutations replays them FIFO,
    ///    clearing the queue first.
    pub fn follow_up_actions(&mut self, state: &ShoppingCartState) -> FollowUpActions {
        let status = state.cache_status;
        let mut next = FollowUpActions::new();

        if status == CacheStatus::Fresh && self.last_cache_status != Some(CacheStatus::Fresh) {
            tracing::debug!("triggering fetch of initial cart");
            next.push(CartAction::FetchInitialResponseCart);
            next.push(CartAction::GetCartFromServer);
        }

        if state.queued_actions.is_empty()
            && status == CacheStatus::Invalid
            && self.last_cache_status != Some(CacheStatus::Invalid)
        {
            tracing::debug!("triggering sync of cart to server");
            next.push(CartAction::RequestUpdatedResponseCart);
            next.push(CartAction::SyncCartToServer);
        }

        if !state.queued_actions.is_empty() && status == CacheStatus::Valid {
            tracing::debug!(
                count = state.queued_actions.len(),
                "replaying queued cart actions"
            );
            next.push(CartAction::ClearQueuedActions);
            next.extend(state.queued_actions.iter().cloned());
        }

        self.last_cache_status = Some(status);
        next
    }
}

impl Default for StateBasedDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(status: CacheStatus) -> ShoppingCartState {
        let mut state = ShoppingCartState::initial();
        state.cache_status = status;
        state
    }

    #[test]
    fn fresh_cart_triggers_the_initial_load_once() {
        let mut dispatcher = StateBasedDispatcher::new();
        let state = state_with(CacheStatus::Fresh);

        let first = dispatcher.follow_up_actions(&state);
        assert_eq!(
            first.as_slice(),
            [CartAction::FetchInitialResponseCart, CartAction::GetCartFromServer]
        );

        // Status unchanged: no re-trigger.
        let second = dispatcher.follow_up_actions(&state);
        assert!(second.is_empty());
    }

    #[test]
    fn newly_invalid_cart_with_empty_queue_triggers_a_sync() {
        let mut dispatcher = StateBasedDispatcher::new();
        let _ = dispatcher.follow_up_actions(&state_with(CacheStatus::Valid));

        let actions = dispatcher.follow_up_actions(&state_with(CacheStatus::Invalid));
        assert_eq!(
            actions.as_slice(),
            [CartAction::RequestUpdatedResponseCart, CartAction::SyncCartToServer]
        );

        let again = dispatcher.follow_up_actions(&state_with(CacheStatus::Invalid));
        assert!(again.is_empty());
    }

    #[test]
    fn invalid_cart_with_queued_actions_does_not_sync() {
        let mut dispatcher = StateBasedDispatcher::new();
        let mut state = state_with(CacheStatus::Invalid);
        state.queued_actions.push(CartAction::RemoveCoupon);
        assert!(dispatcher.follow_up_actions(&state).is_empty());
    }

    #[test]
    fn valid_cart_replays_queued_actions_in_order_after_clearing() {
        let mut dispatcher = StateBasedDispatcher::new();
        let mut state = state_with(CacheStatus::Valid);
        state.queued_actions.push(CartAction::ApplyCoupon("X".into()));
        state.queued_actions.push(CartAction::RemoveCoupon);

        let actions = dispatcher.follow_up_actions(&state);
        assert_eq!(
            actions.as_slice(),
            [
                CartAction::ClearQueuedActions,
                CartAction::ApplyCoupon("X".into()),
                CartAction::RemoveCoupon,
            ]
        );
    }

    #[test]
    fn error_status_triggers_nothing() {
        let mut dispatcher = StateBasedDispatcher::new();
        assert!(dispatcher.follow_up_actions(&state_with(CacheStatus::Error)).is_empty());
    }
}
