//! Two concurrent maps, each guarding the in-flight saga for one
//! correlation key (spec §4.3).
//!
//! Persisted saga state lives in `repository` (the order row's
//! `creation_status`, and the `cancel_saga` table); the registry only
//! tracks which keys currently have an active saga and hands out a
//! per-key lock so concurrent deliveries for the same order or saga id
//! serialize instead of racing (spec §5).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::{OrderId, SagaId};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

type KeyLock = Arc<AsyncMutex<()>>;

/// Registry of in-flight confirmation and cancellation sagas.
#[derive(Default)]
pub struct SagaRegistry {
    confirmations: Mutex<HashMap<OrderId, KeyLock>>,
    cancellations: Mutex<HashMap<SagaId, KeyLock>>,
}

impl SagaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a confirmation saga for `order_id`. A start for an
    /// already-active key is a no-op, logged at debug (spec §4.3).
    pub fn start_confirmation(&self, order_id: OrderId) {
        let mut confirmations = self.confirmations.lock().unwrap();
        if confirmations.contains_key(&order_id) {
            debug!(%order_id, "confirmation saga already active, ignoring duplicate start");
            return;
        }
        confirmations.insert(order_id, Arc::new(AsyncMutex::new(())));
    }

    /// Returns the correlation lock for `order_id`, if a confirmation
    /// saga is currently registered for it.
    pub fn confirmation_lock(&self, order_id: OrderId) -> Option<KeyLock> {
        self.confirmations.lock().unwrap().get(&order_id).cloned()
    }

    /// Unregisters the confirmation saga for `order_id`; called once it
    /// reaches a terminal state.
    pub fn complete_confirmation(&self, order_id: OrderId) {
        self.confirmations.lock().unwrap().remove(&order_id);
    }

    pub fn start_cancellation(&self, saga_id: SagaId) {
        let mut cancellations = self.cancellations.lock().unwrap();
        if cancellations.contains_key(&saga_id) {
            debug!(%saga_id, "cancellation saga already active, ignoring duplicate start");
            return;
        }
        cancellations.insert(saga_id, Arc::new(AsyncMutex::new(())));
    }

    pub fn cancellation_lock(&self, saga_id: SagaId) -> Option<KeyLock> {
        self.cancellations.lock().unwrap().get(&saga_id).cloned()
    }

    pub fn complete_cancellation(&self, saga_id: SagaId) {
        self.cancellations.lock().unwrap().remove(&saga_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_confirmation_registers_a_lock() {
        let registry = SagaRegistry::new();
        let order_id = OrderId::new(1);
        assert!(registry.confirmation_lock(order_id).is_none());

        registry.start_confirmation(order_id);
        assert!(registry.confirmation_lock(order_id).is_some());
    }

    #[test]
    fn duplicate_start_is_a_no_op() {
        let registry = SagaRegistry::new();
        let order_id = OrderId::new(1);

        registry.start_confirmation(order_id);
        let first = registry.confirmation_lock(order_id).unwrap();
        registry.start_confirmation(order_id);
        let second = registry.confirmation_lock(order_id).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn complete_confirmation_unregisters_the_key() {
        let registry = SagaRegistry::new();
        let order_id = OrderId::new(1);

        registry.start_confirmation(order_id);
        registry.complete_confirmation(order_id);
        assert!(registry.confirmation_lock(order_id).is_none());
    }

    #[test]
    fn cancellation_keys_are_tracked_independently_of_confirmation_keys() {
        let registry = SagaRegistry::new();
        let saga_id = SagaId::new();

        registry.start_cancellation(saga_id);
        assert!(registry.cancellation_lock(saga_id).is_some());

        registry.complete_cancellation(saga_id);
        assert!(registry.cancellation_lock(saga_id).is_none());
    }
}
