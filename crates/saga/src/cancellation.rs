//! The order-cancellation saga (spec §4.5).

use std::sync::Arc;

use bus::{LogPublisher, MessageBus, Severity, routing};
use common::{OrderId, SagaId};
use domain::{CancellationSagaState, FabricationStatus, Order};
use repository::Repository;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{Result, SagaError};
use crate::registry::SagaRegistry;

/// Inbound events the cancellation saga reacts to (spec §4.5 "Event").
#[derive(Debug, Clone)]
pub enum CancellationEvent {
    FabricationCanceled,
    Refunded,
    RefundFailed { reason: String },
}

fn next_state(current: CancellationSagaState, event: &CancellationEvent) -> Option<CancellationSagaState> {
    use CancellationEvent::*;
    use CancellationSagaState::*;

    match (current, event) {
        (Canceling, FabricationCanceled) => Some(Refunding),
        (Refunding, Refunded) => Some(Canceled),
        (Refunding, RefundFailed { .. }) => Some(CancelPendingRefund),
        _ => None,
    }
}

/// Admission check for cancellation (spec §4.5): only orders whose
/// creation has been confirmed and whose fabrication is still in flight
/// (not yet terminal, not already canceling) may be cancelled.
pub fn admits_cancellation(order: &Order) -> bool {
    order.can_be_cancelled()
}

pub struct CancellationSaga<R> {
    repository: Arc<R>,
    bus: Arc<dyn MessageBus>,
    registry: Arc<SagaRegistry>,
    logger: LogPublisher,
}

impl<R: Repository> CancellationSaga<R> {
    pub fn new(repository: Arc<R>, bus: Arc<dyn MessageBus>, registry: Arc<SagaRegistry>) -> Self {
        let logger = LogPublisher::new(bus.clone());
        Self {
            repository,
            bus,
            registry,
            logger,
        }
    }

    /// Admits and starts a cancellation for `order_id`: mints a `saga_id`,
    /// persists the saga record and the order's `Canceling` fabrication
    /// status, then publishes `cmd.cancel_fabrication`.
    ///
    /// Returns [`SagaError::AdmissionViolation`] if the order is not
    /// currently eligible.
    pub async fn start(&self, order_id: OrderId) -> Result<SagaId> {
        let order = self.repository.get_order(order_id).await?;
        if !admits_cancellation(&order) {
            self.logger
                .error("cancellation admission violation", json!({"order_id": order_id.as_i64()}))
                .await;
            return Err(SagaError::AdmissionViolation(order_id));
        }

        let saga_id = SagaId::new();
        self.registry.start_cancellation(saga_id);
        self.logger
            .info("cancellation saga started", json!({"order_id": order_id.as_i64(), "saga_id": saga_id.as_uuid()}))
            .await;

        self.repository
            .create_cancel_saga(saga_id, order_id, CancellationSagaState::Canceling)
            .await?;
        self.repository
            .update_fabrication_status(order_id, FabricationStatus::Canceling, None)
            .await?;

        self.bus
            .publish(
                routing::exchange::COMMAND,
                routing::CMD_CANCEL_FABRICATION,
                &json!({"order_id": order_id.as_i64(), "saga_id": saga_id.as_uuid()}),
            )
            .await?;

        Ok(saga_id)
    }

    /// Applies one event, serialized per-saga via the registry lock.
    pub async fn handle_event(&self, saga_id: SagaId, event: CancellationEvent) -> Result<()> {
        let Some(lock) = self.registry.cancellation_lock(saga_id) else {
            warn!(%saga_id, "event for unknown or already-terminated cancellation saga, dropping");
            metrics::counter!("cancellation_ingress_dropped").increment(1);
            return Ok(());
        };
        let _guard = lock.lock().await;

        let record = self.repository.get_cancel_saga(saga_id).await?;
        if record.is_terminal() {
            debug!(%saga_id, state = %record.state, "cancellation saga already terminal, dropping duplicate event");
            self.registry.complete_cancellation(saga_id);
            return Ok(());
        }

        let Some(next) = next_state(record.state, &event) else {
            debug!(%saga_id, current = %record.state, "event does not apply to current cancellation state, ignoring");
            return Ok(());
        };

        self.enter_state(saga_id, record.order_id, next, &event).await?;
        metrics::counter!("cancellation_saga_transitions_total").increment(1);

        if next.is_terminal() {
            self.registry.complete_cancellation(saga_id);
            let severity = match next {
                CancellationSagaState::CancelPendingRefund => Severity::Error,
                _ => Severity::Info,
            };
            self.logger
                .log(severity, "cancellation saga reached terminal state", json!({
                    "saga_id": saga_id.as_uuid(),
                    "order_id": record.order_id.as_i64(),
                    "state": next.to_string(),
                }))
                .await;
        }

        Ok(())
    }

    async fn enter_state(
        &self,
        saga_id: SagaId,
        order_id: OrderId,
        state: CancellationSagaState,
        event: &CancellationEvent,
    ) -> Result<()> {
        match state {
            CancellationSagaState::Refunding => {
                self.repository
                    .update_cancel_saga(saga_id, CancellationSagaState::Refunding, None)
                    .await?;

                let order = self.repository.get_order(order_id).await?;
                self.bus
                    .publish(
                        routing::exchange::COMMAND,
                        routing::CMD_REFUND,
                        &json!({
                            "order_id": order_id.as_i64(),
                            "user_id": order.client_id.as_i64(),
                            "saga_id": saga_id.as_uuid(),
                        }),
                    )
                    .await?;
            }
            CancellationSagaState::Canceled => {
                self.repository
                    .update_fabrication_status(order_id, FabricationStatus::Canceled, None)
                    .await?;
                self.repository
                    .update_cancel_saga(saga_id, CancellationSagaState::Canceled, None)
                    .await?;
            }
            CancellationSagaState::CancelPendingRefund => {
                let reason = match event {
                    CancellationEvent::RefundFailed { reason } => reason.clone(),
                    _ => unreachable!("CancelPendingRefund is only entered via RefundFailed"),
                };
                self.repository
                    .update_fabrication_status(order_id, FabricationStatus::CancelPendingRefund, None)
                    .await?;
                self.repository
                    .update_cancel_saga(saga_id, CancellationSagaState::CancelPendingRefund, Some(reason))
                    .await?;
            }
            CancellationSagaState::Canceling => {
                unreachable!("Canceling is only entered at admission, via start()")
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus::InMemoryBus;
    use common::ClientId;
    use domain::{CreationStatus, FabricationStatus};
    use repository::InMemoryRepository;

    async fn new_saga() -> (CancellationSaga<InMemoryRepository>, Arc<InMemoryRepository>, Arc<InMemoryBus>) {
        let repository = Arc::new(InMemoryRepository::new());
        let bus = Arc::new(InMemoryBus::new());
        let registry = Arc::new(SagaRegistry::new());
        let saga = CancellationSaga::new(repository.clone(), bus.clone(), registry);
        (saga, repository, bus)
    }

    async fn confirmed_in_flight_order(repository: &InMemoryRepository) -> OrderId {
        let order = repository.create_order(ClientId::new(1), 1, 0, "x".into(), None).await.unwrap();
        repository.update_creation_status(order.id, CreationStatus::Confirmed).await.unwrap();
        repository
            .update_fabrication_status(order.id, FabricationStatus::InProgress, None)
            .await
            .unwrap();
        order.id
    }

    #[tokio::test]
    async fn start_rejects_orders_that_are_not_admissible() {
        let (saga, repository, _bus) = new_saga().await;
        let order = repository.create_order(ClientId::new(1), 1, 0, "x".into(), None).await.unwrap();

        let result = saga.start(order.id).await;
        assert!(matches!(result, Err(SagaError::AdmissionViolation(_))));
    }

    #[tokio::test]
    async fn start_admits_confirmed_in_flight_order_and_publishes_cancel_command() {
        let (saga, repository, bus) = new_saga().await;
        let order_id = confirmed_in_flight_order(&repository).await;

        let saga_id = saga.start(order_id).await.unwrap();

        let order = repository.get_order(order_id).await.unwrap();
        assert_eq!(order.fabrication_status, FabricationStatus::Canceling);

        let record = repository.get_cancel_saga(saga_id).await.unwrap();
        assert_eq!(record.state, CancellationSagaState::Canceling);

        assert_eq!(bus.published_to(routing::CMD_CANCEL_FABRICATION).len(), 1);
    }

    #[tokio::test]
    async fn refund_ok_reaches_canceled() {
        let (saga, repository, bus) = new_saga().await;
        let order_id = confirmed_in_flight_order(&repository).await;
        let saga_id = saga.start(order_id).await.unwrap();

        saga.handle_event(saga_id, CancellationEvent::FabricationCanceled).await.unwrap();
        assert_eq!(bus.published_to(routing::CMD_REFUND).len(), 1);

        saga.handle_event(saga_id, CancellationEvent::Refunded).await.unwrap();

        let order = repository.get_order(order_id).await.unwrap();
        assert_eq!(order.fabrication_status, FabricationStatus::Canceled);
        let record = repository.get_cancel_saga(saga_id).await.unwrap();
        assert_eq!(record.state, CancellationSagaState::Canceled);
        assert!(saga.registry.cancellation_lock(saga_id).is_none());
    }

    #[tokio::test]
    async fn refund_failure_lands_on_cancel_pending_refund_with_reason() {
        let (saga, repository, _bus) = new_saga().await;
        let order_id = confirmed_in_flight_order(&repository).await;
        let saga_id = saga.start(order_id).await.unwrap();

        saga.handle_event(saga_id, CancellationEvent::FabricationCanceled).await.unwrap();
        saga.handle_event(
            saga_id,
            CancellationEvent::RefundFailed { reason: "refund service unreachable".into() },
        )
        .await
        .unwrap();

        let order = repository.get_order(order_id).await.unwrap();
        assert_eq!(order.fabrication_status, FabricationStatus::CancelPendingRefund);

        let record = repository.get_cancel_saga(saga_id).await.unwrap();
        assert_eq!(record.state, CancellationSagaState::CancelPendingRefund);
        assert_eq!(record.error.as_deref(), Some("refund service unreachable"));
    }

    #[tokio::test]
    async fn event_for_unknown_saga_is_dropped_without_error() {
        let (saga, _repository, _bus) = new_saga().await;
        let result = saga.handle_event(SagaId::new(), CancellationEvent::Refunded).await;
        assert!(result.is_ok());
    }
}
