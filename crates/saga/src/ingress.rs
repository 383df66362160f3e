//! Wires inbound bus routing keys onto saga transitions (spec §4.4–§4.6,
//! §6).
//!
//! Each [`MessageHandler`] here does the minimal payload parsing needed to
//! turn a message into a saga event, then hands off; the sagas themselves
//! own admission, ordering and idempotency.

use std::sync::Arc;

use async_trait::async_trait;
use bus::{IncomingMessage, MessageHandler};
use common::{OrderId, SagaId};
use domain::CreationStatus;
use repository::Repository;
use tracing::warn;

use crate::cancellation::{CancellationEvent, CancellationSaga};
use crate::confirmation::{ConfirmationEvent, ConfirmationSaga};

fn order_id_of(message: &IncomingMessage) -> Option<OrderId> {
    message.payload.get("order_id").and_then(|v| v.as_i64()).map(OrderId::new)
}

fn saga_id_of(message: &IncomingMessage) -> Option<SagaId> {
    message
        .payload
        .get("saga_id")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
        .map(SagaId::from_uuid)
}

fn status_of(message: &IncomingMessage) -> Option<&str> {
    message.payload.get("status").and_then(|v| v.as_str())
}

fn reason_of(message: &IncomingMessage) -> String {
    message
        .payload
        .get("reason")
        .and_then(|v| v.as_str())
        .unwrap_or("no reason given")
        .to_string()
}

/// `payment.result` → confirmation saga `PaymentAccepted`/`PaymentRejected`.
pub struct PaymentResultIngress<R> {
    saga: Arc<ConfirmationSaga<R>>,
}

impl<R: Repository + 'static> PaymentResultIngress<R> {
    pub fn new(saga: Arc<ConfirmationSaga<R>>) -> Self {
        Self { saga }
    }
}

#[async_trait]
impl<R: Repository + 'static> MessageHandler for PaymentResultIngress<R> {
    async fn handle(&self, message: IncomingMessage) -> bus::Result<()> {
        let Some(order_id) = order_id_of(&message) else {
            warn!(routing_key = %message.routing_key, "payment.result missing order_id, dropping");
            return Ok(());
        };

        let event = match status_of(&message) {
            Some("paid") => ConfirmationEvent::PaymentAccepted,
            Some("not_paid") => ConfirmationEvent::PaymentRejected,
            other => {
                warn!(%order_id, status = ?other, "payment.result has unrecognized status, dropping");
                return Ok(());
            }
        };

        self.saga
            .handle_event(order_id, event)
            .await
            .map_err(|err| bus::BusError::Handler(err.to_string()))
    }
}

/// `payment.paid` / `payment.failed` — legacy topics that update
/// `creation_status` directly, bypassing the saga entirely (spec §6).
pub struct LegacyPaymentIngress<R> {
    repository: Arc<R>,
}

impl<R: Repository + 'static> LegacyPaymentIngress<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    async fn apply(&self, order_id: OrderId, status: CreationStatus) -> bus::Result<()> {
        self.repository
            .update_creation_status(order_id, status)
            .await
            .map_err(|err| bus::BusError::Handler(err.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl<R: Repository + 'static> MessageHandler for LegacyPaymentIngress<R> {
    async fn handle(&self, message: IncomingMessage) -> bus::Result<()> {
        let Some(order_id) = order_id_of(&message) else {
            warn!(routing_key = %message.routing_key, "legacy payment event missing order_id, dropping");
            return Ok(());
        };

        let status = match message.routing_key.as_str() {
            bus::routing::PAYMENT_PAID => CreationStatus::Paid,
            bus::routing::PAYMENT_FAILED => CreationStatus::NoMoney,
            other => {
                warn!(routing_key = other, "unexpected routing key on legacy payment ingress");
                return Ok(());
            }
        };

        self.apply(order_id, status).await
    }
}

/// `delivery.result` → confirmation saga `DeliveryPossible`/`DeliveryNotPossible`.
pub struct DeliveryResultIngress<R> {
    saga: Arc<ConfirmationSaga<R>>,
}

impl<R: Repository + 'static> DeliveryResultIngress<R> {
    pub fn new(saga: Arc<ConfirmationSaga<R>>) -> Self {
        Self { saga }
    }
}

#[async_trait]
impl<R: Repository + 'static> MessageHandler for DeliveryResultIngress<R> {
    async fn handle(&self, message: IncomingMessage) -> bus::Result<()> {
        let Some(order_id) = order_id_of(&message) else {
            warn!(routing_key = %message.routing_key, "delivery.result missing order_id, dropping");
            return Ok(());
        };

        let event = match status_of(&message) {
            Some("deliverable") => ConfirmationEvent::DeliveryPossible,
            Some("not_deliverable") => ConfirmationEvent::DeliveryNotPossible,
            other => {
                warn!(%order_id, status = ?other, "delivery.result has unrecognized status, dropping");
                return Ok(());
            }
        };

        self.saga
            .handle_event(order_id, event)
            .await
            .map_err(|err| bus::BusError::Handler(err.to_string()))
    }
}

/// `delivery.finished` (and its `delivery.ready` synonym) updates
/// `delivery_status` directly; it is not a saga transition.
pub struct DeliveryFinishedIngress<R> {
    repository: Arc<R>,
}

impl<R: Repository + 'static> DeliveryFinishedIngress<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: Repository + 'static> MessageHandler for DeliveryFinishedIngress<R> {
    async fn handle(&self, message: IncomingMessage) -> bus::Result<()> {
        let Some(order_id) = order_id_of(&message) else {
            warn!(routing_key = %message.routing_key, "delivery.finished missing order_id, dropping");
            return Ok(());
        };

        let status = match status_of(&message) {
            Some("delivered") => domain::DeliveryStatus::Delivered,
            Some("ready") => domain::DeliveryStatus::Ready,
            Some("failed") => domain::DeliveryStatus::Failed,
            other => {
                warn!(%order_id, status = ?other, "delivery.finished has unrecognized status, dropping");
                return Ok(());
            }
        };

        self.repository
            .update_delivery_status(order_id, status)
            .await
            .map_err(|err| bus::BusError::Handler(err.to_string()))?;
        Ok(())
    }
}

/// `money.returned` → confirmation saga `MoneyReturned`.
pub struct MoneyReturnedIngress<R> {
    saga: Arc<ConfirmationSaga<R>>,
}

impl<R: Repository + 'static> MoneyReturnedIngress<R> {
    pub fn new(saga: Arc<ConfirmationSaga<R>>) -> Self {
        Self { saga }
    }
}

#[async_trait]
impl<R: Repository + 'static> MessageHandler for MoneyReturnedIngress<R> {
    async fn handle(&self, message: IncomingMessage) -> bus::Result<()> {
        let Some(order_id) = order_id_of(&message) else {
            warn!(routing_key = %message.routing_key, "money.returned missing order_id, dropping");
            return Ok(());
        };

        self.saga
            .handle_event(order_id, ConfirmationEvent::MoneyReturned)
            .await
            .map_err(|err| bus::BusError::Handler(err.to_string()))
    }
}

/// `evt.fabrication_canceled` → cancellation saga `FabricationCanceled`.
pub struct FabricationCanceledIngress<R> {
    saga: Arc<CancellationSaga<R>>,
}

impl<R: Repository + 'static> FabricationCanceledIngress<R> {
    pub fn new(saga: Arc<CancellationSaga<R>>) -> Self {
        Self { saga }
    }
}

#[async_trait]
impl<R: Repository + 'static> MessageHandler for FabricationCanceledIngress<R> {
    async fn handle(&self, message: IncomingMessage) -> bus::Result<()> {
        let Some(saga_id) = saga_id_of(&message) else {
            warn!(routing_key = %message.routing_key, "evt.fabrication_canceled missing saga_id, dropping");
            return Ok(());
        };

        self.saga
            .handle_event(saga_id, CancellationEvent::FabricationCanceled)
            .await
            .map_err(|err| bus::BusError::Handler(err.to_string()))
    }
}

/// `refund.result` (and its `evt_refunded`/`evt_refund_failed` aliases) →
/// cancellation saga `Refunded`/`RefundFailed`.
pub struct RefundResultIngress<R> {
    saga: Arc<CancellationSaga<R>>,
}

impl<R: Repository + 'static> RefundResultIngress<R> {
    pub fn new(saga: Arc<CancellationSaga<R>>) -> Self {
        Self { saga }
    }
}

#[async_trait]
impl<R: Repository + 'static> MessageHandler for RefundResultIngress<R> {
    async fn handle(&self, message: IncomingMessage) -> bus::Result<()> {
        let Some(saga_id) = saga_id_of(&message) else {
            warn!(routing_key = %message.routing_key, "refund result missing saga_id, dropping");
            return Ok(());
        };

        let event = match (message.routing_key.as_str(), status_of(&message)) {
            (bus::routing::REFUND_REFUNDED, _) | (_, Some("refunded")) => CancellationEvent::Refunded,
            (bus::routing::REFUND_FAILED, _) | (_, Some(_)) => {
                CancellationEvent::RefundFailed { reason: reason_of(&message) }
            }
            (_, None) => {
                warn!(%saga_id, "refund result missing status, dropping");
                return Ok(());
            }
        };

        self.saga
            .handle_event(saga_id, event)
            .await
            .map_err(|err| bus::BusError::Handler(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus::InMemoryBus;
    use common::ClientId;
    use domain::FabricationStatus;
    use repository::InMemoryRepository;
    use serde_json::json;

    fn confirmation(repository: Arc<InMemoryRepository>, bus: Arc<InMemoryBus>) -> Arc<ConfirmationSaga<InMemoryRepository>> {
        Arc::new(ConfirmationSaga::new(repository, bus, Arc::new(crate::registry::SagaRegistry::new())))
    }

    fn cancellation(repository: Arc<InMemoryRepository>, bus: Arc<InMemoryBus>) -> Arc<CancellationSaga<InMemoryRepository>> {
        Arc::new(CancellationSaga::new(repository, bus, Arc::new(crate::registry::SagaRegistry::new())))
    }

    #[tokio::test]
    async fn payment_result_paid_drives_confirmation_saga() {
        let repository = Arc::new(InMemoryRepository::new());
        let bus = Arc::new(InMemoryBus::new());
        let order = repository.create_order(ClientId::new(1), 1, 0, "x".into(), None).await.unwrap();
        let saga = confirmation(repository.clone(), bus.clone());
        saga.start(order.id).await.unwrap();

        let ingress = PaymentResultIngress::new(saga);
        let message = IncomingMessage::new("payment.result", json!({"order_id": order.id.as_i64(), "status": "paid"}));
        ingress.handle(message).await.unwrap();

        let order = repository.get_order(order.id).await.unwrap();
        assert_eq!(order.creation_status, CreationStatus::Paid);
    }

    #[tokio::test]
    async fn legacy_payment_paid_updates_status_without_touching_saga() {
        let repository = Arc::new(InMemoryRepository::new());
        let order = repository.create_order(ClientId::new(1), 1, 0, "x".into(), None).await.unwrap();
        let ingress = LegacyPaymentIngress::new(repository.clone());

        let message = IncomingMessage::new(bus::routing::PAYMENT_PAID, json!({"order_id": order.id.as_i64()}));
        ingress.handle(message).await.unwrap();

        let order = repository.get_order(order.id).await.unwrap();
        assert_eq!(order.creation_status, CreationStatus::Paid);
    }

    #[tokio::test]
    async fn delivery_finished_updates_delivery_status_directly() {
        let repository = Arc::new(InMemoryRepository::new());
        let order = repository.create_order(ClientId::new(1), 1, 0, "x".into(), None).await.unwrap();
        let ingress = DeliveryFinishedIngress::new(repository.clone());

        let message = IncomingMessage::new(bus::routing::DELIVERY_FINISHED, json!({"order_id": order.id.as_i64(), "status": "delivered"}));
        ingress.handle(message).await.unwrap();

        let order = repository.get_order(order.id).await.unwrap();
        assert_eq!(order.delivery_status, domain::DeliveryStatus::Delivered);
    }

    #[tokio::test]
    async fn fabrication_canceled_drives_cancellation_saga() {
        let repository = Arc::new(InMemoryRepository::new());
        let bus = Arc::new(InMemoryBus::new());
        let order = repository.create_order(ClientId::new(1), 1, 0, "x".into(), None).await.unwrap();
        repository.update_creation_status(order.id, CreationStatus::Confirmed).await.unwrap();
        repository.update_fabrication_status(order.id, FabricationStatus::InProgress, None).await.unwrap();

        let saga = cancellation(repository.clone(), bus.clone());
        let saga_id = saga.start(order.id).await.unwrap();
        let ingress = FabricationCanceledIngress::new(saga);

        let message = IncomingMessage::new(
            bus::routing::EVT_FABRICATION_CANCELED,
            json!({"saga_id": saga_id.as_uuid().to_string(), "order_id": order.id.as_i64()}),
        );
        ingress.handle(message).await.unwrap();

        assert_eq!(bus.published_to(bus::routing::CMD_REFUND).len(), 1);
    }

    #[tokio::test]
    async fn refund_failed_carries_reason_through_to_cancellation_saga() {
        let repository = Arc::new(InMemoryRepository::new());
        let bus = Arc::new(InMemoryBus::new());
        let order = repository.create_order(ClientId::new(1), 1, 0, "x".into(), None).await.unwrap();
        repository.update_creation_status(order.id, CreationStatus::Confirmed).await.unwrap();
        repository.update_fabrication_status(order.id, FabricationStatus::InProgress, None).await.unwrap();

        let saga = cancellation(repository.clone(), bus.clone());
        let saga_id = saga.start(order.id).await.unwrap();
        saga.handle_event(saga_id, CancellationEvent::FabricationCanceled).await.unwrap();

        let ingress = RefundResultIngress::new(saga);
        let message = IncomingMessage::new(
            bus::routing::REFUND_FAILED,
            json!({"saga_id": saga_id.as_uuid().to_string(), "status": "failed", "reason": "bank rejected transfer"}),
        );
        ingress.handle(message).await.unwrap();

        let record = repository.get_cancel_saga(saga_id).await.unwrap();
        assert_eq!(record.state, domain::CancellationSagaState::CancelPendingRefund);
        assert_eq!(record.error.as_deref(), Some("bank rejected transfer"));
    }
}
