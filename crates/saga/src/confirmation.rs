//! The order-confirmation saga (spec §4.4).
//!
//! The saga's state is the order's own `creation_status`; there is no
//! separate confirmation-saga record, unlike the cancellation saga which
//! persists a [`domain::CancellationSagaRecord`]. [`ConfirmationSaga`] is a
//! pure transition function plus an effect-execution wrapper that persists
//! then publishes, in that order (spec §7).

use std::sync::Arc;

use bus::{LogPublisher, MessageBus, Severity, routing};
use common::OrderId;
use domain::CreationStatus;
use repository::Repository;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::Result;
use crate::registry::SagaRegistry;

/// Inbound events the confirmation saga reacts to (spec §4.4 "Event").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationEvent {
    PaymentAccepted,
    PaymentRejected,
    DeliveryPossible,
    DeliveryNotPossible,
    MoneyReturned,
}

/// Computes the next `creation_status` for `current` reacting to `event`,
/// or `None` if the event doesn't apply in this state (spec §4.4 table;
/// `·` entries and states with no matching row both fall through to `None`).
fn next_state(current: CreationStatus, event: ConfirmationEvent) -> Option<CreationStatus> {
    use ConfirmationEvent::*;
    use CreationStatus::*;

    match (current, event) {
        (Pending, PaymentAccepted) => Some(Paid),
        (Pending, PaymentRejected) => Some(NoMoney),
        (Paid, DeliveryPossible) => Some(Confirmed),
        (Paid, DeliveryNotPossible) => Some(NotDeliverable),
        (NotDeliverable, MoneyReturned) => Some(Returned),
        _ => None,
    }
}

/// Drives the confirmation saga: loads the order, applies one event,
/// executes the entered state's effect (persist, then publish), and
/// retires the saga from the registry once it reaches a terminal state.
pub struct ConfirmationSaga<R> {
    repository: Arc<R>,
    bus: Arc<dyn MessageBus>,
    registry: Arc<SagaRegistry>,
    logger: LogPublisher,
}

impl<R: Repository> ConfirmationSaga<R> {
    pub fn new(repository: Arc<R>, bus: Arc<dyn MessageBus>, registry: Arc<SagaRegistry>) -> Self {
        let logger = LogPublisher::new(bus.clone());
        Self {
            repository,
            bus,
            registry,
            logger,
        }
    }

    /// Registers the saga and runs Pending's entry effect: publish `pay`.
    pub async fn start(&self, order_id: OrderId) -> Result<()> {
        self.registry.start_confirmation(order_id);
        self.logger
            .info("confirmation saga started", json!({"order_id": order_id.as_i64()}))
            .await;

        let order = self.repository.get_order(order_id).await?;
        self.bus
            .publish(
                routing::exchange::COMMAND,
                routing::CMD_PAY,
                &json!({
                    "order_id": order.id.as_i64(),
                    "user_id": order.client_id.as_i64(),
                    "number_of_pieces": order.number_of_pieces(),
                }),
            )
            .await?;

        Ok(())
    }

    /// Applies one event, serialized per-order via the registry lock.
    ///
    /// An event for an unknown or already-terminated saga is logged and
    /// dropped (no error to the caller): the bus message is acknowledged.
    pub async fn handle_event(&self, order_id: OrderId, event: ConfirmationEvent) -> Result<()> {
        let Some(lock) = self.registry.confirmation_lock(order_id) else {
            warn!(%order_id, "event for unknown or already-terminated confirmation saga, dropping");
            metrics::counter!("confirmation_ingress_dropped").increment(1);
            return Ok(());
        };
        let _guard = lock.lock().await;

        let order = self.repository.get_order(order_id).await?;
        if order.creation_status.is_terminal() {
            debug!(%order_id, status = %order.creation_status, "confirmation saga already terminal, dropping duplicate event");
            self.registry.complete_confirmation(order_id);
            return Ok(());
        }

        let Some(next) = next_state(order.creation_status, event) else {
            debug!(%order_id, current = %order.creation_status, ?event, "event does not apply to current confirmation state, ignoring");
            return Ok(());
        };

        self.enter_state(order_id, next).await?;
        metrics::counter!("confirmation_saga_transitions_total").increment(1);

        if next.is_terminal() {
            self.registry.complete_confirmation(order_id);
            let severity = match next {
                CreationStatus::NoMoney => Severity::Error,
                _ => Severity::Info,
            };
            self.logger
                .log(severity, "confirmation saga reached terminal state", json!({
                    "order_id": order_id.as_i64(),
                    "creation_status": next.to_string(),
                }))
                .await;
        }

        Ok(())
    }

    async fn enter_state(&self, order_id: OrderId, state: CreationStatus) -> Result<()> {
        self.repository.update_creation_status(order_id, state).await?;

        match state {
            CreationStatus::Paid => {
                let order = self.repository.get_order(order_id).await?;
                self.bus
                    .publish(
                        routing::exchange::COMMAND,
                        routing::CMD_CHECK_DELIVERY,
                        &json!({
                            "order_id": order.id.as_i64(),
                            "user_id": order.client_id.as_i64(),
                            "address": order.address,
                        }),
                    )
                    .await?;
            }
            CreationStatus::Confirmed => {
                let order = self
                    .repository
                    .update_fabrication_status(order_id, domain::FabricationStatus::Requested, None)
                    .await?;
                self.bus
                    .publish(
                        routing::exchange::COMMAND,
                        routing::WAREHOUSE_ORDER,
                        &json!({
                            "order_id": order.id.as_i64(),
                            "number_of_pieces": order.number_of_pieces(),
                            "pieces_a": order.pieces_a,
                            "pieces_b": order.pieces_b,
                        }),
                    )
                    .await?;
            }
            CreationStatus::NotDeliverable => {
                let order = self.repository.get_order(order_id).await?;
                self.bus
                    .publish(
                        routing::exchange::COMMAND,
                        routing::CMD_RETURN_MONEY,
                        &json!({
                            "order_id": order.id.as_i64(),
                            "user_id": order.client_id.as_i64(),
                        }),
                    )
                    .await?;
            }
            CreationStatus::NoMoney | CreationStatus::Returned => {}
            CreationStatus::Pending => unreachable!("Pending is the initial state, never (re-)entered"),
        }

        Ok(())
    }
}
