//! Non-saga Warehouse fabrication-progress ingress (spec §4.6).
//!
//! Unlike the confirmation/cancellation sagas this handler drives no state
//! machine of its own: it just keeps `fabrication_status` in step with
//! whatever Warehouse reports, and fires `order.fabricated` exactly once
//! when fabrication finishes ahead of delivery.

use std::sync::Arc;

use async_trait::async_trait;
use bus::{IncomingMessage, MessageBus, MessageHandler, routing};
use common::OrderId;
use domain::{DeliveryStatus, FabricationStatus};
use repository::{Repository, RepositoryError};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::Result;

/// Reacts to fabrication-progress events bound under `warehouse.#`.
pub struct WarehouseIngress<R> {
    repository: Arc<R>,
    bus: Arc<dyn MessageBus>,
}

impl<R: Repository> WarehouseIngress<R> {
    pub fn new(repository: Arc<R>, bus: Arc<dyn MessageBus>) -> Self {
        Self { repository, bus }
    }

    pub async fn handle(&self, message: &IncomingMessage) -> Result<()> {
        let Some(order_id) = extract_order_id(message) else {
            warn!(routing_key = %message.routing_key, "warehouse event missing order_id, dropping");
            metrics::counter!("warehouse_ingress_dropped").increment(1);
            return Ok(());
        };

        let order = match self.repository.get_order(order_id).await {
            Ok(order) => order,
            Err(RepositoryError::OrderNotFound(_)) => {
                warn!(%order_id, "warehouse event for unknown order, acking");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        if order.fabrication_status.is_terminal() {
            debug!(%order_id, status = %order.fabrication_status, "fabrication already terminal, dropping duplicate warehouse event");
            metrics::counter!("warehouse_ingress_dropped").increment(1);
            return Ok(());
        }

        let raw = extract_status(message);
        let next = raw.as_deref().map(domain::normalize).unwrap_or(FabricationStatus::InProgress);
        let previously_completed = order.fabrication_status == FabricationStatus::Completed;

        let updated = self
            .repository
            .update_fabrication_status(order_id, next, raw)
            .await?;

        if next == FabricationStatus::Completed
            && updated.delivery_status == DeliveryStatus::NotStarted
            && !previously_completed
        {
            self.bus
                .publish(
                    routing::exchange::EVENTS,
                    routing::ORDER_FABRICATED,
                    &json!({
                        "order_id": order_id.as_i64(),
                        "number_of_pieces": updated.number_of_pieces(),
                        "user_id": updated.client_id.as_i64(),
                    }),
                )
                .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl<R: Repository + 'static> MessageHandler for WarehouseIngress<R> {
    async fn handle(&self, message: IncomingMessage) -> bus::Result<()> {
        WarehouseIngress::handle(self, &message)
            .await
            .map_err(|err| bus::BusError::Handler(err.to_string()))
    }
}

fn extract_order_id(message: &IncomingMessage) -> Option<OrderId> {
    message
        .payload
        .get("order_id")
        .and_then(|v| v.as_i64())
        .map(OrderId::new)
}

fn extract_status(message: &IncomingMessage) -> Option<String> {
    message
        .payload
        .get("status")
        .or_else(|| message.payload.get("fabrication_status"))
        .and_then(|v| v.as_str())
        .map(str::to_owned)
}
