use async_trait::async_trait;
use common::{ClientId, OrderId, SagaId};
use domain::{CancellationSagaRecord, CancellationSagaState, CreationStatus, DeliveryStatus, FabricationStatus, Order};

use crate::error::Result;

/// Persistence contract for orders.
///
/// Each operation is a single transaction. The repository performs no
/// cross-phase gating: callers (the sagas) are responsible for only
/// requesting transitions their own state machine allows.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(
        &self,
        client_id: ClientId,
        pieces_a: u32,
        pieces_b: u32,
        description: String,
        address: Option<String>,
    ) -> Result<Order>;

    async fn get_order(&self, id: OrderId) -> Result<Order>;

    async fn list_orders(&self) -> Result<Vec<Order>>;

    async fn update_creation_status(&self, id: OrderId, status: CreationStatus) -> Result<Order>;

    async fn update_fabrication_status(
        &self,
        id: OrderId,
        status: FabricationStatus,
        raw: Option<String>,
    ) -> Result<Order>;

    async fn update_delivery_status(&self, id: OrderId, status: DeliveryStatus) -> Result<Order>;

    async fn delete_order(&self, id: OrderId) -> Result<()>;
}

/// Persistence contract for cancellation-saga records.
#[async_trait]
pub trait CancelSagaRepository: Send + Sync {
    async fn create_cancel_saga(
        &self,
        saga_id: SagaId,
        order_id: OrderId,
        state: CancellationSagaState,
    ) -> Result<CancellationSagaRecord>;

    async fn update_cancel_saga(
        &self,
        saga_id: SagaId,
        state: CancellationSagaState,
        error: Option<String>,
    ) -> Result<CancellationSagaRecord>;

    async fn get_cancel_saga(&self, saga_id: SagaId) -> Result<CancellationSagaRecord>;
}

/// Blanket supertrait implemented by every repository that backs the whole
/// order orchestrator (spec §4.1).
pub trait Repository: OrderRepository + CancelSagaRepository {}
impl<T: OrderRepository + CancelSagaRepository> Repository for T {}
